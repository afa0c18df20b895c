/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the density kernel trait and the params-to-kernel conversion trait.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{kernel_helpers::KernelParams, range::Range};

/// Converts a shared [`KernelParams`] configuration into a concrete kernel type.
pub trait KernelFromParams: Sized {
    /// Constructs `Self` from a set of uniform kernel parameters.
    fn from_params(p: &KernelParams) -> Self;
}

/// A symmetric, non-negative smoothing kernel that is a non-increasing
/// function of distance.
///
/// All evaluations take the *squared* distance and return the unnormalized
/// kernel value. Densities are normalized once at the end of a computation
/// using [`DensityKernel::norm_constant`].
pub trait DensityKernel {
    /// Kernel scale parameter.
    fn bandwidth(&self) -> f64;

    /// Unnormalized kernel value at squared distance `dist_sq`.
    fn eval_unnorm_on_sq(&self, dist_sq: f64) -> f64;

    /// Range of unnormalized kernel values over a range of squared distances.
    ///
    /// The default relies on the kernel being non-increasing in distance.
    #[inline(always)]
    fn range_unnorm_on_sq(&self, dist_sq: Range) -> Range {
        Range::new(
            self.eval_unnorm_on_sq(dist_sq.hi),
            self.eval_unnorm_on_sq(dist_sq.lo),
        )
    }

    /// Integral of the unnormalized kernel over `dimension`-dimensional space.
    fn norm_constant(&self, dimension: usize) -> f64;

    /// Scale `s` for kernels of the form `exp(-d^2 / s^2)`.
    ///
    /// Kernels that return `Some` can be approximated with Hermite far-field
    /// and Taylor local expansions. Everything else returns `None`.
    fn hermite_scale(&self) -> Option<f64> {
        None
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete density kernels and their normalization constants.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{DensityKernel, KernelFromParams, KernelParams, utils::unit_sphere_volume};
use std::f64::consts::PI;

/// Gaussian kernel with unnormalized value `exp(-d^2 / 2h^2)`.
#[derive(Clone, Debug, Copy)]
pub struct GaussianKernel {
    bandwidth: f64,
    neg_inv_two_bandwidth_sq: f64,
}

impl GaussianKernel {
    pub fn new(bandwidth: f64) -> Self {
        GaussianKernel {
            bandwidth,
            neg_inv_two_bandwidth_sq: -0.5 / (bandwidth * bandwidth),
        }
    }
}

impl DensityKernel for GaussianKernel {
    #[inline(always)]
    fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    #[inline(always)]
    fn eval_unnorm_on_sq(&self, dist_sq: f64) -> f64 {
        (dist_sq * self.neg_inv_two_bandwidth_sq).exp()
    }

    fn norm_constant(&self, dimension: usize) -> f64 {
        (2.0 * PI * self.bandwidth * self.bandwidth).powf(dimension as f64 / 2.0)
    }

    #[inline(always)]
    fn hermite_scale(&self) -> Option<f64> {
        Some(std::f64::consts::SQRT_2 * self.bandwidth)
    }
}

impl KernelFromParams for GaussianKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        GaussianKernel::new(p.bandwidth)
    }
}

/// Epanechnikov kernel with unnormalized value `max(0, 1 - d^2 / h^2)`.
///
/// The kernel is exactly zero beyond distance `h`, so node pairs further apart
/// than the bandwidth contribute nothing and are excluded without error.
#[derive(Clone, Debug, Copy)]
pub struct EpanechnikovKernel {
    bandwidth: f64,
    inv_bandwidth_sq: f64,
}

impl EpanechnikovKernel {
    pub fn new(bandwidth: f64) -> Self {
        EpanechnikovKernel {
            bandwidth,
            inv_bandwidth_sq: 1.0 / (bandwidth * bandwidth),
        }
    }
}

impl DensityKernel for EpanechnikovKernel {
    #[inline(always)]
    fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    #[inline(always)]
    fn eval_unnorm_on_sq(&self, dist_sq: f64) -> f64 {
        let t = 1.0 - dist_sq * self.inv_bandwidth_sq;
        if t > 0.0 { t } else { 0.0 }
    }

    fn norm_constant(&self, dimension: usize) -> f64 {
        let d = dimension as f64;
        2.0 * unit_sphere_volume(dimension) * self.bandwidth.powf(d) / (d + 2.0)
    }
}

impl KernelFromParams for EpanechnikovKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        EpanechnikovKernel::new(p.bandwidth)
    }
}

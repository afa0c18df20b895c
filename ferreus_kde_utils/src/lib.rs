/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API for the ferreus_kde_utils crate and re-exports common helpers.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`ferreus_kde`] crate
//!
//! Density kernels, the [`Range`] interval type used for density and distance
//! bounds, and small helpers for working with `faer` point arrays.
//!
//! [`ferreus_kde`]: https://docs.rs/ferreus_kde
mod density_kernels;
mod kernel_helpers;
mod range;
mod traits;
mod utils;

/// Implemented kernels for use in the [`ferreus_kde`](https://docs.rs/ferreus_kde) crate.
pub mod kernels {
    pub use super::density_kernels::*;
}

pub use {
    kernel_helpers::{KernelParams, KernelParamsBuilder, KernelType},
    range::Range,
    traits::{DensityKernel, KernelFromParams},
    utils::{
        argsort, get_distance_sq, get_pointarray_extents, select_mat_rows,
        unit_sphere_volume,
    },
};

/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides parameter and builder types for configuring density kernels.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};

/// Runtime kernel selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// `exp(-d^2 / 2h^2)`, infinite support.
    Gaussian,

    /// `max(0, 1 - d^2 / h^2)`, compact support of radius `h`.
    Epanechnikov,
}

/// Defines the [`KernelType`] to use, along with its bandwidth.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KernelParams {
    /// KernelType enum variant to use.
    pub kernel_type: KernelType,

    /// Controls how quickly a reference point's influence decays with distance.
    /// Smaller values give a spikier density estimate, larger values
    /// a smoother one.
    ///
    /// Typically chosen based on the spacing of your data.
    pub bandwidth: f64,
}

impl KernelParams {
    /// Begins building a [`KernelParams`] instance for the given kernel type.
    pub fn builder(kernel_type: KernelType) -> KernelParamsBuilder {
        KernelParamsBuilder {
            kernel_type,
            bandwidth: 1.0,
        }
    }
}

/// Builder for [`KernelParams`] that provides sensible defaults.
#[derive(Debug, Clone, Copy)]
pub struct KernelParamsBuilder {
    kernel_type: KernelType,
    bandwidth: f64,
}

impl KernelParamsBuilder {
    /// Sets the `bandwidth` parameter on the builder.
    pub fn bandwidth(mut self, v: f64) -> Self {
        self.bandwidth = v;
        self
    }

    /// Finalises the builder into a [`KernelParams`] value.
    ///
    /// The bandwidth is validated when the kernel is handed to a density
    /// estimator, not here.
    pub fn build(self) -> KernelParams {
        KernelParams {
            kernel_type: self.kernel_type,
            bandwidth: self.bandwidth,
        }
    }
}

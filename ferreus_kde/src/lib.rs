/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for dual-tree kernel density estimation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Fast kernel density estimation with guaranteed relative error.
//!
//! A kernel density estimate sums a kernel centred on every reference point at
//! every query point, which costs **O(N·M)** kernel evaluations. This crate
//! organises both point sets in KD-trees and resolves whole pairs of nodes at
//! once whenever it can prove the result stays within a user supplied relative
//! error of the exhaustive sum, following `1` and `2`:
//!
//! - **Exclusion** - pairs of nodes the kernel cannot reach contribute exactly zero.
//! - **Finite differences** - pairs whose contribution is tightly bounded are
//!   replaced by the midpoint of the bounds.
//! - **Series expansions** - for the Gaussian kernel, Hermite far-field and Taylor
//!   local expansions summarise a node pair when that is cheaper than evaluating it.
//!
//! Every approximation charges the error it introduces against a budget shared
//! out in proportion to the number of reference points, so each estimate satisfies
//! `|estimate - exact| <= relative_error * exact`.
//!
//! Check out the examples directory in the repository for more examples of usage.
//!
//! # Examples
//!
//! ```
//! use ferreus_kde::{FastKde, KdeParams, generate_random_points, max_relative_error, naive_kde};
//! use ferreus_kde_utils::kernels::GaussianKernel;
//!
//! // Random reference and query points in the unit square
//! let references = generate_random_points(2000, 2, Some(42));
//! let queries = generate_random_points(500, 2, Some(7));
//!
//! let kernel = GaussianKernel::new(0.05);
//! let params = KdeParams::builder().relative_error(0.01).build();
//!
//! let results = FastKde::builder(references.clone(), kernel, params)
//!     .queries(queries.clone())
//!     .build()?
//!     .compute();
//!
//! // Compare against the exhaustive sum
//! let exact = naive_kde(&queries, &references, &kernel);
//! assert!(max_relative_error(&results.density_estimates, &exact) <= 0.01);
//! # Ok::<(), ferreus_kde::KdeError>(())
//! ```
//!
//! # References
//! 1.  A. Gray, A. Moore. Nonparametric density estimation: toward computational
//!     tractability. SIAM International Conference on Data Mining, 2003.
//! 2.  D. Lee, A. Gray, A. Moore. Dual-tree fast Gauss transforms. Advances in
//!     Neural Information Processing Systems 18, 2006.
//! 3.  B. J. C. Baxter, G. Roussos. A new error estimate of the fast Gauss transform.
//!     SIAM J. Sci. Comput., 24(1):257-259, 2002.
pub mod bound;

mod common;

pub mod config;

mod error;

mod fast_kde;

pub mod kdtree;

mod naive_kde;

pub mod progress;

pub mod series;

pub mod statistics;

pub use {
    common::{csv_to_point_array, generate_random_points, save_values, write_values},
    config::{ExpansionFamily, KdeParams, KdeParamsBuilder},
    error::{KdeError, KdeResult},
    fast_kde::{FastKde, FastKdeBuilder, KdeResults, estimate_density},
    naive_kde::{max_relative_error, naive_kde},
    statistics::PruneCounts,
};

/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides exhaustive kernel density estimation used as ground truth for the dual-tree method.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;
use ferreus_kde_utils::{DensityKernel, get_distance_sq};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Evaluates the normalized kernel density estimate at every query point by
/// summing over every reference point. Query points are processed in parallel.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_kde::naive_kde;
/// use ferreus_kde_utils::{DensityKernel, kernels::GaussianKernel};
///
/// let references = mat![[0.0, 0.0], [0.0, 0.0f64]];
/// let kernel = GaussianKernel::new(1.0);
///
/// let density = naive_kde(&references, &references, &kernel);
///
/// let expected = 1.0 / kernel.norm_constant(2);
/// assert!((density[0] - expected).abs() < 1e-15);
/// ```
pub fn naive_kde<K>(queries: &Mat<f64>, references: &Mat<f64>, kernel: &K) -> Vec<f64>
where
    K: DensityKernel + Sync,
{
    let num_references = references.nrows();
    let mul_constant =
        1.0 / (kernel.norm_constant(references.ncols()) * num_references as f64);

    (0..queries.nrows())
        .into_par_iter()
        .map(|i| {
            let target = queries.row(i);
            let sum: f64 = (0..num_references)
                .map(|j| kernel.eval_unnorm_on_sq(get_distance_sq(target, references.row(j))))
                .sum();
            sum * mul_constant
        })
        .collect()
}

/// Largest `|approx - exact| / exact` over all points. Points where both are
/// zero are exact; a non-zero approximation of zero is infinitely wrong.
pub fn max_relative_error(approx: &[f64], exact: &[f64]) -> f64 {
    approx
        .iter()
        .zip(exact.iter())
        .map(|(a, e)| {
            let diff = (a - e).abs();
            if diff == 0.0 {
                0.0
            } else if *e == 0.0 {
                f64::INFINITY
            } else {
                diff / e.abs()
            }
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferreus_kde_utils::kernels::EpanechnikovKernel;

    #[test]
    fn matches_hand_computed_sum() {
        let references = faer::mat![[0.0], [1.0], [3.0f64]];
        let queries = faer::mat![[0.5f64]];
        let kernel = EpanechnikovKernel::new(1.0);

        // Only the first two points are in range, each with 1 - 0.25.
        let density = naive_kde(&queries, &references, &kernel);
        let expected = 1.5 / (kernel.norm_constant(1) * 3.0);
        assert!((density[0] - expected).abs() < 1e-15);
    }

    #[test]
    fn relative_error_edge_cases() {
        assert_eq!(max_relative_error(&[0.0, 2.0], &[0.0, 2.0]), 0.0);
        assert_eq!(max_relative_error(&[1.1, 1.0], &[1.0, 2.0]), 0.5);
        assert!(max_relative_error(&[1e-9], &[0.0]).is_infinite());
    }
}

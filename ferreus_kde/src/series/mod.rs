/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the Gaussian series expansion machinery and its truncation error bounds.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Hermite far-field and Taylor local expansions of the Gaussian kernel
//! `exp(-|x - y|^2 / s^2)`, with `s = sqrt(2) * bandwidth`.
//!
//! Coefficients are stored against a shared table of multi-indices sorted by
//! order, so the terms of any order `k` are a prefix of the table.

// # References
// [1] L. Greengard, J. Strain, The fast Gauss transform, SIAM J. Sci. Stat. Comput. 12 (1) (1991) 79-94.
// [2] B. J. C. Baxter, G. Roussos, A new error estimate of the fast Gauss transform, SIAM J. Sci. Comput. 24 (1) (2002) 257-259.
// [3] D. Lee, A. Gray, A. Moore, Dual-tree fast Gauss transforms, NIPS 18 (2006).

mod farfield;
mod hermite;
mod local;

pub use farfield::FarFieldExpansion;
pub use local::LocalExpansion;

use crate::config::ExpansionFamily;
use faer::Mat;
use ferreus_kde_utils::argsort;
use itertools::Itertools;

/// Bound on `|h_n(t)| / (2^(n/2) sqrt(n!) exp(-t^2 / 2))` from Cramér's inequality.
const CRAMER_CONSTANT: f64 = 1.09;

/// Copies row `row` of `points` into a vector.
#[inline(always)]
pub(crate) fn point_coords(points: &Mat<f64>, row: usize) -> Vec<f64> {
    (0..points.ncols()).map(|j| points[(row, j)]).collect()
}

/// Smallest order meeting an error target, and the error it actually achieves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderEstimate {
    pub order: usize,
    /// Error bound per unit of reference weight.
    pub error: f64,
}

/// Tables and error bounds shared by every expansion in a run.
#[derive(Debug, Clone)]
pub struct SeriesExpansionAux {
    dim: usize,
    max_order: usize,
    family: ExpansionFamily,
    bandwidth: f64,
    scale: f64,
    multi_indices: Vec<Vec<usize>>,
    /// `prefix_lengths[k]` is the number of multi-indices of order at most `k`.
    prefix_lengths: Vec<usize>,
    factorials: Vec<f64>,
}

impl SeriesExpansionAux {
    /// Builds the tables for expansions of the kernel `exp(-d^2 / scale^2)` up to `max_order`.
    pub fn new(dim: usize, max_order: usize, family: ExpansionFamily, scale: f64) -> Self {
        let family_order = |alpha: &Vec<usize>| -> usize {
            match family {
                ExpansionFamily::Multiplicative => alpha.iter().copied().max().unwrap_or(0),
                ExpansionFamily::TotalDegree => alpha.iter().sum(),
            }
        };

        let candidates: Vec<Vec<usize>> = (0..dim)
            .map(|_| 0..=max_order)
            .multi_cartesian_product()
            .filter(|alpha| family_order(alpha) <= max_order)
            .collect();

        // Stable sort keeps lexicographic order within each order.
        let orders: Vec<usize> = candidates.iter().map(family_order).collect();
        let sorted = argsort(&orders);
        let multi_indices: Vec<Vec<usize>> =
            sorted.iter().map(|&i| candidates[i].clone()).collect();

        let prefix_lengths = (0..=max_order)
            .map(|k| orders.iter().filter(|&&o| o <= k).count())
            .collect();

        let mut factorials = vec![1.0; 2 * max_order + 2];
        for n in 1..factorials.len() {
            factorials[n] = factorials[n - 1] * n as f64;
        }

        SeriesExpansionAux {
            dim,
            max_order,
            family,
            bandwidth: scale / std::f64::consts::SQRT_2,
            scale,
            multi_indices,
            prefix_lengths,
            factorials,
        }
    }

    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline(always)]
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Number of coefficients in an expansion of order `order`.
    #[inline(always)]
    pub fn num_coeffs(&self, order: usize) -> usize {
        self.prefix_lengths[order.min(self.max_order)]
    }

    #[inline(always)]
    pub(crate) fn multi_indices(&self, order: usize) -> &[Vec<usize>] {
        &self.multi_indices[..self.num_coeffs(order)]
    }

    #[inline(always)]
    pub(crate) fn factorial(&self, n: usize) -> f64 {
        self.factorials[n]
    }

    /// Coordinates of `point` relative to `center` in units of the expansion scale.
    pub(crate) fn scaled_offset(&self, point: &[f64], center: &[f64]) -> Vec<f64> {
        point
            .iter()
            .zip(center.iter())
            .map(|(p, c)| (p - c) / self.scale)
            .collect()
    }

    /// Number of terms per dimension whose tensor grid is contained in the
    /// multi-index set of order `order`.
    fn terms_per_dim(&self, order: usize) -> usize {
        match self.family {
            ExpansionFamily::Multiplicative => order + 1,
            ExpansionFamily::TotalDegree => order / self.dim.max(1) + 1,
        }
    }

    /// Sum over all multi-indices outside a `terms^dim` tensor grid of
    /// `prod_d r^(a_d) / sqrt(a_d!)`, bounded above. Requires `r < 1`.
    fn truncation_tail(&self, r: f64, terms: usize) -> f64 {
        let r_pow = r.powi(terms as i32);
        let inside = 1.0 - r_pow;
        let outside = r_pow / self.factorial(terms).sqrt();
        let d = self.dim as i32;
        (1.0 / (1.0 - r)).powi(d) * ((inside + outside).powi(d) - inside.powi(d))
    }

    /// Gaussian decay factor shared by all three bounds, at the closest
    /// approach between the two nodes.
    fn front_factor(&self, min_dist_sq: f64) -> f64 {
        CRAMER_CONSTANT.powi(self.dim as i32)
            * (-min_dist_sq / (2.0 * self.scale * self.scale)).exp()
    }

    fn search_order<F>(&self, allowed_error: f64, bound: F) -> Option<OrderEstimate>
    where
        F: Fn(usize) -> f64,
    {
        if !(allowed_error >= 0.0) {
            return None;
        }
        (0..=self.max_order)
            .map(|order| OrderEstimate {
                order,
                error: bound(self.terms_per_dim(order)),
            })
            .find(|estimate| estimate.error <= allowed_error)
    }

    /// Minimal order for evaluating a reference node's far-field expansion
    /// directly at query points.
    ///
    /// `ref_half_width` is the largest half side of the reference box and
    /// `min_dist_sq` the smallest squared distance between the two boxes.
    pub fn order_for_evaluating_farfield(
        &self,
        ref_half_width: f64,
        min_dist_sq: f64,
        allowed_error: f64,
    ) -> Option<OrderEstimate> {
        let r = ref_half_width / self.bandwidth;
        if r >= 1.0 {
            return None;
        }
        let front = self.front_factor(min_dist_sq);
        self.search_order(allowed_error, |terms| front * self.truncation_tail(r, terms))
    }

    /// Minimal order for accumulating reference points into a query node's
    /// local expansion.
    pub fn order_for_evaluating_local(
        &self,
        query_half_width: f64,
        min_dist_sq: f64,
        allowed_error: f64,
    ) -> Option<OrderEstimate> {
        let r = query_half_width / self.bandwidth;
        if r >= 1.0 {
            return None;
        }
        let front = self.front_factor(min_dist_sq);
        self.search_order(allowed_error, |terms| front * self.truncation_tail(r, terms))
    }

    /// Minimal order for translating a far-field expansion into a local one.
    pub fn order_for_converting_to_local(
        &self,
        ref_half_width: f64,
        query_half_width: f64,
        min_dist_sq: f64,
        allowed_error: f64,
    ) -> Option<OrderEstimate> {
        let r_ref = ref_half_width / self.bandwidth;
        let a = std::f64::consts::SQRT_2 * r_ref;
        let b = std::f64::consts::SQRT_2 * query_half_width / self.bandwidth;
        if a >= 1.0 || b >= 1.0 {
            return None;
        }
        let front = self.front_factor(min_dist_sq);
        let growth = (1.0 / (1.0 - a)).powi(self.dim as i32);
        self.search_order(allowed_error, |terms| {
            front * (self.truncation_tail(r_ref, terms) + growth * self.truncation_tail(b, terms))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_index_counts() {
        let aux = SeriesExpansionAux::new(2, 3, ExpansionFamily::Multiplicative, 1.0);
        assert_eq!(aux.num_coeffs(3), 16);
        assert_eq!(aux.num_coeffs(0), 1);
        assert_eq!(aux.num_coeffs(1), 4);

        let aux = SeriesExpansionAux::new(3, 2, ExpansionFamily::TotalDegree, 1.0);
        assert_eq!(aux.num_coeffs(0), 1);
        assert_eq!(aux.num_coeffs(1), 4);
        assert_eq!(aux.num_coeffs(2), 10);
    }

    #[test]
    fn indices_are_sorted_by_order() {
        let aux = SeriesExpansionAux::new(2, 4, ExpansionFamily::TotalDegree, 1.0);
        let indices = aux.multi_indices(4);
        for pair in indices.windows(2) {
            let (a, b): (usize, usize) = (pair[0].iter().sum(), pair[1].iter().sum());
            assert!(a <= b);
        }
        assert_eq!(aux.multi_indices(1), &[vec![0usize, 0], vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn no_order_for_wide_nodes() {
        let aux = SeriesExpansionAux::new(2, 5, ExpansionFamily::Multiplicative, 2f64.sqrt());
        assert!(aux.order_for_evaluating_farfield(1.5, 10.0, 1.0).is_none());
        assert!(aux.order_for_evaluating_local(1.0, 10.0, 1.0).is_none());
        assert!(aux.order_for_converting_to_local(0.8, 0.1, 10.0, 1.0).is_none());
    }

    #[test]
    fn order_grows_as_target_tightens() {
        let aux = SeriesExpansionAux::new(2, 7, ExpansionFamily::Multiplicative, 2f64.sqrt());
        let loose = aux.order_for_evaluating_farfield(0.2, 1.0, 1e-2).unwrap();
        let tight = aux.order_for_evaluating_farfield(0.2, 1.0, 1e-6).unwrap();
        assert!(loose.order < tight.order);
        assert!(tight.error <= 1e-6);
        assert!(aux.order_for_evaluating_farfield(0.2, 1.0, -1.0).is_none());
    }
}

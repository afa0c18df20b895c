/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements Taylor local expansions: accumulation, translation to children and evaluation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use super::{
    SeriesExpansionAux,
    hermite::{evaluate_hermite_functions, evaluate_monomials, evaluate_scaled_monomials},
    point_coords,
};
use faer::Mat;

/// Taylor expansion of a field about the centre of a query node, valid inside the node.
///
/// Evaluated as `sum_b B_b ((q - c) / s)^b`. The expansion remembers the
/// highest order any contribution was made at, so evaluation and translation
/// only touch populated terms.
#[derive(Debug, Clone, Default)]
pub struct LocalExpansion {
    center: Vec<f64>,
    coeffs: Vec<f64>,
    order: Option<usize>,
}

impl LocalExpansion {
    /// Empty expansion about `center` with room for the maximum order.
    pub fn new(center: Vec<f64>, aux: &SeriesExpansionAux) -> Self {
        LocalExpansion {
            center,
            coeffs: vec![0.0; aux.num_coeffs(aux.max_order())],
            order: None,
        }
    }

    pub fn center(&self) -> &[f64] {
        &self.center
    }

    /// Highest order with a contribution, `None` while the expansion is empty.
    pub fn order(&self) -> Option<usize> {
        self.order
    }

    #[inline(always)]
    pub(crate) fn add_to_coeff(&mut self, index: usize, value: f64) {
        self.coeffs[index] += value;
    }

    #[inline(always)]
    pub(crate) fn raise_order(&mut self, order: usize) {
        self.order = Some(self.order.map_or(order, |o| o.max(order)));
    }

    /// Adds the field of the rows `begin..end` of `points` directly, truncated at `order`.
    pub fn accumulate_points(
        &mut self,
        points: &Mat<f64>,
        weights: &[f64],
        begin: usize,
        end: usize,
        order: usize,
        aux: &SeriesExpansionAux,
    ) {
        let indices = aux.multi_indices(order);
        let inv_factorials: Vec<f64> = indices
            .iter()
            .map(|beta| 1.0 / beta.iter().map(|&b| aux.factorial(b)).product::<f64>())
            .collect();

        for row in begin..end {
            let w = aux.scaled_offset(&point_coords(points, row), &self.center);
            let hn_w = evaluate_hermite_functions(&w, order);

            for ((coeff, beta), inv_factorial) in
                self.coeffs.iter_mut().zip(indices).zip(&inv_factorials)
            {
                let term: f64 = beta.iter().enumerate().map(|(d, &b)| hn_w[(d, b)]).product();
                *coeff += weights[row] * term * inv_factorial;
            }
        }
        self.raise_order(order);
    }

    /// Re-expands this expansion about the centre of `child` and adds it there.
    /// The translation is exact.
    pub fn translate_to_local(&self, child: &mut LocalExpansion, aux: &SeriesExpansionAux) {
        let Some(order) = self.order else {
            return;
        };

        let indices = aux.multi_indices(order);
        let shift = aux.scaled_offset(&child.center, &self.center);
        let sn = evaluate_scaled_monomials(&shift, order);

        for (alpha_index, alpha) in indices.iter().enumerate() {
            let mut sum = 0.0;
            for (beta, coeff) in indices.iter().zip(&self.coeffs) {
                if alpha.iter().zip(beta).any(|(a, b)| a > b) {
                    continue;
                }
                // binomial(b, a) * shift^(b - a)
                let term: f64 = alpha
                    .iter()
                    .zip(beta)
                    .enumerate()
                    .map(|(d, (&a, &b))| aux.factorial(b) / aux.factorial(a) * sn[(d, b - a)])
                    .product();
                sum += coeff * term;
            }
            child.coeffs[alpha_index] += sum;
        }
        child.raise_order(order);
    }

    /// Evaluates the expansion at `point`.
    pub fn evaluate_field(&self, point: &[f64], aux: &SeriesExpansionAux) -> f64 {
        let Some(order) = self.order else {
            return 0.0;
        };

        let v = aux.scaled_offset(point, &self.center);
        let vn = evaluate_monomials(&v, order);

        aux.multi_indices(order)
            .iter()
            .zip(&self.coeffs)
            .map(|(beta, coeff)| {
                let term: f64 = beta.iter().enumerate().map(|(d, &b)| vn[(d, b)]).product();
                coeff * term
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpansionFamily;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn direct_sum(points: &Mat<f64>, target: &[f64], scale: f64) -> f64 {
        (0..points.nrows())
            .map(|i| {
                let d2: f64 = (0..points.ncols())
                    .map(|j| (points[(i, j)] - target[j]).powi(2))
                    .sum();
                (-d2 / (scale * scale)).exp()
            })
            .sum()
    }

    #[test]
    fn empty_expansion_is_zero() {
        let aux = SeriesExpansionAux::new(3, 2, ExpansionFamily::TotalDegree, 1.0);
        let local = LocalExpansion::new(vec![0.0; 3], &aux);
        assert_eq!(local.order(), None);
        assert_eq!(local.evaluate_field(&[0.1, 0.2, 0.3], &aux), 0.0);
    }

    #[test]
    fn accumulated_points_match_direct_sum() {
        let scale = 2f64.sqrt();
        let aux = SeriesExpansionAux::new(2, 7, ExpansionFamily::Multiplicative, scale);
        let mut rng = StdRng::seed_from_u64(21);
        let points = Mat::from_fn(30, 2, |_, _| rng.random_range(2.0..3.0));
        let weights = vec![1.0; 30];

        let mut local = LocalExpansion::new(vec![0.0, 0.0], &aux);
        local.accumulate_points(&points, &weights, 0, 30, 7, &aux);
        assert_eq!(local.order(), Some(7));

        let target = [0.1, -0.15];
        let exact = direct_sum(&points, &target, scale);
        let approx = local.evaluate_field(&target, &aux);
        assert!((approx - exact).abs() < 1e-6 * exact);

        // Truncation error stays inside the bound used for order selection.
        let min_dist_sq = 2.0 * (1.85f64).powi(2);
        let estimate = aux.order_for_evaluating_local(0.15, min_dist_sq, 1e-4).unwrap();
        let mut truncated = LocalExpansion::new(vec![0.0, 0.0], &aux);
        truncated.accumulate_points(&points, &weights, 0, 30, estimate.order, &aux);
        let value = truncated.evaluate_field(&target, &aux);
        assert!((value - exact).abs() <= 30.0 * estimate.error);
    }

    #[test]
    fn translation_to_child_is_exact() {
        let aux = SeriesExpansionAux::new(2, 4, ExpansionFamily::TotalDegree, 1.0);
        let mut rng = StdRng::seed_from_u64(2);
        let points = Mat::from_fn(10, 2, |_, _| rng.random_range(1.0..2.0));
        let weights = vec![1.0; 10];

        let mut parent = LocalExpansion::new(vec![0.0, 0.0], &aux);
        parent.accumulate_points(&points, &weights, 0, 10, 4, &aux);

        let mut child = LocalExpansion::new(vec![-0.1, 0.2], &aux);
        parent.translate_to_local(&mut child, &aux);

        for target in [[-0.1, 0.2], [0.05, 0.1], [-0.2, 0.3]] {
            let a = parent.evaluate_field(&target, &aux);
            let b = child.evaluate_field(&target, &aux);
            assert!((a - b).abs() < 1e-12 * a.abs().max(1.0));
        }
    }
}

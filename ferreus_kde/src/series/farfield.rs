/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements Hermite far-field expansions: construction, merging, evaluation and translation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use super::{
    LocalExpansion, SeriesExpansionAux,
    hermite::{evaluate_hermite_functions, evaluate_scaled_monomials},
    point_coords,
};
use faer::Mat;

/// Hermite expansion of the field generated by the points of a reference node,
/// valid away from the node.
///
/// `A_a = sum_x w_x ((x - c) / s)^a / a!`, evaluated as `sum_a A_a h_a((q - c) / s)`.
#[derive(Debug, Clone, Default)]
pub struct FarFieldExpansion {
    center: Vec<f64>,
    coeffs: Vec<f64>,
}

impl FarFieldExpansion {
    /// Zero expansion about `center` with room for the maximum order.
    pub fn new(center: Vec<f64>, aux: &SeriesExpansionAux) -> Self {
        FarFieldExpansion {
            center,
            coeffs: vec![0.0; aux.num_coeffs(aux.max_order())],
        }
    }

    pub fn center(&self) -> &[f64] {
        &self.center
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Adds the rows `begin..end` of `points` to the expansion at the maximum order.
    pub fn accumulate_points(
        &mut self,
        points: &Mat<f64>,
        weights: &[f64],
        begin: usize,
        end: usize,
        aux: &SeriesExpansionAux,
    ) {
        let max_order = aux.max_order();
        let indices = aux.multi_indices(max_order);

        for row in begin..end {
            let u = aux.scaled_offset(&point_coords(points, row), &self.center);
            let un = evaluate_scaled_monomials(&u, max_order);

            for (coeff, alpha) in self.coeffs.iter_mut().zip(indices) {
                let term: f64 = alpha.iter().enumerate().map(|(d, &a)| un[(d, a)]).product();
                *coeff += weights[row] * term;
            }
        }
    }

    /// Shifts a child's expansion to this expansion's centre and adds it.
    /// The translation is exact at the maximum order.
    pub fn translate_from_farfield(&mut self, child: &FarFieldExpansion, aux: &SeriesExpansionAux) {
        let max_order = aux.max_order();
        let indices = aux.multi_indices(max_order);
        let shift = aux.scaled_offset(&child.center, &self.center);
        let sn = evaluate_scaled_monomials(&shift, max_order);

        for (gamma_index, gamma) in indices.iter().enumerate() {
            let mut sum = 0.0;
            for (alpha, child_coeff) in indices.iter().zip(&child.coeffs) {
                if alpha.iter().zip(gamma).any(|(a, g)| a > g) {
                    continue;
                }
                let term: f64 = alpha
                    .iter()
                    .zip(gamma)
                    .enumerate()
                    .map(|(d, (a, g))| sn[(d, g - a)])
                    .product();
                sum += child_coeff * term;
            }
            self.coeffs[gamma_index] += sum;
        }
    }

    /// Evaluates the expansion truncated at `order` at `point`.
    pub fn evaluate_field(&self, point: &[f64], order: usize, aux: &SeriesExpansionAux) -> f64 {
        let t = aux.scaled_offset(point, &self.center);
        let hn_t = evaluate_hermite_functions(&t, order);

        aux.multi_indices(order)
            .iter()
            .zip(&self.coeffs)
            .map(|(alpha, coeff)| {
                let term: f64 = alpha.iter().enumerate().map(|(d, &a)| hn_t[(d, a)]).product();
                coeff * term
            })
            .sum()
    }

    /// Converts the expansion truncated at `order` into a Taylor expansion
    /// about the centre of `local` and adds it there.
    pub fn translate_to_local(
        &self,
        local: &mut LocalExpansion,
        order: usize,
        aux: &SeriesExpansionAux,
    ) {
        let u = aux.scaled_offset(local.center(), &self.center);
        let hn_u = evaluate_hermite_functions(&u, 2 * order);
        let indices = aux.multi_indices(order);

        for (beta_index, beta) in indices.iter().enumerate() {
            let degree: usize = beta.iter().sum();
            let sign = if degree % 2 == 0 { 1.0 } else { -1.0 };
            let beta_factorial: f64 = beta.iter().map(|&b| aux.factorial(b)).product();

            let mut sum = 0.0;
            for (alpha, coeff) in indices.iter().zip(&self.coeffs) {
                let term: f64 = alpha
                    .iter()
                    .zip(beta)
                    .enumerate()
                    .map(|(d, (a, b))| hn_u[(d, a + b)])
                    .product();
                sum += coeff * term;
            }
            local.add_to_coeff(beta_index, sign * sum / beta_factorial);
        }
        local.raise_order(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpansionFamily;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cluster(n: usize, center: [f64; 2], half_width: f64, seed: u64) -> Mat<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Mat::from_fn(n, 2, |_, j| center[j] + rng.random_range(-half_width..half_width))
    }

    fn direct_sum(points: &Mat<f64>, target: &[f64], scale: f64) -> f64 {
        (0..points.nrows())
            .map(|i| {
                let d2: f64 = (0..2).map(|j| (points[(i, j)] - target[j]).powi(2)).sum();
                (-d2 / (scale * scale)).exp()
            })
            .sum()
    }

    #[test]
    fn far_field_matches_direct_sum() {
        let scale = 2f64.sqrt();
        let aux = SeriesExpansionAux::new(2, 8, ExpansionFamily::Multiplicative, scale);
        let points = cluster(40, [0.0, 0.0], 0.2, 3);
        let weights = vec![1.0; 40];

        let mut expansion = FarFieldExpansion::new(vec![0.0, 0.0], &aux);
        expansion.accumulate_points(&points, &weights, 0, 40, &aux);

        let target = [1.5, -0.7];
        let exact = direct_sum(&points, &target, scale);
        let approx = expansion.evaluate_field(&target, 8, &aux);
        assert!((approx - exact).abs() < 1e-6 * exact.max(1.0));

        // The achieved error respects the bound used for order selection.
        let min_dist_sq = (1.3f64).powi(2) + (0.5f64).powi(2);
        let estimate = aux.order_for_evaluating_farfield(0.2, min_dist_sq, 1e-3).unwrap();
        let truncated = expansion.evaluate_field(&target, estimate.order, &aux);
        assert!((truncated - exact).abs() <= 40.0 * estimate.error);
    }

    #[test]
    fn merging_children_matches_direct_build() {
        let aux = SeriesExpansionAux::new(2, 5, ExpansionFamily::TotalDegree, 1.0);
        let points = cluster(30, [0.5, 0.5], 0.3, 5);
        let weights = vec![1.0; 30];

        let mut left = FarFieldExpansion::new(vec![0.3, 0.4], &aux);
        left.accumulate_points(&points, &weights, 0, 12, &aux);
        let mut right = FarFieldExpansion::new(vec![0.7, 0.6], &aux);
        right.accumulate_points(&points, &weights, 12, 30, &aux);

        let mut parent = FarFieldExpansion::new(vec![0.5, 0.5], &aux);
        parent.translate_from_farfield(&left, &aux);
        parent.translate_from_farfield(&right, &aux);

        let mut direct = FarFieldExpansion::new(vec![0.5, 0.5], &aux);
        direct.accumulate_points(&points, &weights, 0, 30, &aux);

        for (a, b) in parent.coeffs().iter().zip(direct.coeffs()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn translation_to_local_matches_direct_sum() {
        let scale = 2f64.sqrt();
        let aux = SeriesExpansionAux::new(2, 10, ExpansionFamily::Multiplicative, scale);
        let points = cluster(25, [0.0, 0.0], 0.15, 9);
        let weights = vec![1.0; 25];

        let mut far = FarFieldExpansion::new(vec![0.0, 0.0], &aux);
        far.accumulate_points(&points, &weights, 0, 25, &aux);

        let mut local = LocalExpansion::new(vec![1.2, 0.4], &aux);
        far.translate_to_local(&mut local, 10, &aux);

        let target = [1.25, 0.35];
        let exact = direct_sum(&points, &target, scale);
        let approx = local.evaluate_field(&target, &aux);
        assert!((approx - exact).abs() < 1e-6 * exact.max(1.0));
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
//
// Evaluates Hermite functions and scaled monomials used by the Gaussian expansions.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;

/// Evaluates the Hermite functions `h_n(t) = (-1)^n d^n/dt^n exp(-t^2)` for
/// `n = 0..=max_n` along each coordinate of `t`.
///
/// Row `d` of the result holds `h_0(t[d]), ..., h_max_n(t[d])`.
pub(crate) fn evaluate_hermite_functions(t: &[f64], max_n: usize) -> Mat<f64> {
    let mut hn_t = Mat::<f64>::zeros(t.len(), max_n + 1);

    for (i, &ti) in t.iter().enumerate() {
        for j in 0..=max_n {
            let value = if j == 0 {
                (-ti * ti).exp()
            } else if j == 1 {
                2.0 * ti * hn_t[(i, 0)]
            } else {
                2.0 * ti * hn_t[(i, j - 1)] - 2.0 * (j - 1) as f64 * hn_t[(i, j - 2)]
            };
            hn_t[(i, j)] = value;
        }
    }

    hn_t
}

/// Evaluates `t^n` for `n = 0..=max_n` along each coordinate of `t`.
pub(crate) fn evaluate_monomials(t: &[f64], max_n: usize) -> Mat<f64> {
    let mut tn = Mat::<f64>::zeros(t.len(), max_n + 1);

    for (i, &ti) in t.iter().enumerate() {
        tn[(i, 0)] = 1.0;
        for j in 1..=max_n {
            tn[(i, j)] = ti * tn[(i, j - 1)];
        }
    }

    tn
}

/// Evaluates `t^n / n!` for `n = 0..=max_n` along each coordinate of `t`.
pub(crate) fn evaluate_scaled_monomials(t: &[f64], max_n: usize) -> Mat<f64> {
    let mut tn = Mat::<f64>::zeros(t.len(), max_n + 1);

    for (i, &ti) in t.iter().enumerate() {
        tn[(i, 0)] = 1.0;
        for j in 1..=max_n {
            tn[(i, j)] = ti * tn[(i, j - 1)] / j as f64;
        }
    }

    tn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_closed_forms() {
        let t = [0.3, -1.2];
        let h = evaluate_hermite_functions(&t, 3);

        for (i, &ti) in t.iter().enumerate() {
            let g = (-ti * ti).exp();
            assert!((h[(i, 0)] - g).abs() < 1e-15);
            assert!((h[(i, 1)] - 2.0 * ti * g).abs() < 1e-15);
            assert!((h[(i, 2)] - (4.0 * ti * ti - 2.0) * g).abs() < 1e-14);
            assert!((h[(i, 3)] - (8.0 * ti.powi(3) - 12.0 * ti) * g).abs() < 1e-14);
        }
    }

    #[test]
    fn gaussian_shift_is_reproduced() {
        // exp(-(t - u)^2) = sum_n u^n / n! h_n(t)
        let (t, u) = (0.8, 0.25);
        let h = evaluate_hermite_functions(&[t], 20);
        let p = evaluate_scaled_monomials(&[u], 20);
        let series: f64 = (0..=20).map(|n| p[(0, n)] * h[(0, n)]).sum();
        assert!((series - (-(t - u) * (t - u)).exp()).abs() < 1e-14);
    }

    #[test]
    fn monomials() {
        let m = evaluate_monomials(&[2.0], 4);
        assert_eq!(m[(0, 4)], 16.0);
        let s = evaluate_scaled_monomials(&[2.0], 4);
        assert!((s[(0, 4)] - 16.0 / 24.0).abs() < 1e-15);
    }
}

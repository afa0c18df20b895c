/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides utility helpers for point arrays, distances, and small numeric tables.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::{Mat, RowRef};
use std::f64::consts::PI;

/// Returns an owned `Mat<T>` from a subset of row indices.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_kde_utils::select_mat_rows;
///
/// let matrix = mat![
///     [0.0, 1.0],
///     [1.0, 1.0],
///     [2.0, 2.0],
///     [3.0, 3.0f64],
/// ];
///
/// let sub_matrix = select_mat_rows(&matrix, &[3, 0]);
///
/// assert_eq!(
///     sub_matrix,
///     mat![
///         [3.0, 3.0],
///         [0.0, 1.0f64],
///     ]
/// );
/// ```
#[inline(always)]
pub fn select_mat_rows<T>(existing_mat: &Mat<T>, row_indices: &[usize]) -> Mat<T>
where
    T: Clone,
{
    Mat::from_fn(row_indices.len(), existing_mat.ncols(), |i, j| {
        existing_mat.get(row_indices[i], j).clone()
    })
}

/// Returns the indices that would sort the input slice.
///
/// # Examples
///
/// ```
/// use ferreus_kde_utils::argsort;
///
/// let data = [30, 10, 20];
///
/// let sorted_indices = argsort(&data);
///
/// assert_eq!(sorted_indices, vec![1, 2, 0]);
/// ```
#[inline(always)]
pub fn argsort<T: PartialOrd>(data: &[T]) -> Vec<usize> {
    let mut indices = (0..data.len()).collect::<Vec<_>>();
    indices.sort_by(|&i, &j| {
        data[i]
            .partial_cmp(&data[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Computes the axis aligned bounding box (AABB) extents of a contiguous block
/// of rows `begin..begin + count` of a matrix of points.
///
/// The result is arranged as `[min_0, ..., min_n, max_0, ..., max_n]`
/// where `n` is the number of columns in the matrix.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_kde_utils::get_pointarray_extents;
///
/// let points = mat![
///     [9.0, 9.0],
///     [1.0, 2.0],
///     [3.0, -1.0],
///     [0.5, 4.0f64]
/// ];
/// let extents = get_pointarray_extents(&points, 1, 3);
/// assert_eq!(extents, vec![0.5, -1.0, 3.0, 4.0]);
/// ```
#[inline(always)]
pub fn get_pointarray_extents(points: &Mat<f64>, begin: usize, count: usize) -> Vec<f64> {
    let ncols = points.ncols();

    // The first half of the vector stores mins, the second half stores maxs.
    let mut extents = vec![0.0; 2 * ncols];
    for col in 0..ncols {
        extents[col] = f64::INFINITY;
        extents[col + ncols] = f64::NEG_INFINITY;
    }

    for row in begin..begin + count {
        for col in 0..ncols {
            let item = points[(row, col)];
            if item < extents[col] {
                extents[col] = item;
            }
            if item > extents[col + ncols] {
                extents[col + ncols] = item;
            }
        }
    }

    extents
}

/// Calculates the squared euclidean distance between two points.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_kde_utils::get_distance_sq;
///
/// let points = mat![
///     [1.0, 2.0],
///     [4.0, 6.0f64],
/// ];
///
/// let dist_sq = get_distance_sq(points.row(0), points.row(1));
///
/// assert_eq!(dist_sq, 25.0);
/// ```
#[inline(always)]
pub fn get_distance_sq(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    let mut dist = 0.0;
    for (t, s) in target.iter().zip(source.iter()) {
        let diff = t - s;
        dist += diff * diff;
    }
    dist
}

/// Volume of the unit ball in `dimension` dimensions.
///
/// # Examples
///
/// ```
/// use ferreus_kde_utils::unit_sphere_volume;
///
/// assert_eq!(unit_sphere_volume(1), 2.0);
/// assert!((unit_sphere_volume(2) - std::f64::consts::PI).abs() < 1e-15);
/// ```
pub fn unit_sphere_volume(dimension: usize) -> f64 {
    // V_n = 2 pi / n * V_{n - 2}, with V_0 = 1 and V_1 = 2.
    let mut volume = if dimension % 2 == 0 { 1.0 } else { 2.0 };
    let mut n = if dimension % 2 == 0 { 2 } else { 3 };
    while n <= dimension {
        volume *= 2.0 * PI / n as f64;
        n += 2;
    }
    volume
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_volume_three_dimensions() {
        assert!((unit_sphere_volume(3) - 4.0 / 3.0 * PI).abs() < 1e-14);
        assert_eq!(unit_sphere_volume(0), 1.0);
    }

    #[test]
    fn extents_of_single_row() {
        let points = faer::mat![[1.0, -2.0], [3.0, 4.0f64]];
        let extents = get_pointarray_extents(&points, 1, 1);
        assert_eq!(extents, vec![3.0, 4.0, 3.0, 4.0]);
    }
}

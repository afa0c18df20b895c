/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements axis aligned hyper-rectangle bounds and the box-to-box distance queries.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;
use ferreus_kde_utils::{Range, get_pointarray_extents};

/// Axis aligned bounding box of the points held by a tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct HRectBound {
    mins: Vec<f64>,
    maxs: Vec<f64>,
}

impl HRectBound {
    /// Builds a bound from explicit corners.
    pub fn new(mins: Vec<f64>, maxs: Vec<f64>) -> Self {
        debug_assert_eq!(mins.len(), maxs.len());
        HRectBound { mins, maxs }
    }

    /// Tight bound of rows `begin..begin + count` of `points`.
    pub fn from_rows(points: &Mat<f64>, begin: usize, count: usize) -> Self {
        let dim = points.ncols();
        let mut extents = get_pointarray_extents(points, begin, count);
        let maxs = extents.split_off(dim);
        HRectBound {
            mins: extents,
            maxs,
        }
    }

    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.mins.len()
    }

    /// Interval covered along dimension `d`.
    #[inline(always)]
    pub fn side(&self, d: usize) -> Range {
        Range::new(self.mins[d], self.maxs[d])
    }

    /// Dimension with the largest extent, first wins on ties.
    pub fn widest_dimension(&self) -> (usize, f64) {
        let mut best = (0, self.maxs[0] - self.mins[0]);
        for d in 1..self.dim() {
            let width = self.maxs[d] - self.mins[d];
            if width > best.1 {
                best = (d, width);
            }
        }
        best
    }

    pub fn midpoint(&self) -> Vec<f64> {
        self.mins
            .iter()
            .zip(self.maxs.iter())
            .map(|(lo, hi)| 0.5 * (lo + hi))
            .collect()
    }

    /// Largest half side length, the radius of the box in the infinity norm.
    pub fn max_half_width(&self) -> f64 {
        self.mins
            .iter()
            .zip(self.maxs.iter())
            .map(|(lo, hi)| 0.5 * (hi - lo))
            .fold(0.0, f64::max)
    }

    /// Smallest and largest squared distance between any point of `self`
    /// and any point of `other`.
    pub fn range_distance_sq(&self, other: &HRectBound) -> Range {
        let mut lo = 0.0;
        let mut hi = 0.0;
        for d in 0..self.dim() {
            let gap = (other.mins[d] - self.maxs[d]).max(self.mins[d] - other.maxs[d]);
            if gap > 0.0 {
                lo += gap * gap;
            }
            let span = (other.maxs[d] - self.mins[d]).max(self.maxs[d] - other.mins[d]);
            hi += span * span;
        }
        Range::new(lo, hi)
    }

    /// Squared distance from `self` to the midpoint of `other`.
    ///
    /// Used to order traversal of reference children: the child closer to
    /// the query box is visited first.
    pub fn min_to_mid_sq(&self, other: &HRectBound) -> f64 {
        let mut sum = 0.0;
        for d in 0..self.dim() {
            let mid = 0.5 * (other.mins[d] + other.maxs[d]);
            let gap = if mid < self.mins[d] {
                self.mins[d] - mid
            } else if mid > self.maxs[d] {
                mid - self.maxs[d]
            } else {
                0.0
            };
            sum += gap * gap;
        }
        sum
    }

    pub fn contains(&self, point: &[f64]) -> bool {
        point
            .iter()
            .enumerate()
            .all(|(d, x)| *x >= self.mins[d] && *x <= self.maxs[d])
    }
}

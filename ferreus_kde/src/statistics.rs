/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the per-node and per-query bookkeeping used by the dual-tree traversal.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Error and bound bookkeeping for the dual-tree density estimator.
//!
//! All densities here are unnormalized sums of kernel values. They are scaled
//! to true densities only once, when results are flushed to the query points.
use ferreus_kde_utils::Range;
use serde::{Deserialize, Serialize};

/// Distance and contribution bounds between a query node and a reference node.
///
/// Only lives for the duration of one traversal call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delta {
    /// Range of squared distances between the two boxes.
    pub dsqd_range: Range,
    /// Kernel value range scaled by the reference node's point count.
    pub density_range: Range,
}

/// Contributions proven for every query in a subtree but not yet pushed to its leaves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Postponed {
    /// Bounds on the deferred density contribution.
    pub density_range: Range,
    /// Portion of `density_range` approximated by finite differences. Its
    /// midpoint is added to the estimate of each query.
    pub finite_diff_range: Range,
    /// Absolute error spent on the deferred contributions.
    pub used_error: f64,
    /// Reference points accounted for by the deferred contributions.
    pub num_pruned: usize,
}

impl Postponed {
    pub fn reset(&mut self) {
        *self = Postponed::default();
    }

    /// Adds another batch of deferred contributions to this one.
    pub fn apply_postponed(&mut self, other: &Postponed) {
        self.density_range += other.density_range;
        self.finite_diff_range += other.finite_diff_range;
        self.used_error += other.used_error;
        self.num_pruned += other.num_pruned;
    }

    /// Records a finite difference prune of a whole reference node.
    pub fn add_finite_difference(&mut self, delta: &Delta, used_error: f64, num_pruned: usize) {
        self.density_range += delta.density_range;
        self.finite_diff_range += delta.density_range;
        self.used_error += used_error;
        self.num_pruned += num_pruned;
    }

    /// Records a series expansion prune. The estimate itself is carried by
    /// the expansion, so only bounds and bookkeeping are deferred.
    pub fn add_series_expansion(&mut self, delta: &Delta, used_error: f64, num_pruned: usize) {
        self.density_range += delta.density_range;
        self.used_error += used_error;
        self.num_pruned += num_pruned;
    }
}

/// Running result for a single query point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QResult {
    /// Lower and upper bound on the density.
    pub density_range: Range,
    /// Current density estimate.
    pub density_estimate: f64,
    /// Absolute error spent so far.
    pub used_error: f64,
    /// Reference points accounted for so far.
    pub num_pruned: usize,
}

impl QResult {
    pub fn apply_postponed(&mut self, postponed: &Postponed) {
        self.density_range += postponed.density_range;
        self.density_estimate += postponed.finite_diff_range.mid();
        self.used_error += postponed.used_error;
        self.num_pruned += postponed.num_pruned;
    }

    /// Adds an exactly evaluated kernel value.
    #[inline(always)]
    pub fn add_kernel_value(&mut self, value: f64) {
        self.density_range += value;
        self.density_estimate += value;
    }

    /// Scales the result from a kernel sum to a density.
    pub fn normalize(&mut self, mul_constant: f64) {
        self.density_range *= mul_constant;
        self.density_estimate *= mul_constant;
        self.used_error *= mul_constant;
    }
}

/// Bounds that hold for every query point below a node.
///
/// The density lower bound never overstates, and the used error and pruned
/// count never understate, any descendant query's current value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryResult {
    pub density_range: Range,
    pub used_error: f64,
    pub num_pruned: usize,
}

impl SummaryResult {
    pub fn reset(&mut self) {
        *self = SummaryResult::default();
    }

    /// Prepares the summary to be rebuilt from leaf results or child summaries.
    pub fn start_reaccumulate(&mut self, num_references: usize) {
        self.density_range = Range::empty();
        self.used_error = 0.0;
        self.num_pruned = num_references;
    }

    /// Folds a query point's result into the summary.
    pub fn accumulate_result(&mut self, result: &QResult) {
        self.density_range |= result.density_range;
        self.used_error = self.used_error.max(result.used_error);
        self.num_pruned = self.num_pruned.min(result.num_pruned);
    }

    /// Folds a child's summary into the summary.
    pub fn accumulate_summary(&mut self, child: &SummaryResult) {
        self.density_range |= child.density_range;
        self.used_error = self.used_error.max(child.used_error);
        self.num_pruned = self.num_pruned.min(child.num_pruned);
    }

    /// Refines the summary with contributions deferred at this node.
    pub fn apply_postponed(&mut self, postponed: &Postponed) {
        self.density_range += postponed.density_range;
        self.used_error += postponed.used_error;
        self.num_pruned += postponed.num_pruned;
    }

    /// Adds another summary, e.g. bounds for reference nodes not yet visited.
    pub fn apply_summary_result(&mut self, other: &SummaryResult) {
        self.density_range += other.density_range;
        self.used_error += other.used_error;
        self.num_pruned += other.num_pruned;
    }

    /// Adds the bounds of the reference node currently being considered.
    pub fn apply_delta(&mut self, delta: &Delta) {
        self.density_range += delta.density_range;
    }
}

/// Number of node pairs resolved by each kind of prune, and by exhaustive
/// evaluation, during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PruneCounts {
    /// Pairs excluded because the kernel is exactly zero between them.
    pub exclusion: usize,
    /// Pairs approximated by the midpoint of their contribution range.
    pub finite_difference: usize,
    /// Pairs resolved by translating a far-field expansion to a local one.
    pub farfield_to_local: usize,
    /// Pairs resolved by evaluating a far-field expansion at each query.
    pub farfield: usize,
    /// Pairs resolved by accumulating reference points into a local expansion.
    pub local: usize,
    /// Leaf pairs evaluated exhaustively.
    pub base_cases: usize,
}

impl PruneCounts {
    /// Total series expansion prunes of all three kinds.
    pub fn series_expansion(&self) -> usize {
        self.farfield_to_local + self.farfield + self.local
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the dual-tree kernel density estimator and its pruning rules.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Dual-tree kernel density estimation with a guaranteed relative error.
//!
//! Query and reference points are each organised in a [`KDTree`]. The
//! traversal visits pairs of nodes and either resolves a whole pair at once or
//! recurses into the larger node. A pair is resolved when
//! - the kernel is exactly zero between the two boxes (exclusion),
//! - the spread of the pair's contribution fits the error budget, in which case
//!   the midpoint is used (finite difference), or
//! - a Gaussian series expansion is cheaper than exhaustive evaluation and its
//!   truncation error fits the budget.
//!
//! Contributions proven at an internal query node are parked on the node and
//! only pushed down to its points when the node is split or the traversal
//! finishes.

// # References
// [1] A. Gray, A. Moore, Nonparametric density estimation: toward computational tractability, SIAM Data Mining (2003).
// [2] D. Lee, A. Gray, A. Moore, Dual-tree fast Gauss transforms, NIPS 18 (2006).

use crate::{
    common,
    config::KdeParams,
    error::{KdeError, KdeResult},
    kdtree::KDTree,
    progress::{ProgressMsg, ProgressSink},
    series::{FarFieldExpansion, LocalExpansion, OrderEstimate, SeriesExpansionAux, point_coords},
    statistics::{Delta, Postponed, PruneCounts, QResult, SummaryResult},
};
use faer::Mat;
use ferreus_kde_utils::{
    DensityKernel, KernelFromParams, KernelParams, KernelType, Range, get_distance_sq,
    kernels::{EpanechnikovKernel, GaussianKernel},
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Query and reference trees. When queries and references are the same set
/// a single tree plays both roles.
#[derive(Debug)]
enum KdeTrees {
    Distinct { query: KDTree, reference: KDTree },
    Shared(KDTree),
}

impl KdeTrees {
    #[inline(always)]
    fn query(&self) -> &KDTree {
        match self {
            KdeTrees::Distinct { query, .. } => query,
            KdeTrees::Shared(tree) => tree,
        }
    }

    #[inline(always)]
    fn reference(&self) -> &KDTree {
        match self {
            KdeTrees::Distinct { reference, .. } => reference,
            KdeTrees::Shared(tree) => tree,
        }
    }

    fn is_shared(&self) -> bool {
        matches!(self, KdeTrees::Shared(_))
    }
}

/// Which statistics a pre-processing pass initialises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TreeRole {
    Query,
    Reference,
    Both,
}

impl TreeRole {
    fn is_query(self) -> bool {
        matches!(self, TreeRole::Query | TreeRole::Both)
    }

    fn is_reference(self) -> bool {
        matches!(self, TreeRole::Reference | TreeRole::Both)
    }
}

/// Statistics held by every query tree node.
#[derive(Debug, Clone, Default)]
struct QueryStat {
    summary: SummaryResult,
    postponed: Postponed,
    local: LocalExpansion,
}

/// Statistics held by every reference tree node.
#[derive(Debug, Clone, Default)]
struct ReferenceStat {
    farfield: FarFieldExpansion,
}

/// Outcome of bounding a node pair.
#[derive(Debug, Clone, Copy)]
enum PairBounds {
    /// The kernel vanishes between the nodes and the pair was accounted for.
    Excluded,
    /// The pair contributes within these bounds.
    Bounded(Delta),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeriesMethod {
    FarFieldToLocal,
    FarField,
    Local,
}

/// Picks the cheapest way to resolve a node pair with `q_count` queries and
/// `r_count` references, or `None` when exhaustive evaluation is cheapest.
///
/// Ties go to far-field to local, then far-field, then local, then exhaustive.
fn choose_series_method(
    f2l: Option<OrderEstimate>,
    farfield: Option<OrderEstimate>,
    local: Option<OrderEstimate>,
    q_count: usize,
    r_count: usize,
    dim: usize,
) -> Option<(SeriesMethod, OrderEstimate)> {
    let power = dim as i32;
    let terms = |estimate: &Option<OrderEstimate>, power: i32| -> f64 {
        estimate.map_or(f64::INFINITY, |e| ((e.order + 1) as f64).powi(power))
    };
    let cost_f2l = terms(&f2l, 2 * power);
    let cost_farfield = terms(&farfield, power) * q_count as f64;
    let cost_local = terms(&local, power) * r_count as f64;
    let cost_exhaustive = (q_count * r_count) as f64 * dim as f64;

    let min_cost = cost_f2l.min(cost_farfield).min(cost_local).min(cost_exhaustive);

    [
        (SeriesMethod::FarFieldToLocal, f2l, cost_f2l),
        (SeriesMethod::FarField, farfield, cost_farfield),
        (SeriesMethod::Local, local, cost_local),
    ]
    .into_iter()
    .find_map(|(method, estimate, cost)| match estimate {
        Some(estimate) if cost == min_cost => Some((method, estimate)),
        _ => None,
    })
}

/// Density estimates produced by [`FastKde::compute`], in input query order.
#[derive(Debug, Clone)]
pub struct KdeResults {
    /// Estimated density at each query point.
    pub density_estimates: Vec<f64>,
    /// Proven lower and upper bounds on each density.
    pub density_ranges: Vec<Range>,
    /// Absolute error spent at each query point, in density units.
    pub used_errors: Vec<f64>,
    /// Reference points accounted for by pruning at each query point.
    pub num_pruned: Vec<usize>,
    /// Node pairs resolved by each kind of prune.
    pub prune_counts: PruneCounts,
}

impl KdeResults {
    /// Writes one density estimate per line to `writer`.
    pub fn write_density_estimates<W: Write>(&self, writer: W) -> std::io::Result<()> {
        common::write_values(&self.density_estimates, writer)
    }

    /// Writes one density estimate per line to the file at `path`.
    pub fn save_density_estimates<P: AsRef<Path>>(&self, path: P) -> KdeResult<()> {
        common::save_values(&self.density_estimates, path)
    }
}

/// Builder for [`FastKde`], created with [`FastKde::builder`].
#[derive(Debug)]
pub struct FastKdeBuilder<K> {
    references: Mat<f64>,
    queries: Option<Mat<f64>>,
    kernel: K,
    params: KdeParams,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl<K: DensityKernel> FastKdeBuilder<K> {
    /// Estimates the density at these points instead of at the reference points.
    pub fn queries(mut self, queries: Mat<f64>) -> Self {
        self.queries = Some(queries);
        self
    }

    /// Sets a sink that receives progress events.
    pub fn progress_callback(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(sink);
        self
    }

    /// Validates the inputs and builds the query and reference trees.
    ///
    /// # Errors
    /// - [`KdeError::InvalidBandwidth`] if the kernel bandwidth is not positive and finite.
    /// - [`KdeError::InvalidRelativeError`] or [`KdeError::InvalidLeafSize`] for bad parameters.
    /// - [`KdeError::EmptyDataset`] if a point set has no rows or no columns.
    /// - [`KdeError::DimensionMismatch`] if queries and references differ in dimension.
    /// - [`KdeError::ExpansionTooLarge`] if the kernel has series expansions and
    ///   the expansion order gives more than
    ///   [`MAX_EXPANSION_TERMS`](crate::config::MAX_EXPANSION_TERMS) terms.
    pub fn build(self) -> KdeResult<FastKde<K>> {
        self.params.validate()?;

        let bandwidth = self.kernel.bandwidth();
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return Err(KdeError::InvalidBandwidth(bandwidth));
        }

        if self.references.nrows() == 0 || self.references.ncols() == 0 {
            return Err(KdeError::EmptyDataset { which: "reference" });
        }
        if let Some(queries) = &self.queries {
            if queries.nrows() == 0 || queries.ncols() == 0 {
                return Err(KdeError::EmptyDataset { which: "query" });
            }
            if queries.ncols() != self.references.ncols() {
                return Err(KdeError::DimensionMismatch {
                    query: queries.ncols(),
                    reference: self.references.ncols(),
                });
            }
        }

        if self.kernel.hermite_scale().is_some() {
            self.params.validate_expansion(self.references.ncols())?;
        }

        let start = Instant::now();
        let leaf_size = self.params.leaf_size;
        let trees = match &self.queries {
            Some(queries) => KdeTrees::Distinct {
                query: KDTree::new(queries, leaf_size),
                reference: KDTree::new(&self.references, leaf_size),
            },
            None => KdeTrees::Shared(KDTree::new(&self.references, leaf_size)),
        };

        if let Some(sink) = &self.progress_callback {
            sink.emit(ProgressMsg::TreesBuilt {
                num_query_nodes: trees.query().num_nodes(),
                num_reference_nodes: trees.reference().num_nodes(),
                shared_tree: trees.is_shared(),
                elapsed_secs: start.elapsed().as_secs_f64(),
            });
        }

        let dim = self.references.ncols();
        let num_references = self.references.nrows();
        let num_queries = trees.query().points().nrows();

        let series_aux = self.kernel.hermite_scale().map(|scale| {
            SeriesExpansionAux::new(
                dim,
                self.params.max_expansion_order(dim),
                self.params.expansion_family,
                scale,
            )
        });

        if series_aux.is_none() {
            if let Some(sink) = &self.progress_callback {
                sink.emit(ProgressMsg::Message {
                    message: "Kernel has no series expansion, pruning by exclusion and \
                              finite differences only"
                        .to_string(),
                });
            }
        }

        Ok(FastKde {
            mul_constant: 1.0 / (self.kernel.norm_constant(dim) * num_references as f64),
            kernel: self.kernel,
            params: self.params,
            reference_weights: vec![1.0; num_references],
            query_stats: vec![QueryStat::default(); trees.query().num_nodes()],
            reference_stats: vec![ReferenceStat::default(); trees.reference().num_nodes()],
            q_results: vec![QResult::default(); num_queries],
            trees,
            series_aux,
            num_references,
            prune_counts: PruneCounts::default(),
            progress_callback: self.progress_callback,
        })
    }
}

/// A single dual-tree density estimation run.
///
/// Built with [`FastKde::builder`] and consumed by [`FastKde::compute`].
///
/// # Examples
///
/// ```
/// use ferreus_kde::{FastKde, KdeParams, generate_random_points};
/// use ferreus_kde_utils::kernels::GaussianKernel;
///
/// let references = generate_random_points(500, 2, Some(1));
/// let params = KdeParams::builder().relative_error(0.05).build();
///
/// let results = FastKde::builder(references, GaussianKernel::new(0.1), params)
///     .build()?
///     .compute();
///
/// assert_eq!(results.density_estimates.len(), 500);
/// # Ok::<(), ferreus_kde::KdeError>(())
/// ```
#[derive(Debug)]
pub struct FastKde<K> {
    kernel: K,
    params: KdeParams,
    trees: KdeTrees,
    reference_weights: Vec<f64>,
    query_stats: Vec<QueryStat>,
    reference_stats: Vec<ReferenceStat>,
    q_results: Vec<QResult>,
    series_aux: Option<SeriesExpansionAux>,
    num_references: usize,
    mul_constant: f64,
    prune_counts: PruneCounts,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl<K: DensityKernel> FastKde<K> {
    /// Starts configuring a run over `references`. Without a call to
    /// [`FastKdeBuilder::queries`] the density is estimated at the reference
    /// points themselves, sharing one tree.
    pub fn builder(references: Mat<f64>, kernel: K, params: KdeParams) -> FastKdeBuilder<K> {
        FastKdeBuilder {
            references,
            queries: None,
            kernel,
            params,
            progress_callback: None,
        }
    }

    pub fn num_query_nodes(&self) -> usize {
        self.trees.query().num_nodes()
    }

    pub fn num_reference_nodes(&self) -> usize {
        self.trees.reference().num_nodes()
    }

    /// Runs the traversal and returns the density at every query point.
    pub fn compute(mut self) -> KdeResults {
        let start = Instant::now();

        if self.trees.is_shared() {
            self.pre_process(self.trees.reference().root(), TreeRole::Both);
        } else {
            self.pre_process(self.trees.reference().root(), TreeRole::Reference);
            self.pre_process(self.trees.query().root(), TreeRole::Query);
        }

        if let Some(sink) = &self.progress_callback {
            sink.emit(ProgressMsg::PreProcessed {
                elapsed_secs: start.elapsed().as_secs_f64(),
            });
        }

        let start = Instant::now();
        let q_root = self.trees.query().root();
        let r_root = self.trees.reference().root();

        if let PairBounds::Bounded(delta) = self.intrinsic_prunable(q_root, r_root) {
            self.fkde(q_root, r_root, delta, SummaryResult::default());
        }
        self.post_process(q_root);

        if let Some(sink) = &self.progress_callback {
            sink.emit(ProgressMsg::TraversalFinished {
                prune_counts: self.prune_counts,
                elapsed_secs: start.elapsed().as_secs_f64(),
            });
        }

        let query_tree = self.trees.query();
        let estimates: Vec<f64> = self.q_results.iter().map(|r| r.density_estimate).collect();
        let ranges: Vec<Range> = self.q_results.iter().map(|r| r.density_range).collect();
        let used_errors: Vec<f64> = self.q_results.iter().map(|r| r.used_error).collect();
        let num_pruned: Vec<usize> = self.q_results.iter().map(|r| r.num_pruned).collect();

        KdeResults {
            density_estimates: query_tree.to_input_order(&estimates),
            density_ranges: query_tree.to_input_order(&ranges),
            used_errors: query_tree.to_input_order(&used_errors),
            num_pruned: query_tree.to_input_order(&num_pruned),
            prune_counts: self.prune_counts,
        }
    }

    /// Sets expansion centres and clears traversal state below `node`, then
    /// builds far-field coefficients bottom up.
    fn pre_process(&mut self, node: usize, role: TreeRole) {
        let tree = match role {
            TreeRole::Query => self.trees.query(),
            TreeRole::Reference | TreeRole::Both => self.trees.reference(),
        };
        let tree_node = tree.node(node);
        let (begin, end, children) = (tree_node.begin, tree_node.end(), tree_node.children);
        let center = tree_node.bound.midpoint();

        if role.is_query() {
            let stat = &mut self.query_stats[node];
            stat.summary.reset();
            stat.postponed.reset();
            if let Some(aux) = &self.series_aux {
                stat.local = LocalExpansion::new(center.clone(), aux);
            }
        }
        if role.is_reference() {
            if let Some(aux) = &self.series_aux {
                self.reference_stats[node].farfield = FarFieldExpansion::new(center, aux);
            }
        }

        if let Some((left, right)) = children {
            self.pre_process(left, role);
            self.pre_process(right, role);
        }

        if !role.is_reference() {
            return;
        }
        let Some(aux) = &self.series_aux else {
            return;
        };
        match children {
            Some((left, right)) => {
                let mut farfield = std::mem::take(&mut self.reference_stats[node].farfield);
                farfield.translate_from_farfield(&self.reference_stats[left].farfield, aux);
                farfield.translate_from_farfield(&self.reference_stats[right].farfield, aux);
                self.reference_stats[node].farfield = farfield;
            }
            None => {
                self.reference_stats[node].farfield.accumulate_points(
                    self.trees.reference().points(),
                    &self.reference_weights,
                    begin,
                    end,
                    aux,
                );
            }
        }
    }

    /// Bounds the contribution of `rnode` to every query in `qnode`. A pair
    /// whose kernel is zero everywhere is accounted for immediately.
    fn intrinsic_prunable(&mut self, qnode: usize, rnode: usize) -> PairBounds {
        let r_node = self.trees.reference().node(rnode);
        let dsqd_range = self
            .trees
            .query()
            .node(qnode)
            .bound
            .range_distance_sq(&r_node.bound);
        let kernel_range = self.kernel.range_unnorm_on_sq(dsqd_range);

        if kernel_range.hi == 0.0 {
            self.query_stats[qnode].postponed.num_pruned += r_node.count;
            self.prune_counts.exclusion += 1;
            return PairBounds::Excluded;
        }

        PairBounds::Bounded(Delta {
            dsqd_range,
            density_range: kernel_range * r_node.count as f64,
        })
    }

    /// Error still available to the reference points not yet accounted for,
    /// and the number of those points. `mu` bounds every query in the node.
    fn error_budget(&self, mu: &SummaryResult, r_count: usize) -> (f64, f64) {
        // never fewer than the points about to be pruned
        let remaining = self
            .num_references
            .saturating_sub(mu.num_pruned)
            .max(r_count);
        let budget = self.params.relative_error * mu.density_range.lo - mu.used_error;
        (budget, remaining as f64)
    }

    /// Tries to replace the pair's contribution by the midpoint of its range,
    /// and failing that by a series expansion.
    fn extrinsic_prunable(
        &mut self,
        qnode: usize,
        rnode: usize,
        delta: &Delta,
        mu: &SummaryResult,
    ) -> bool {
        let r_count = self.trees.reference().node(rnode).count;
        let (budget, remaining) = self.error_budget(mu, r_count);
        let allocated_error = budget * r_count as f64 / remaining;
        let half_width = 0.5 * delta.density_range.width();

        if half_width <= allocated_error {
            self.query_stats[qnode]
                .postponed
                .add_finite_difference(delta, half_width, r_count);
            self.prune_counts.finite_difference += 1;
            return true;
        }

        self.extrinsic_prunable_series_expansion(qnode, rnode, delta, mu)
    }

    /// Picks the cheapest of the three series expansion methods, or
    /// exhaustive evaluation, and applies it if it is an expansion.
    fn extrinsic_prunable_series_expansion(
        &mut self,
        qnode: usize,
        rnode: usize,
        delta: &Delta,
        mu: &SummaryResult,
    ) -> bool {
        let q_node = self.trees.query().node(qnode);
        let r_node = self.trees.reference().node(rnode);
        let (q_count, r_count) = (q_node.count, r_node.count);
        let (budget, remaining) = self.error_budget(mu, r_count);

        let Some(aux) = &self.series_aux else {
            return false;
        };

        let allowed_error = budget / remaining;
        let min_dist_sq = delta.dsqd_range.lo;
        let q_half_width = q_node.bound.max_half_width();
        let r_half_width = r_node.bound.max_half_width();

        let f2l = aux.order_for_converting_to_local(
            r_half_width,
            q_half_width,
            min_dist_sq,
            allowed_error,
        );
        let farfield = aux.order_for_evaluating_farfield(r_half_width, min_dist_sq, allowed_error);
        let local = aux.order_for_evaluating_local(q_half_width, min_dist_sq, allowed_error);

        let chosen = choose_series_method(f2l, farfield, local, q_count, r_count, aux.dim());
        let Some((method, estimate)) = chosen else {
            return false;
        };

        self.query_stats[qnode].postponed.add_series_expansion(
            delta,
            r_count as f64 * estimate.error,
            r_count,
        );

        match method {
            SeriesMethod::FarFieldToLocal => {
                self.reference_stats[rnode].farfield.translate_to_local(
                    &mut self.query_stats[qnode].local,
                    estimate.order,
                    aux,
                );
                self.prune_counts.farfield_to_local += 1;
            }
            SeriesMethod::FarField => {
                let points = self.trees.query().points();
                let farfield = &self.reference_stats[rnode].farfield;
                for row in q_node.begin..q_node.end() {
                    self.q_results[row].density_estimate +=
                        farfield.evaluate_field(&point_coords(points, row), estimate.order, aux);
                }
                self.prune_counts.farfield += 1;
            }
            SeriesMethod::Local => {
                self.query_stats[qnode].local.accumulate_points(
                    self.trees.reference().points(),
                    &self.reference_weights,
                    r_node.begin,
                    r_node.end(),
                    estimate.order,
                    aux,
                );
                self.prune_counts.local += 1;
            }
        }

        true
    }

    /// Exhaustive evaluation between two leaves.
    fn fkde_base(&mut self, qnode: usize, rnode: usize) {
        let q_node = self.trees.query().node(qnode);
        let r_node = self.trees.reference().node(rnode);
        let q_points = self.trees.query().points();
        let r_points = self.trees.reference().points();

        let stat = &mut self.query_stats[qnode];
        stat.summary.start_reaccumulate(self.num_references);

        for q_row in q_node.begin..q_node.end() {
            let result = &mut self.q_results[q_row];
            result.apply_postponed(&stat.postponed);

            let q_point = q_points.row(q_row);
            for r_row in r_node.begin..r_node.end() {
                let dist_sq = get_distance_sq(q_point, r_points.row(r_row));
                result.add_kernel_value(
                    self.reference_weights[r_row] * self.kernel.eval_unnorm_on_sq(dist_sq),
                );
            }

            stat.summary.accumulate_result(result);
        }

        stat.postponed.reset();
        self.prune_counts.base_cases += 1;
    }

    /// Resolves the contribution of `rnode` to every query in `qnode`.
    ///
    /// `unvisited` bounds the contribution of reference nodes the traversal
    /// has committed to visit later for this query node.
    fn fkde(&mut self, qnode: usize, rnode: usize, delta: Delta, unvisited: SummaryResult) {
        let mut mu = self.query_stats[qnode].summary;
        mu.apply_postponed(&self.query_stats[qnode].postponed);
        mu.apply_summary_result(&unvisited);
        mu.apply_delta(&delta);

        if self.extrinsic_prunable(qnode, rnode, &delta, &mu) {
            return;
        }

        let q_node = self.trees.query().node(qnode);
        let r_node = self.trees.reference().node(rnode);
        let (q_children, q_count) = (q_node.children, q_node.count);
        let (r_children, r_count) = (r_node.children, r_node.count);

        match (q_children, r_children) {
            (None, None) => self.fkde_base(qnode, rnode),
            (Some(children), None) => self.split_query(qnode, rnode, children, unvisited),
            (Some(children), Some(_)) if q_count >= r_count => {
                self.split_query(qnode, rnode, children, unvisited)
            }
            (_, Some(children)) => self.split_reference(qnode, children, unvisited),
        }
    }

    fn split_query(
        &mut self,
        qnode: usize,
        rnode: usize,
        (left, right): (usize, usize),
        unvisited: SummaryResult,
    ) {
        self.query_stats[qnode]
            .summary
            .start_reaccumulate(self.num_references);
        let parent_postponed = self.query_stats[qnode].postponed;

        for child in [left, right] {
            self.query_stats[child]
                .postponed
                .apply_postponed(&parent_postponed);

            if let PairBounds::Bounded(child_delta) = self.intrinsic_prunable(child, rnode) {
                self.fkde(child, rnode, child_delta, unvisited);
            }

            let mut child_summary = self.query_stats[child].summary;
            child_summary.apply_postponed(&self.query_stats[child].postponed);
            self.query_stats[qnode]
                .summary
                .accumulate_summary(&child_summary);
        }

        self.query_stats[qnode].postponed.reset();
    }

    fn split_reference(
        &mut self,
        qnode: usize,
        (left, right): (usize, usize),
        unvisited: SummaryResult,
    ) {
        let left_bounds = self.intrinsic_prunable(qnode, left);
        let right_bounds = self.intrinsic_prunable(qnode, right);

        match (left_bounds, right_bounds) {
            (PairBounds::Excluded, PairBounds::Excluded) => {}
            (PairBounds::Bounded(delta), PairBounds::Excluded) => {
                self.fkde(qnode, left, delta, unvisited)
            }
            (PairBounds::Excluded, PairBounds::Bounded(delta)) => {
                self.fkde(qnode, right, delta, unvisited)
            }
            (PairBounds::Bounded(left_delta), PairBounds::Bounded(right_delta)) => {
                // The first visit must account for the other child, which is
                // still to come.
                if self.visits_left_first(qnode, left, right) {
                    let mut first_unvisited = unvisited;
                    first_unvisited.apply_delta(&right_delta);
                    self.fkde(qnode, left, left_delta, first_unvisited);
                    self.fkde(qnode, right, right_delta, unvisited);
                } else {
                    let mut first_unvisited = unvisited;
                    first_unvisited.apply_delta(&left_delta);
                    self.fkde(qnode, right, right_delta, first_unvisited);
                    self.fkde(qnode, left, left_delta, unvisited);
                }
            }
        }
    }

    /// Whether the left reference child is closer to the query box's
    /// midpoint. Equal distances favour the left child.
    fn visits_left_first(&self, qnode: usize, left: usize, right: usize) -> bool {
        let q_bound = &self.trees.query().node(qnode).bound;
        let reference = self.trees.reference();
        let left_heuristic = reference.node(left).bound.min_to_mid_sq(q_bound);
        let right_heuristic = reference.node(right).bound.min_to_mid_sq(q_bound);
        left_heuristic <= right_heuristic
    }

    /// Pushes parked contributions and local expansions down to the leaves
    /// and finalises each query's density.
    fn post_process(&mut self, qnode: usize) {
        let q_node = self.trees.query().node(qnode);
        let (begin, end, children) = (q_node.begin, q_node.end(), q_node.children);

        if let Some((left, right)) = children {
            let postponed = self.query_stats[qnode].postponed;
            for child in [left, right] {
                self.query_stats[child].postponed.apply_postponed(&postponed);

                // Children always follow their parent in the arena.
                if let Some(aux) = &self.series_aux {
                    let (head, tail) = self.query_stats.split_at_mut(child);
                    head[qnode].local.translate_to_local(&mut tail[0].local, aux);
                }
            }
            self.query_stats[qnode].postponed.reset();

            self.post_process(left);
            self.post_process(right);
            return;
        }

        let points = self.trees.query().points();
        let stat = &mut self.query_stats[qnode];
        for row in begin..end {
            let result = &mut self.q_results[row];
            result.apply_postponed(&stat.postponed);
            if let Some(aux) = &self.series_aux {
                result.density_estimate +=
                    stat.local.evaluate_field(&point_coords(points, row), aux);
            }
            result.normalize(self.mul_constant);
        }
        stat.postponed.reset();
    }
}

/// Estimates the density with a kernel chosen at runtime.
///
/// Without `queries` the density is estimated at the reference points.
///
/// # Examples
///
/// ```
/// use ferreus_kde::{KdeParams, estimate_density, generate_random_points};
/// use ferreus_kde_utils::{KernelParams, KernelType};
///
/// let references = generate_random_points(300, 2, Some(9));
/// let kernel_params = KernelParams::builder(KernelType::Epanechnikov)
///     .bandwidth(0.2)
///     .build();
///
/// let results = estimate_density(references, None, &kernel_params, KdeParams::default())?;
/// assert!(results.density_estimates.iter().all(|&d| d > 0.0));
/// # Ok::<(), ferreus_kde::KdeError>(())
/// ```
pub fn estimate_density(
    references: Mat<f64>,
    queries: Option<Mat<f64>>,
    kernel_params: &KernelParams,
    params: KdeParams,
) -> KdeResult<KdeResults> {
    fn run<K: DensityKernel + KernelFromParams>(
        references: Mat<f64>,
        queries: Option<Mat<f64>>,
        kernel_params: &KernelParams,
        params: KdeParams,
    ) -> KdeResult<KdeResults> {
        let mut builder = FastKde::builder(references, K::from_params(kernel_params), params);
        if let Some(queries) = queries {
            builder = builder.queries(queries);
        }
        Ok(builder.build()?.compute())
    }

    match kernel_params.kernel_type {
        KernelType::Gaussian => run::<GaussianKernel>(references, queries, kernel_params, params),
        KernelType::Epanechnikov => {
            run::<EpanechnikovKernel>(references, queries, kernel_params, params)
        }
    }
}

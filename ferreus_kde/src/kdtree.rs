/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides a midpoint-split KD-tree whose nodes own contiguous blocks of permuted points.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::bound::HRectBound;
use faer::Mat;

/// A node in the KDTree
#[derive(Debug, Clone)]
pub struct Node {
    /// Tight bounding box of the node's points.
    pub bound: HRectBound,
    /// First row of the node's block in the permuted point matrix.
    pub begin: usize,
    /// Number of rows in the block.
    pub count: usize,
    /// Arena indices of the left and right children.
    pub children: Option<(usize, usize)>,
}

impl Node {
    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    #[inline(always)]
    pub fn end(&self) -> usize {
        self.begin + self.count
    }
}

/// The KDTree structure
///
/// Nodes are stored in a flat vector with the root at index 0. Every node
/// owns the rows `begin..begin + count` of [`KDTree::points`], which holds the
/// input points reordered so each subtree is contiguous.
#[derive(Debug)]
pub struct KDTree {
    points: Mat<f64>,
    nodes: Vec<Node>,
    old_from_new: Vec<usize>,
}

impl KDTree {
    /// Constructs a new KDTree from a Mat of points.
    ///
    /// Nodes holding more than `leaf_size` points are split at the midpoint
    /// of their widest side. Nodes whose points all coincide stay leaves.
    pub fn new(nd_array: &Mat<f64>, leaf_size: usize) -> Self {
        let num_points = nd_array.nrows();

        let mut tree = KDTree {
            points: nd_array.clone(),
            nodes: Vec::new(),
            old_from_new: (0..num_points).collect(),
        };

        tree.nodes.push(Node {
            bound: HRectBound::from_rows(&tree.points, 0, num_points),
            begin: 0,
            count: num_points,
            children: None,
        });
        tree.split_node(0, leaf_size.max(1));
        tree
    }

    /// Recursively splits a node and appends its children to the arena.
    fn split_node(&mut self, node_index: usize, leaf_size: usize) {
        let (begin, count) = (self.nodes[node_index].begin, self.nodes[node_index].count);
        if count <= leaf_size {
            return;
        }

        let (split_dim, width) = self.nodes[node_index].bound.widest_dimension();
        if width <= 0.0 {
            return;
        }
        let split_value = self.nodes[node_index].bound.side(split_dim).mid();

        // Partition rows so coordinates below the split value come first
        let mut left = begin;
        let mut right = begin + count;
        while left < right {
            if self.points[(left, split_dim)] < split_value {
                left += 1;
            } else {
                right -= 1;
                self.swap_rows(left, right);
            }
        }

        let left_count = left - begin;
        if left_count == 0 || left_count == count {
            return;
        }

        let left_index = self.nodes.len();
        self.nodes.push(Node {
            bound: HRectBound::from_rows(&self.points, begin, left_count),
            begin,
            count: left_count,
            children: None,
        });
        let right_index = self.nodes.len();
        self.nodes.push(Node {
            bound: HRectBound::from_rows(&self.points, left, count - left_count),
            begin: left,
            count: count - left_count,
            children: None,
        });
        self.nodes[node_index].children = Some((left_index, right_index));

        self.split_node(left_index, leaf_size);
        self.split_node(right_index, leaf_size);
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.points.ncols() {
            let tmp = self.points[(a, j)];
            self.points[(a, j)] = self.points[(b, j)];
            self.points[(b, j)] = tmp;
        }
        self.old_from_new.swap(a, b);
    }

    #[inline(always)]
    pub fn root(&self) -> usize {
        0
    }

    #[inline(always)]
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Points in tree order.
    #[inline(always)]
    pub fn points(&self) -> &Mat<f64> {
        &self.points
    }

    #[inline(always)]
    pub fn dim(&self) -> usize {
        self.points.ncols()
    }

    /// `old_from_new[i]` is the input row stored at tree row `i`.
    #[inline(always)]
    pub fn old_from_new(&self) -> &[usize] {
        &self.old_from_new
    }

    /// Reorders values indexed by tree row back into input row order.
    pub fn to_input_order<T: Clone>(&self, values: &[T]) -> Vec<T> {
        let mut ordered = values.to_vec();
        for (new_index, &old_index) in self.old_from_new.iter().enumerate() {
            ordered[old_index] = values[new_index].clone();
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, d: usize, seed: u64) -> Mat<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Mat::from_fn(n, d, |_, _| rng.random_range(-5.0..5.0))
    }

    fn check_subtree(tree: &KDTree, index: usize, leaf_size: usize) {
        let node = tree.node(index);
        for i in node.begin..node.end() {
            let p: Vec<f64> = (0..tree.dim()).map(|j| tree.points()[(i, j)]).collect();
            assert!(node.bound.contains(&p));
        }

        match node.children {
            None => {
                let all_equal = (node.begin..node.end()).all(|i| {
                    (0..tree.dim()).all(|j| tree.points()[(i, j)] == tree.points()[(node.begin, j)])
                });
                assert!(node.count <= leaf_size || all_equal);
            }
            Some((left, right)) => {
                let (l, r) = (tree.node(left), tree.node(right));
                assert_eq!(l.begin, node.begin);
                assert_eq!(l.end(), r.begin);
                assert_eq!(r.end(), node.end());
                assert!(l.count > 0 && r.count > 0);
                check_subtree(tree, left, leaf_size);
                check_subtree(tree, right, leaf_size);
            }
        }
    }

    #[test]
    fn structure_is_consistent() {
        let points = random_points(500, 3, 7);
        let tree = KDTree::new(&points, 16);

        assert_eq!(tree.node(tree.root()).count, 500);
        assert!(tree.num_nodes() > 1);
        check_subtree(&tree, tree.root(), 16);
    }

    #[test]
    fn permutation_maps_back_to_input() {
        let points = random_points(200, 2, 11);
        let tree = KDTree::new(&points, 5);

        let mut seen = vec![false; 200];
        for (new_index, &old_index) in tree.old_from_new().iter().enumerate() {
            assert!(!seen[old_index]);
            seen[old_index] = true;
            for j in 0..2 {
                assert_eq!(tree.points()[(new_index, j)], points[(old_index, j)]);
            }
        }

        let tree_order: Vec<f64> = (0..200).map(|i| tree.points()[(i, 0)]).collect();
        let input_order = tree.to_input_order(&tree_order);
        for i in 0..200 {
            assert_eq!(input_order[i], points[(i, 0)]);
        }
    }

    #[test]
    fn coincident_points_form_a_leaf() {
        let points = Mat::from_fn(50, 2, |_, j| j as f64);
        let tree = KDTree::new(&points, 4);
        assert_eq!(tree.num_nodes(), 1);
        assert!(tree.node(0).is_leaf());
    }

    #[test]
    fn single_point_tree() {
        let points = faer::mat![[1.0, 2.0, 3.0f64]];
        let tree = KDTree::new(&points, 20);
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(tree.node(0).count, 1);
        assert_eq!(tree.old_from_new(), &[0]);
    }
}

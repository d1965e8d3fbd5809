//! Regression tree

use crate::error::{Result, SpendingError};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision tree node. Children are indices into the tree's node list.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
        gain: f64,
    },
}

/// Split quality measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Reduction in sum of squared errors
    #[default]
    SquaredError,
    /// Friedman's improvement score: n_l·n_r/n · (mean_l − mean_r)²
    FriedmanMse,
}

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::SquaredError => "squared_error",
            Criterion::FriedmanMse => "friedman_mse",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best split found for one node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Regression tree grown to purity unless limited by depth or sample counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Nodes in build order, root first
    nodes: Vec<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Split criterion
    pub criterion: Criterion,
    /// Number of features seen at fit
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create a new regression tree
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::SquaredError,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(SpendingError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(SpendingError::ModelFit(format!(
                "cannot grow a tree on {} samples x {} features",
                n_samples, n_features
            )));
        }

        self.n_features = n_features;

        let indices: Vec<usize> = (0..n_samples).collect();
        let mut nodes = Vec::new();
        self.build_tree(&mut nodes, x, y, indices, 0);
        self.nodes = nodes;

        Ok(self)
    }

    /// Grow the subtree for `indices` and return the index of its root node
    fn build_tree(
        &self,
        nodes: &mut Vec<TreeNode>,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
    ) -> usize {
        let n_samples = indices.len();
        let value = indices.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64;
        let node_idx = nodes.len();
        nodes.push(TreeNode::Leaf { value, n_samples });

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(y, &indices);

        if should_stop {
            return node_idx;
        }

        let Some(best) = self.find_best_split(x, y, &indices) else {
            return node_idx;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, best.feature_idx]] <= best.threshold);

        let left = self.build_tree(nodes, x, y, left_indices, depth + 1);
        let right = self.build_tree(nodes, x, y, right_indices, depth + 1);

        nodes[node_idx] = TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            gain: best.gain,
        };
        node_idx
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Option<SplitCandidate> {
        // Each feature independently finds its best threshold with one sorted sweep
        let per_feature: Vec<Option<SplitCandidate>> = (0..self.n_features)
            .into_par_iter()
            .map(|feature_idx| self.best_split_for_feature(x, y, indices, feature_idx))
            .collect();

        // Ties keep the lowest feature index
        per_feature.into_iter().flatten().fold(None, |best, cand| match best {
            Some(b) if b.gain >= cand.gain => Some(b),
            _ => Some(cand),
        })
    }

    fn best_split_for_feature(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature_idx: usize,
    ) -> Option<SplitCandidate> {
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (x[[i, feature_idx]], y[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let parent_term = total_sum * total_sum / n as f64;

        let mut left_sum = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for k in 0..n - 1 {
            left_sum += pairs[k].1;
            let n_left = k + 1;
            let n_right = n - n_left;

            if pairs[k + 1].0 <= pairs[k].0 {
                continue;
            }
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let (nl, nr) = (n_left as f64, n_right as f64);
            let gain = match self.criterion {
                // Parent SSE minus children SSE; the Σy² terms cancel
                Criterion::SquaredError => {
                    left_sum * left_sum / nl + right_sum * right_sum / nr - parent_term
                }
                Criterion::FriedmanMse => {
                    let diff = left_sum / nl - right_sum / nr;
                    nl * nr * diff * diff / n as f64
                }
            };

            if gain > 0.0 && best.map_or(true, |b| gain > b.gain) {
                let (lo, hi) = (pairs[k].0, pairs[k + 1].0);
                let mut threshold = lo / 2.0 + hi / 2.0;
                if threshold >= hi || !threshold.is_finite() {
                    threshold = lo;
                }
                best = Some(SplitCandidate {
                    feature_idx,
                    threshold,
                    gain,
                });
            }
        }

        best
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.nodes.is_empty() {
            return Err(SpendingError::ModelNotFitted);
        }

        if x.ncols() != self.n_features {
            return Err(SpendingError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|sample| {
                let mut idx = 0;
                loop {
                    match &self.nodes[idx] {
                        TreeNode::Leaf { value, .. } => break *value,
                        TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                            idx = if sample[*feature_idx] <= *threshold { *left } else { *right };
                        }
                    }
                }
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Get tree depth (a lone leaf has depth 1)
    pub fn get_depth(&self) -> usize {
        fn depth(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => {
                    1 + depth(nodes, *left).max(depth(nodes, *right))
                }
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            depth(&self.nodes, 0)
        }
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }
}

fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
    let first = y[indices[0]];
    indices.iter().all(|&i| (y[i] - first).abs() < 1e-10)
}

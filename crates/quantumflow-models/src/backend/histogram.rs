//! Histogram Gradient Boosting
//!
//! Features are bucketed once into at most `max_bins` quantile bins. Trees
//! grow leaf-wise: the leaf with the largest histogram split gain is split
//! next until `max_leaves` is reached or no split improves the loss.
//!
//! Supports the quantile objective. After each tree is grown from pinball
//! gradients, leaf outputs are reset to the α-quantile of the residuals that
//! reach them.

use super::{MIN_SPLIT_GAIN, RegressionBackend, TreeGrower, boost, leaf_weight, split_gain};
use crate::error::Result;
use crate::params::{BoosterParams, Objective};
use crate::tree::{RegressionTree, TreeEnsemble, TreeNode};
use ndarray::{ArrayView1, ArrayView2};

/// Histogram-based, leaf-wise boosted tree regressor
#[derive(Debug, Clone)]
pub struct HistGradientBoosting {
    params: BoosterParams,
}

impl HistGradientBoosting {
    /// Backend name recorded in trained artifacts
    pub const NAME: &'static str = "hist_gbm";

    /// Create a backend whose candidate hyperparameters are `params`
    pub const fn with_params(params: BoosterParams) -> Self {
        Self { params }
    }
}

impl Default for HistGradientBoosting {
    fn default() -> Self {
        Self::with_params(BoosterParams {
            n_estimators: 400,
            learning_rate: 0.05,
            max_depth: None,
            max_leaves: 31,
            min_samples_leaf: 20,
            subsample: 0.9,
            colsample_bytree: 0.8,
            lambda: 0.0,
            max_bins: 255,
            seed: 0,
        })
    }
}

impl RegressionBackend for HistGradientBoosting {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_params(&self) -> BoosterParams {
        self.params.clone()
    }

    fn supports_quantile_objective(&self) -> bool {
        true
    }

    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        target: ArrayView1<'_, f64>,
        params: &BoosterParams,
        objective: Objective,
    ) -> Result<TreeEnsemble> {
        params.validate()?;
        let binned = BinnedFeatures::new(features, params.max_bins);
        let mut grower = HistogramGrower {
            binned: &binned,
            params,
        };
        boost(Self::NAME, features, target, params, objective, &mut grower)
    }
}

/// Upper bin edges for one column: `x <= edges[b]` falls in bin `b` or lower
pub(crate) fn bin_edges(column: ArrayView1<'_, f64>, max_bins: usize) -> Vec<f64> {
    let mut values: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
    values.sort_by(f64::total_cmp);

    let mut unique = values.clone();
    unique.dedup();
    if unique.len() <= 1 {
        return Vec::new();
    }

    if unique.len() <= max_bins {
        return unique.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    }

    let max = unique[unique.len() - 1];
    let mut edges: Vec<f64> = Vec::with_capacity(max_bins - 1);
    for j in 1..max_bins {
        let candidate = values[j * values.len() / max_bins];
        let increasing = edges.last().is_none_or(|last| candidate > *last);
        if increasing && candidate < max {
            edges.push(candidate);
        }
    }
    edges
}

/// Bin of `value` given upper `edges`; non-finite values go to the last bin
pub(crate) fn bin_index(edges: &[f64], value: f64) -> u16 {
    if value.is_nan() {
        return edges.len() as u16;
    }
    edges.partition_point(|e| *e < value) as u16
}

/// Column-major binned copy of the feature matrix
#[derive(Debug)]
struct BinnedFeatures {
    edges: Vec<Vec<f64>>,
    bins: Vec<Vec<u16>>,
}

impl BinnedFeatures {
    fn new(features: ArrayView2<'_, f64>, max_bins: usize) -> Self {
        let mut edges = Vec::with_capacity(features.ncols());
        let mut bins = Vec::with_capacity(features.ncols());
        for column in features.columns() {
            let column_edges = bin_edges(column, max_bins);
            bins.push(column.iter().map(|&v| bin_index(&column_edges, v)).collect());
            edges.push(column_edges);
        }
        Self { edges, bins }
    }

    fn n_bins(&self, feature: usize) -> usize {
        self.edges[feature].len() + 1
    }
}

#[derive(Debug, Clone, Copy)]
struct HistogramSplit {
    feature: usize,
    bin: u16,
    threshold: f64,
    gain: f64,
}

#[derive(Debug)]
struct OpenLeaf {
    node: usize,
    rows: Vec<usize>,
    depth: usize,
    split: HistogramSplit,
}

struct HistogramGrower<'a> {
    binned: &'a BinnedFeatures,
    params: &'a BoosterParams,
}

impl HistogramGrower<'_> {
    fn can_split(&self, rows: &[usize], depth: usize) -> bool {
        let depth_ok = self.params.max_depth.is_none_or(|max| depth < max);
        depth_ok && rows.len() >= 2 * self.params.min_samples_leaf
    }

    fn best_split(
        &self,
        rows: &[usize],
        features: &[usize],
        gradients: &[f64],
        hessians: &[f64],
    ) -> Option<HistogramSplit> {
        let min_leaf = self.params.min_samples_leaf;
        let lambda = self.params.lambda;
        let mut best: Option<HistogramSplit> = None;

        for &feature in features {
            let n_bins = self.binned.n_bins(feature);
            if n_bins < 2 {
                continue;
            }
            let column = &self.binned.bins[feature];
            let mut grad_hist = vec![0.0; n_bins];
            let mut hess_hist = vec![0.0; n_bins];
            let mut count_hist = vec![0usize; n_bins];
            for &r in rows {
                let b = column[r] as usize;
                grad_hist[b] += gradients[r];
                hess_hist[b] += hessians[r];
                count_hist[b] += 1;
            }

            let total_grad: f64 = grad_hist.iter().sum();
            let total_hess: f64 = hess_hist.iter().sum();
            let (mut left_grad, mut left_hess, mut left_count) = (0.0, 0.0, 0usize);

            for b in 0..n_bins - 1 {
                left_grad += grad_hist[b];
                left_hess += hess_hist[b];
                left_count += count_hist[b];
                let right_count = rows.len() - left_count;
                if left_count < min_leaf {
                    continue;
                }
                if right_count < min_leaf {
                    break;
                }
                let gain = split_gain(
                    left_grad,
                    left_hess,
                    total_grad - left_grad,
                    total_hess - left_hess,
                    lambda,
                );
                if gain > MIN_SPLIT_GAIN && best.is_none_or(|s| gain > s.gain) {
                    best = Some(HistogramSplit {
                        feature,
                        bin: b as u16,
                        threshold: self.binned.edges[feature][b],
                        gain,
                    });
                }
            }
        }
        best
    }

    fn leaf_value(&self, rows: &[usize], gradients: &[f64], hessians: &[f64]) -> f64 {
        let g: f64 = rows.iter().map(|&r| gradients[r]).sum();
        let h: f64 = rows.iter().map(|&r| hessians[r]).sum();
        leaf_weight(g, h, self.params.lambda)
    }
}

impl TreeGrower for HistogramGrower<'_> {
    fn grow(
        &mut self,
        rows: &[usize],
        features: &[usize],
        gradients: &[f64],
        hessians: &[f64],
    ) -> RegressionTree {
        let mut nodes = vec![TreeNode::Leaf {
            value: self.leaf_value(rows, gradients, hessians),
        }];
        let mut open: Vec<OpenLeaf> = Vec::new();
        if self.can_split(rows, 0) {
            if let Some(split) = self.best_split(rows, features, gradients, hessians) {
                open.push(OpenLeaf {
                    node: 0,
                    rows: rows.to_vec(),
                    depth: 0,
                    split,
                });
            }
        }

        let mut n_leaves = 1;
        while n_leaves < self.params.max_leaves && !open.is_empty() {
            // Largest gain first; earliest opened wins ties
            let mut pick = 0;
            for (i, leaf) in open.iter().enumerate() {
                if leaf.split.gain > open[pick].split.gain {
                    pick = i;
                }
            }
            let leaf = open.remove(pick);
            let split = leaf.split;
            let column = &self.binned.bins[split.feature];
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                leaf.rows.iter().partition(|&&r| column[r] <= split.bin);

            let left = nodes.len();
            nodes.push(TreeNode::Leaf {
                value: self.leaf_value(&left_rows, gradients, hessians),
            });
            let right = nodes.len();
            nodes.push(TreeNode::Leaf {
                value: self.leaf_value(&right_rows, gradients, hessians),
            });
            nodes[leaf.node] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
                gain: split.gain,
            };
            n_leaves += 1;

            for (node, child_rows) in [(left, left_rows), (right, right_rows)] {
                if !self.can_split(&child_rows, leaf.depth + 1) {
                    continue;
                }
                if let Some(split) = self.best_split(&child_rows, features, gradients, hessians) {
                    open.push(OpenLeaf {
                        node,
                        rows: child_rows,
                        depth: leaf.depth + 1,
                        split,
                    });
                }
            }
        }

        RegressionTree::from_nodes(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::rmse;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2};

    fn small_params() -> BoosterParams {
        BoosterParams {
            n_estimators: 60,
            learning_rate: 0.2,
            max_depth: None,
            max_leaves: 8,
            min_samples_leaf: 2,
            subsample: 1.0,
            colsample_bytree: 1.0,
            lambda: 0.0,
            max_bins: 255,
            seed: 3,
        }
    }

    /// y = 10 for x < 50, 30 otherwise, plus a second noise-free feature
    fn step_data() -> (Array2<f64>, Array1<f64>) {
        let n = 100;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 7) as f64 });
        let y = Array1::from_shape_fn(n, |i| if i < 50 { 10.0 } else { 30.0 });
        (x, y)
    }

    #[test]
    fn test_bin_edges_small_cardinality() {
        let column = ndarray::array![3.0, 1.0, 2.0, 2.0];
        assert_eq!(bin_edges(column.view(), 10), vec![1.5, 2.5]);
    }

    #[test]
    fn test_bin_edges_constant_column() {
        let column = ndarray::array![4.0, 4.0, 4.0];
        assert!(bin_edges(column.view(), 10).is_empty());
    }

    #[test]
    fn test_bin_edges_capped() {
        let column = Array1::from_shape_fn(1000, |i| i as f64);
        let edges = bin_edges(column.view(), 16);
        assert!(edges.len() <= 15);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bin_index() {
        let edges = [1.5, 2.5];
        assert_eq!(bin_index(&edges, 1.0), 0);
        assert_eq!(bin_index(&edges, 1.5), 0);
        assert_eq!(bin_index(&edges, 2.0), 1);
        assert_eq!(bin_index(&edges, 9.0), 2);
        assert_eq!(bin_index(&edges, f64::NAN), 2);
    }

    #[test]
    fn test_fits_step_function() {
        let (x, y) = step_data();
        let backend = HistGradientBoosting::with_params(small_params());
        let model = backend
            .fit(x.view(), y.view(), &small_params(), Objective::SquaredError)
            .unwrap();
        let predicted = model.predict(x.view()).unwrap();
        assert!(rmse(y.view(), predicted.view()).unwrap() < 0.5);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = step_data();
        let params = BoosterParams {
            subsample: 0.7,
            colsample_bytree: 0.5,
            ..small_params()
        };
        let backend = HistGradientBoosting::default();
        let a = backend
            .fit(x.view(), y.view(), &params, Objective::SquaredError)
            .unwrap();
        let b = backend
            .fit(x.view(), y.view(), &params, Objective::SquaredError)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_quantile_objective_orders_predictions() {
        let n = 200;
        // Same feature value everywhere: the model can only learn the target distribution
        let x = Array2::<f64>::zeros((n, 1));
        let y = Array1::from_shape_fn(n, |i| i as f64);
        let backend = HistGradientBoosting::default();

        let low = backend
            .fit(x.view(), y.view(), &small_params(), Objective::Quantile { alpha: 0.5 })
            .unwrap();
        let high = backend
            .fit(x.view(), y.view(), &small_params(), Objective::Quantile { alpha: 0.9 })
            .unwrap();

        let row = x.row(0);
        assert_relative_eq!(low.predict_row(row), 99.5, epsilon = 1.0);
        assert_relative_eq!(high.predict_row(row), 179.1, epsilon = 1.0);
    }

    #[test]
    fn test_empty_input_fails() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        let backend = HistGradientBoosting::default();
        assert!(
            backend
                .fit(x.view(), y.view(), &small_params(), Objective::SquaredError)
                .is_err()
        );
    }
}

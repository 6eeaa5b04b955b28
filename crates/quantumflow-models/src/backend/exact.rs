//! Exact Greedy Gradient Boosting
//!
//! Every distinct feature value is a split candidate. Trees grow depth-wise:
//! all leaves at one depth are split before moving deeper, up to `max_depth`.
//! Gains are second-order with L2 regularisation `lambda` on leaf weights.
//!
//! Only the squared-error objective is supported.

use super::{MIN_SPLIT_GAIN, RegressionBackend, TreeGrower, boost, leaf_weight, split_gain};
use crate::error::{ModelError, Result};
use crate::params::{BoosterParams, Objective};
use crate::tree::{RegressionTree, TreeEnsemble, TreeNode};
use ndarray::{ArrayView1, ArrayView2};
use std::collections::VecDeque;

/// Exact greedy, depth-wise boosted tree regressor
#[derive(Debug, Clone)]
pub struct ExactGradientBoosting {
    params: BoosterParams,
}

impl ExactGradientBoosting {
    /// Backend name recorded in trained artifacts
    pub const NAME: &'static str = "exact_gbm";

    /// Create a backend whose candidate hyperparameters are `params`
    pub const fn with_params(params: BoosterParams) -> Self {
        Self { params }
    }
}

impl Default for ExactGradientBoosting {
    fn default() -> Self {
        Self::with_params(BoosterParams {
            n_estimators: 500,
            learning_rate: 0.05,
            max_depth: Some(6),
            max_leaves: 255,
            min_samples_leaf: 1,
            subsample: 0.9,
            colsample_bytree: 0.8,
            lambda: 1.0,
            max_bins: 255,
            seed: 0,
        })
    }
}

impl RegressionBackend for ExactGradientBoosting {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_params(&self) -> BoosterParams {
        self.params.clone()
    }

    fn supports_quantile_objective(&self) -> bool {
        false
    }

    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        target: ArrayView1<'_, f64>,
        params: &BoosterParams,
        objective: Objective,
    ) -> Result<TreeEnsemble> {
        if objective != Objective::SquaredError {
            return Err(ModelError::UnsupportedObjective {
                backend: Self::NAME.to_string(),
                objective: objective.to_string(),
            });
        }
        let mut grower = ExactGrower { features, params };
        boost(Self::NAME, features, target, params, objective, &mut grower)
    }
}

#[derive(Debug, Clone, Copy)]
struct ExactSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct ExactGrower<'f, 'p> {
    features: ArrayView2<'f, f64>,
    params: &'p BoosterParams,
}

impl ExactGrower<'_, '_> {
    fn best_split(
        &self,
        rows: &[usize],
        features: &[usize],
        gradients: &[f64],
        hessians: &[f64],
    ) -> Option<ExactSplit> {
        if rows.len() < 2 {
            return None;
        }
        let min_leaf = self.params.min_samples_leaf;
        let lambda = self.params.lambda;
        let total_grad: f64 = rows.iter().map(|&r| gradients[r]).sum();
        let total_hess: f64 = rows.iter().map(|&r| hessians[r]).sum();
        let mut best: Option<ExactSplit> = None;

        for &feature in features {
            let column = self.features.column(feature);
            let mut order: Vec<usize> = rows.to_vec();
            order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

            let (mut left_grad, mut left_hess) = (0.0, 0.0);
            for i in 0..order.len() - 1 {
                let r = order[i];
                left_grad += gradients[r];
                left_hess += hessians[r];

                let current = column[r];
                let next = column[order[i + 1]];
                let separable = current < next && next.is_finite();
                if !separable {
                    continue;
                }
                let left_count = i + 1;
                if left_count < min_leaf {
                    continue;
                }
                if order.len() - left_count < min_leaf {
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
                    let midpoint = (current + next) / 2.0;
                    let threshold = if midpoint < next { midpoint } else { current };
                    best = Some(ExactSplit {
                        feature,
                        threshold,
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

impl TreeGrower for ExactGrower<'_, '_> {
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
        let mut queue: VecDeque<(usize, Vec<usize>, usize)> = VecDeque::new();
        queue.push_back((0, rows.to_vec(), 0));
        let mut n_leaves = 1;

        while let Some((node, node_rows, depth)) = queue.pop_front() {
            if n_leaves >= self.params.max_leaves {
                break;
            }
            let depth_ok = self.params.max_depth.is_none_or(|max| depth < max);
            if !depth_ok || node_rows.len() < 2 * self.params.min_samples_leaf {
                continue;
            }
            let Some(split) = self.best_split(&node_rows, features, gradients, hessians) else {
                continue;
            };

            let column = self.features.column(split.feature);
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                node_rows.iter().partition(|&&r| column[r] <= split.threshold);

            let left = nodes.len();
            nodes.push(TreeNode::Leaf {
                value: self.leaf_value(&left_rows, gradients, hessians),
            });
            let right = nodes.len();
            nodes.push(TreeNode::Leaf {
                value: self.leaf_value(&right_rows, gradients, hessians),
            });
            nodes[node] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
                gain: split.gain,
            };
            n_leaves += 1;

            queue.push_back((left, left_rows, depth + 1));
            queue.push_back((right, right_rows, depth + 1));
        }

        RegressionTree::from_nodes(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::rmse;
    use ndarray::{Array1, Array2, array};

    fn small_params() -> BoosterParams {
        BoosterParams {
            n_estimators: 80,
            learning_rate: 0.3,
            max_depth: Some(3),
            max_leaves: 255,
            min_samples_leaf: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            lambda: 0.0,
            max_bins: 255,
            seed: 11,
        }
    }

    #[test]
    fn test_fits_linear_trend() {
        let n = 60;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(n, |i| 2.0 * i as f64 + 5.0);
        let backend = ExactGradientBoosting::default();
        let model = backend
            .fit(x.view(), y.view(), &small_params(), Objective::SquaredError)
            .unwrap();
        let predicted = model.predict(x.view()).unwrap();
        assert!(rmse(y.view(), predicted.view()).unwrap() < 5.0);
    }

    #[test]
    fn test_single_split_threshold() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 0.0, 10.0, 10.0];
        let params = BoosterParams {
            n_estimators: 1,
            learning_rate: 1.0,
            max_depth: Some(1),
            ..small_params()
        };
        let model = ExactGradientBoosting::default()
            .fit(x.view(), y.view(), &params, Objective::SquaredError)
            .unwrap();
        let tree = &model.trees()[0];
        match tree.nodes()[0] {
            TreeNode::Split {
                feature, threshold, ..
            } => {
                assert_eq!(feature, 0);
                assert!((threshold - 2.5).abs() < 1e-12);
            }
            TreeNode::Leaf { .. } => panic!("expected a split at the root"),
        }
        let predicted = model.predict(x.view()).unwrap();
        assert_eq!(predicted.to_vec(), vec![0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_depth_limit() {
        let n = 64;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(n, |i| (i * i) as f64);
        let params = BoosterParams {
            n_estimators: 3,
            max_depth: Some(2),
            ..small_params()
        };
        let model = ExactGradientBoosting::default()
            .fit(x.view(), y.view(), &params, Objective::SquaredError)
            .unwrap();
        assert!(model.trees().iter().all(|t| t.n_leaves() <= 4));
    }

    #[test]
    fn test_rejects_quantile_objective() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];
        let err = ExactGradientBoosting::default()
            .fit(
                x.view(),
                y.view(),
                &small_params(),
                Objective::Quantile { alpha: 0.9 },
            )
            .unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedObjective { .. }));
    }
}

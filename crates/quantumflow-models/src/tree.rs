//! Regression trees and boosted ensembles
//!
//! Both backends emit the same serializable [`TreeEnsemble`], so a trained
//! artifact does not depend on which backend produced it.
//!
//! Prediction for a row `x`:
//! y(x) = base_score + learning_rate * Σ_t tree_t(x)

use crate::error::{ModelError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// A node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// Terminal node with an output value
    Leaf {
        /// Output before shrinkage
        value: f64,
    },
    /// Internal node routing `x[feature] <= threshold` left
    Split {
        /// Feature column index
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Index of the left child
        left: usize,
        /// Index of the right child
        right: usize,
        /// Loss reduction achieved by the split
        gain: f64,
    },
}

/// Binary regression tree stored as a flat node list rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Tree consisting of a single leaf
    pub fn leaf(value: f64) -> Self {
        Self {
            nodes: vec![TreeNode::Leaf { value }],
        }
    }

    pub(crate) const fn from_nodes(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    /// All nodes, root first
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Number of leaves
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Index of the leaf reached by `row`
    pub fn leaf_index(&self, row: ArrayView1<'_, f64>) -> usize {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                TreeNode::Leaf { .. } => return index,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    index = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    /// Output of the leaf reached by `row`
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        match self.nodes[self.leaf_index(row)] {
            TreeNode::Leaf { value } => value,
            TreeNode::Split { .. } => 0.0,
        }
    }

    /// Overwrite the value of the leaf at `index`
    pub(crate) fn set_leaf_value(&mut self, index: usize, new_value: f64) {
        if let Some(TreeNode::Leaf { value }) = self.nodes.get_mut(index) {
            *value = new_value;
        }
    }

    fn max_feature_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }
}

/// Additive ensemble of regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    base_score: f64,
    learning_rate: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl TreeEnsemble {
    /// Create an ensemble, checking that every split refers to a known feature
    pub fn new(
        base_score: f64,
        learning_rate: f64,
        n_features: usize,
        trees: Vec<RegressionTree>,
    ) -> Result<Self> {
        if let Some(max) = trees.iter().filter_map(RegressionTree::max_feature_index).max() {
            if max >= n_features {
                return Err(ModelError::DimensionMismatch {
                    expected: n_features,
                    actual: max + 1,
                });
            }
        }
        Ok(Self {
            base_score,
            learning_rate,
            n_features,
            trees,
        })
    }

    /// Constant prediction before any tree
    pub const fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Shrinkage applied to every tree
    pub const fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of input features
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Fitted trees in boosting order
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Predict a single row
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.base_score
            + self.learning_rate * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }

    /// Predict every row of `features` (rows x n_features)
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if features.ncols() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                actual: features.ncols(),
            });
        }
        Ok(features.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }

    /// Total split gain per feature, normalised to sum to 1
    ///
    /// All zeros when no tree ever split.
    pub fn feature_importances(&self) -> Array1<f64> {
        let mut importances = Array1::<f64>::zeros(self.n_features);
        for node in self.trees.iter().flat_map(|t| t.nodes.iter()) {
            if let TreeNode::Split { feature, gain, .. } = node {
                importances[*feature] += gain.max(0.0);
            }
        }
        let total = importances.sum();
        if total > 0.0 {
            importances /= total;
        }
        importances
    }
}

//! Regression backends
//!
//! A backend is a capability set: it fits a [`TreeEnsemble`] from a feature
//! matrix and target, declares its default hyperparameters, and reports
//! whether it can train a quantile-loss objective. Prediction lives on the
//! fitted ensemble.
//!
//! Both backends share one gradient boosting loop and differ only in
//! how a single tree is grown from gradients.

#[cfg(feature = "exact-gbm")]
pub mod exact;
#[cfg(feature = "hist-gbm")]
pub mod histogram;

#[cfg(feature = "exact-gbm")]
pub use exact::ExactGradientBoosting;
#[cfg(feature = "hist-gbm")]
pub use histogram::HistGradientBoosting;

use crate::error::{ModelError, Result};
use crate::params::{BoosterParams, Objective, quantile_of};
use crate::tree::{RegressionTree, TreeEnsemble};
use ndarray::{ArrayView1, ArrayView2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Trait for regression backends
pub trait RegressionBackend: Debug + Send + Sync {
    /// Unique backend name, recorded in trained artifacts
    fn name(&self) -> &'static str;

    /// Hyperparameters used when the backend is a selection candidate
    fn default_params(&self) -> BoosterParams;

    /// Whether [`Objective::Quantile`] can be trained
    fn supports_quantile_objective(&self) -> bool;

    /// Fit an ensemble on `features` (rows x columns) and `target`
    fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        target: ArrayView1<'_, f64>,
        params: &BoosterParams,
        objective: Objective,
    ) -> Result<TreeEnsemble>;
}

/// Grows one tree from per-row gradients
pub(crate) trait TreeGrower {
    fn grow(
        &mut self,
        rows: &[usize],
        features: &[usize],
        gradients: &[f64],
        hessians: &[f64],
    ) -> RegressionTree;
}

/// Loss reduction of splitting (G, H) into left and right children
pub(crate) fn split_gain(
    left_grad: f64,
    left_hess: f64,
    right_grad: f64,
    right_hess: f64,
    lambda: f64,
) -> f64 {
    let score = |g: f64, h: f64| g * g / (h + lambda);
    score(left_grad, left_hess) + score(right_grad, right_hess)
        - score(left_grad + right_grad, left_hess + right_hess)
}

/// Optimal leaf weight for gradient sum `g` and hessian sum `h`
pub(crate) fn leaf_weight(g: f64, h: f64, lambda: f64) -> f64 {
    let denominator = h + lambda;
    if denominator > 0.0 { -g / denominator } else { 0.0 }
}

/// Splits whose gain does not exceed this are not taken
pub(crate) const MIN_SPLIT_GAIN: f64 = 1e-12;

fn check_inputs(
    backend: &str,
    features: ArrayView2<'_, f64>,
    target: ArrayView1<'_, f64>,
) -> Result<()> {
    if features.nrows() != target.len() {
        return Err(ModelError::DimensionMismatch {
            expected: features.nrows(),
            actual: target.len(),
        });
    }
    if features.nrows() == 0 {
        return Err(ModelError::fit(backend, "no training rows"));
    }
    if features.ncols() == 0 {
        return Err(ModelError::fit(backend, "no feature columns"));
    }
    if target.iter().any(|y| !y.is_finite()) {
        return Err(ModelError::fit(backend, "target contains non-finite values"));
    }
    Ok(())
}

/// Sorted sample of `fraction * n` indices out of `0..n` (at least one)
fn sample_indices(rng: &mut StdRng, n: usize, fraction: f64) -> Vec<usize> {
    if fraction >= 1.0 || n <= 1 {
        return (0..n).collect();
    }
    let amount = ((n as f64 * fraction).round() as usize).clamp(1, n);
    let mut picked = rand::seq::index::sample(rng, n, amount).into_vec();
    picked.sort_unstable();
    picked
}

/// Reset every leaf to the `alpha` quantile of the residuals routed to it
fn renew_quantile_leaves(
    tree: &mut RegressionTree,
    features: ArrayView2<'_, f64>,
    target: &[f64],
    predictions: &[f64],
    rows: &[usize],
    alpha: f64,
) {
    let mut residuals: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for &r in rows {
        let leaf = tree.leaf_index(features.row(r));
        residuals
            .entry(leaf)
            .or_default()
            .push(target[r] - predictions[r]);
    }
    for (leaf, values) in residuals {
        tree.set_leaf_value(leaf, quantile_of(values, alpha));
    }
}

/// Gradient boosting loop shared by every backend
pub(crate) fn boost<G: TreeGrower>(
    backend: &str,
    features: ArrayView2<'_, f64>,
    target: ArrayView1<'_, f64>,
    params: &BoosterParams,
    objective: Objective,
    grower: &mut G,
) -> Result<TreeEnsemble> {
    params.validate()?;
    objective.validate()?;
    check_inputs(backend, features, target)?;

    let n_rows = features.nrows();
    let target: Vec<f64> = target.to_vec();
    let base_score = objective.initial_prediction(&target);
    let mut predictions = vec![base_score; n_rows];
    let mut gradients = vec![0.0; n_rows];
    let hessians = vec![objective.hessian(); n_rows];
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut trees = Vec::with_capacity(params.n_estimators);

    for _ in 0..params.n_estimators {
        for (g, (y, p)) in gradients.iter_mut().zip(target.iter().zip(&predictions)) {
            *g = objective.gradient(*y, *p);
        }

        let rows = sample_indices(&mut rng, n_rows, params.subsample);
        let columns = sample_indices(&mut rng, features.ncols(), params.colsample_bytree);
        let mut tree = grower.grow(&rows, &columns, &gradients, &hessians);

        if let Objective::Quantile { alpha } = objective {
            renew_quantile_leaves(&mut tree, features, &target, &predictions, &rows, alpha);
        }

        for (p, row) in predictions.iter_mut().zip(features.rows()) {
            *p += params.learning_rate * tree.predict_row(row);
        }
        trees.push(tree);
    }

    TreeEnsemble::new(base_score, params.learning_rate, features.ncols(), trees)
}

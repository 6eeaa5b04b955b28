//! Model selection
//!
//! Candidates are scored with blocked cross-validation on the row-ordered
//! feature matrix. The candidate with the lowest mean validation RMSE wins;
//! ties go to the earliest candidate in registry order. The winner is refit
//! on every row, and when its backend supports the quantile objective one
//! extra model per configured quantile level is trained.

use crate::backend::RegressionBackend;
use crate::cv::{BlockedSplit, blocked_cv_slices, min_rows_for_splits};
use crate::error::{ModelError, Result};
use crate::matrix::FeatureMatrix;
use crate::metrics::rmse;
use crate::params::{BoosterParams, Objective};
use crate::registry::{BackendRegistry, ModelSpec};
use crate::trained::{QuantileModel, TrainedModel};
use ndarray::{ArrayView1, ArrayView2, Axis, Slice};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Quantile levels trained alongside the base model
pub const DEFAULT_QUANTILES: [f64; 4] = [0.5, 0.8, 0.9, 0.95];

/// Configuration for [`ModelSelector`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Number of blocked cross-validation splits
    pub n_splits: usize,
    /// Quantile levels for auxiliary models
    pub quantiles: Vec<f64>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            n_splits: 3,
            quantiles: DEFAULT_QUANTILES.to_vec(),
        }
    }
}

impl SelectorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.n_splits == 0 {
            return Err(ModelError::InvalidParameter(
                "n_splits must be at least 1".to_string(),
            ));
        }
        for &level in &self.quantiles {
            Objective::Quantile { alpha: level }.validate()?;
        }
        Ok(())
    }
}

/// Cross-validation score of one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Candidate backend and parameters
    pub spec: ModelSpec,
    /// Validation RMSE per split
    pub fold_rmse: Vec<f64>,
    /// Mean of `fold_rmse`
    pub mean_rmse: f64,
}

/// Scores of every candidate in enumeration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvReport {
    /// Candidate scores
    pub candidates: Vec<CandidateScore>,
}

impl CvReport {
    /// Index of the lowest mean RMSE; ties keep the earliest candidate
    pub fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, candidate) in self.candidates.iter().enumerate() {
            let better = match best {
                None => true,
                Some(b) => {
                    let current = self.candidates[b].mean_rmse;
                    current.is_nan() || candidate.mean_rmse < current
                }
            };
            if better {
                best = Some(i);
            }
        }
        best
    }

    /// Highest-ranked candidate
    pub fn best(&self) -> Option<&CandidateScore> {
        self.best_index().map(|i| &self.candidates[i])
    }
}

/// Chooses among registered backends and trains the final artifact
#[derive(Debug, Clone)]
pub struct ModelSelector {
    registry: BackendRegistry,
    config: SelectorConfig,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new(BackendRegistry::global().clone(), SelectorConfig::default())
    }
}

impl ModelSelector {
    /// Create a selector over `registry`
    pub const fn new(registry: BackendRegistry, config: SelectorConfig) -> Self {
        Self { registry, config }
    }

    /// Selector over the process-wide registry
    pub fn with_config(config: SelectorConfig) -> Self {
        Self::new(BackendRegistry::global().clone(), config)
    }

    /// Selector configuration
    pub const fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Candidate backends
    pub const fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Blocked cross-validation scores for every candidate.
    ///
    /// Rows must be in chronological order, as produced by the feature
    /// builder; blocks are cut from row positions.
    pub fn evaluate(&self, matrix: &FeatureMatrix) -> Result<CvReport> {
        self.config.validate()?;
        if self.registry.is_empty() {
            return Err(ModelError::BackendUnavailable);
        }
        let target = require_target(matrix)?;
        let features = matrix.features().view();

        let n = matrix.n_rows();
        let required = min_rows_for_splits(self.config.n_splits);
        if n < required {
            return Err(ModelError::InsufficientData {
                required,
                actual: n,
            });
        }
        let splits = blocked_cv_slices(n, self.config.n_splits);

        let mut candidates = Vec::with_capacity(self.registry.len());
        for backend in self.registry.backends() {
            let spec = ModelSpec {
                name: backend.name().to_string(),
                params: backend.default_params(),
            };
            let mut fold_rmse = Vec::with_capacity(splits.len());
            for (i, split) in splits.iter().enumerate() {
                let score =
                    score_split(backend.as_ref(), &spec.params, features, target, split)?;
                debug!(
                    candidate = %spec.name,
                    split = i,
                    rmse = score,
                    "Scored validation block"
                );
                fold_rmse.push(score);
            }
            let mean_rmse = fold_rmse.iter().sum::<f64>() / fold_rmse.len() as f64;
            debug!(candidate = %spec.name, mean_rmse, "Candidate evaluated");
            candidates.push(CandidateScore {
                spec,
                fold_rmse,
                mean_rmse,
            });
        }
        Ok(CvReport { candidates })
    }

    /// Choose a backend, refit it on every row and train quantile models
    pub fn select_and_train(&self, matrix: &FeatureMatrix) -> Result<TrainedModel> {
        self.config.validate()?;
        let (backend, params) = match self.registry.backends() {
            [] => return Err(ModelError::BackendUnavailable),
            [only] => {
                debug!(candidate = only.name(), "Single candidate, skipping cross-validation");
                (Arc::clone(only), only.default_params())
            }
            _ => {
                let report = self.evaluate(matrix)?;
                let best = report.best().ok_or(ModelError::BackendUnavailable)?;
                info!(
                    selected = %best.spec.name,
                    mean_rmse = best.mean_rmse,
                    "Selected model"
                );
                let backend = self.registry.require(&best.spec.name)?;
                (Arc::clone(backend), best.spec.params.clone())
            }
        };

        let target = require_target(matrix)?;
        let features = matrix.features().view();
        let base = backend.fit(features, target, &params, Objective::SquaredError)?;

        let mut quantile_models = Vec::new();
        if backend.supports_quantile_objective() {
            for &level in &self.config.quantiles {
                let objective = Objective::Quantile { alpha: level };
                let model = backend.fit(features, target, &params, objective)?;
                quantile_models.push(QuantileModel { level, model });
            }
        }

        info!(
            model = backend.name(),
            rows = matrix.n_rows(),
            features = matrix.names().len(),
            quantiles = quantile_models.len(),
            "Trained model"
        );
        TrainedModel::new(
            backend.name(),
            params,
            base,
            matrix.names().to_vec(),
            quantile_models,
        )
    }

    /// Extract `features` and `target` from a feature table, then
    /// [`Self::select_and_train`]
    pub fn select_and_train_frame(
        &self,
        df: &DataFrame,
        features: &[String],
        target: &str,
    ) -> Result<TrainedModel> {
        let matrix = FeatureMatrix::from_frame(df, features, Some(target))?;
        self.select_and_train(&matrix)
    }
}

fn require_target(matrix: &FeatureMatrix) -> Result<ArrayView1<'_, f64>> {
    matrix
        .target()
        .map(|t| t.view())
        .ok_or_else(|| ModelError::InvalidParameter("feature matrix has no target".to_string()))
}

fn score_split(
    backend: &dyn RegressionBackend,
    params: &BoosterParams,
    features: ArrayView2<'_, f64>,
    target: ArrayView1<'_, f64>,
    split: &BlockedSplit,
) -> Result<f64> {
    let train = Slice::from(split.train.clone());
    let validation = Slice::from(split.validation.clone());
    let model = backend.fit(
        features.slice_axis(Axis(0), train),
        target.slice_axis(Axis(0), train),
        params,
        Objective::SquaredError,
    )?;
    let predicted = model.predict(features.slice_axis(Axis(0), validation))?;
    rmse(target.slice_axis(Axis(0), validation), predicted.view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeEnsemble;

    fn score(name: &str, mean_rmse: f64) -> CandidateScore {
        CandidateScore {
            spec: ModelSpec {
                name: name.to_string(),
                params: BoosterParams::default(),
            },
            fold_rmse: vec![mean_rmse],
            mean_rmse,
        }
    }

    #[test]
    fn test_best_breaks_ties_by_order() {
        let report = CvReport {
            candidates: vec![score("a", 2.0), score("b", 1.0), score("c", 1.0)],
        };
        assert_eq!(report.best().unwrap().spec.name, "b");
    }

    #[test]
    fn test_best_skips_nan() {
        let report = CvReport {
            candidates: vec![score("a", f64::NAN), score("b", 3.0)],
        };
        assert_eq!(report.best_index(), Some(1));
    }

    #[test]
    fn test_invalid_config() {
        let config = SelectorConfig {
            n_splits: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = SelectorConfig {
            quantiles: vec![1.2],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_backend_is_fatal() {
        let selector = ModelSelector::new(BackendRegistry::default(), SelectorConfig::default());
        let matrix = FeatureMatrix::new(
            vec!["x".to_string()],
            ndarray::Array2::zeros((10, 1)),
            Some(ndarray::Array1::zeros(10)),
        )
        .unwrap();
        assert!(matches!(
            selector.select_and_train(&matrix),
            Err(ModelError::BackendUnavailable)
        ));
        assert!(matches!(
            selector.evaluate(&matrix),
            Err(ModelError::BackendUnavailable)
        ));
    }

    /// Backend whose fit always fails
    #[derive(Debug)]
    struct Broken;

    impl RegressionBackend for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn default_params(&self) -> BoosterParams {
            BoosterParams::default()
        }

        fn supports_quantile_objective(&self) -> bool {
            false
        }

        fn fit(
            &self,
            _features: ArrayView2<'_, f64>,
            _target: ArrayView1<'_, f64>,
            _params: &BoosterParams,
            _objective: Objective,
        ) -> Result<TreeEnsemble> {
            Err(ModelError::fit("broken", "always fails"))
        }
    }

    #[cfg(feature = "hist-gbm")]
    #[test]
    fn test_fit_failure_aborts_selection() {
        let backends: Vec<Arc<dyn RegressionBackend>> = vec![
            Arc::new(crate::backend::HistGradientBoosting::default()),
            Arc::new(Broken),
        ];
        let registry = BackendRegistry::from_backends(backends);
        let selector = ModelSelector::new(registry, SelectorConfig::default());
        let matrix = FeatureMatrix::new(
            vec!["x".to_string()],
            ndarray::Array2::from_shape_fn((40, 1), |(i, _)| i as f64),
            Some(ndarray::Array1::from_shape_fn(40, |i| i as f64)),
        )
        .unwrap();
        let err = selector.select_and_train(&matrix).unwrap_err();
        assert!(matches!(err, ModelError::Fit { .. }));
    }
}

//! Trained model artifact

use crate::error::{ModelError, Result};
use crate::params::BoosterParams;
use crate::tree::TreeEnsemble;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Quantile regressor trained with pinball loss at `level`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileModel {
    /// Quantile level in (0, 1)
    pub level: f64,
    /// Fitted ensemble
    pub model: TreeEnsemble,
}

/// Output of model selection, consumed by the forecast engine.
///
/// Immutable once built. Quantile models are kept ordered by level; an
/// empty list means the chosen backend has no quantile objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    name: String,
    params: BoosterParams,
    base: TreeEnsemble,
    feature_names: Vec<String>,
    quantile_models: Vec<QuantileModel>,
}

impl TrainedModel {
    /// Assemble an artifact, checking every ensemble matches `feature_names`
    pub fn new(
        name: impl Into<String>,
        params: BoosterParams,
        base: TreeEnsemble,
        feature_names: Vec<String>,
        mut quantile_models: Vec<QuantileModel>,
    ) -> Result<Self> {
        let expected = feature_names.len();
        let widths = std::iter::once(&base)
            .chain(quantile_models.iter().map(|q| &q.model))
            .map(TreeEnsemble::n_features);
        for actual in widths {
            if actual != expected {
                return Err(ModelError::DimensionMismatch { expected, actual });
            }
        }
        quantile_models.sort_by(|a, b| a.level.total_cmp(&b.level));
        Ok(Self {
            name: name.into(),
            params,
            base,
            feature_names,
            quantile_models,
        })
    }

    /// Name of the backend that produced the model
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hyperparameters of the chosen candidate
    pub const fn params(&self) -> &BoosterParams {
        &self.params
    }

    /// Base (mean) regressor
    pub const fn base(&self) -> &TreeEnsemble {
        &self.base
    }

    /// Feature names in training order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Quantile regressors ordered by level
    pub fn quantile_models(&self) -> &[QuantileModel] {
        &self.quantile_models
    }

    /// Trained quantile levels
    pub fn quantile_levels(&self) -> Vec<f64> {
        self.quantile_models.iter().map(|q| q.level).collect()
    }

    /// Quantile regressor trained at exactly `level`
    pub fn quantile_model(&self, level: f64) -> Option<&TreeEnsemble> {
        self.quantile_models
            .iter()
            .find(|q| q.level == level)
            .map(|q| &q.model)
    }

    /// Base model gain importances paired with feature names
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let importances: Array1<f64> = self.base.feature_importances();
        self.feature_names
            .iter()
            .cloned()
            .zip(importances)
            .collect()
    }

    /// Write the artifact as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Read an artifact written by [`Self::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let model: Self = serde_json::from_reader(reader)?;
        Self::new(
            model.name,
            model.params,
            model.base,
            model.feature_names,
            model.quantile_models,
        )
    }
}

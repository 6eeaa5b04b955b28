//! Forecasting with trained models

use crate::error::{ModelError, Result};
use crate::matrix::FeatureMatrix;
use crate::trained::TrainedModel;
use ndarray::{Array1, ArrayView2};
use polars::prelude::DataFrame;
use tracing::debug;

/// Applies a [`TrainedModel`] to future feature tables.
///
/// Stateless; the model is borrowed for the duration of each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastEngine;

impl ForecastEngine {
    /// Predict one value per row of `features`, preserving row order.
    ///
    /// The table must contain every trained feature column (any order, extra
    /// columns ignored). With `quantile` set and a regressor trained at exactly
    /// that level, the quantile regressor is used; any other level falls back
    /// to the base model.
    // TODO: decide whether an untrained quantile level should be rejected
    // instead of silently using the base model.
    pub fn predict(
        &self,
        model: &TrainedModel,
        features: &DataFrame,
        quantile: Option<f64>,
    ) -> Result<Array1<f64>> {
        let missing: Vec<String> = model
            .feature_names()
            .iter()
            .filter(|name| features.column(name.as_str()).is_err())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::PredictionShape { missing });
        }
        let matrix = FeatureMatrix::from_frame(features, model.feature_names(), None)?;
        self.predict_matrix(model, matrix.features().view(), quantile)
    }

    /// Predict from a matrix whose columns follow [`TrainedModel::feature_names`]
    pub fn predict_matrix(
        &self,
        model: &TrainedModel,
        features: ArrayView2<'_, f64>,
        quantile: Option<f64>,
    ) -> Result<Array1<f64>> {
        let ensemble = match quantile.and_then(|q| model.quantile_model(q)) {
            Some(quantile_model) => quantile_model,
            None => {
                if let Some(q) = quantile {
                    debug!(quantile = q, model = model.name(), "No quantile model, using base");
                }
                model.base()
            }
        };
        ensemble.predict(features)
    }
}

//! Shared handle to a trained model

use crate::error::Result;
use quantumflow_models::TrainedModel;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Cheaply clonable, read-only reference to a [`TrainedModel`].
///
/// A handle never changes the model it points to. Loading or training again
/// produces a new handle; callers swap handles to pick up a new model while
/// in-flight forecasts finish on the old one.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    model: Arc<TrainedModel>,
}

impl ModelHandle {
    /// Wrap a freshly trained model
    pub fn new(model: TrainedModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    /// Load an artifact saved with [`TrainedModel::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let model = TrainedModel::load(path)?;
        info!(
            path = %path.display(),
            model = model.name(),
            features = model.feature_names().len(),
            quantiles = ?model.quantile_levels(),
            "Loaded model"
        );
        Ok(Self::new(model))
    }

    /// The wrapped model
    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Whether two handles share the same model instance
    pub fn same_model(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.model, &other.model)
    }
}

impl Deref for ModelHandle {
    type Target = TrainedModel;

    fn deref(&self) -> &Self::Target {
        &self.model
    }
}

impl From<TrainedModel> for ModelHandle {
    fn from(model: TrainedModel) -> Self {
        Self::new(model)
    }
}

//! Error types for model selection and forecasting.

use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while training or applying models.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No regression backend is available
    #[error("No regression backend available (enable the hist-gbm or exact-gbm feature)")]
    BackendUnavailable,

    /// Future feature table lacks trained feature columns
    #[error("Prediction shape error: missing feature columns {missing:?}")]
    PredictionShape {
        /// Trained feature columns not found in the input
        missing: Vec<String>,
    },

    /// Training table lacks required columns
    #[error("Training table is missing columns {missing:?}")]
    MissingColumns {
        /// Columns not found in the training table
        missing: Vec<String>,
    },

    /// A backend failed to fit
    #[error("{backend} failed to fit: {reason}")]
    Fit {
        /// Backend name
        backend: String,
        /// Failure description
        reason: String,
    },

    /// Backend cannot train the requested objective
    #[error("{backend} does not support the {objective} objective")]
    UnsupportedObjective {
        /// Backend name
        backend: String,
        /// Objective description
        objective: String,
    },

    /// Not enough rows for the requested validation scheme
    #[error("Insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData {
        /// Required number of rows
        required: usize,
        /// Actual number of rows
        actual: usize,
    },

    /// Dimension mismatch between inputs
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    pub(crate) fn fit(backend: &str, reason: impl Into<String>) -> Self {
        Self::Fit {
            backend: backend.to_string(),
            reason: reason.into(),
        }
    }
}

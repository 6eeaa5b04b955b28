//! Unified error type for Quantumflow pipelines.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised anywhere in a Quantumflow pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Feature construction failed
    #[error(transparent)]
    Feature(#[from] quantumflow_features::FeatureError),

    /// Model selection, persistence or prediction failed
    #[error(transparent)]
    Model(#[from] quantumflow_models::ModelError),

    /// Inventory policy evaluation failed
    #[error(transparent)]
    Policy(#[from] quantumflow_inventory::PolicyError),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input that does not fit the expected layout
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

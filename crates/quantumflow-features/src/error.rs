//! Error types for feature construction.

use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while building a feature table.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// One or more required input columns are absent
    #[error("Schema error: {table} is missing columns {missing:?}")]
    Schema {
        /// Name of the table that failed validation
        table: String,
        /// Columns that were required but not found
        missing: Vec<String>,
    },

    /// A column exists but has an unusable type
    #[error("Column {column} has type {actual}, expected {expected}")]
    ColumnType {
        /// Column name
        column: String,
        /// Expected data type
        expected: String,
        /// Actual data type
        actual: String,
    },

    /// The same key appears on more than one row
    #[error("Duplicate key in {table}: {key}")]
    DuplicateKey {
        /// Name of the table holding the duplicate
        table: String,
        /// Rendered key values
        key: String,
    },

    /// Invalid builder configuration
    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),

    /// Enrichment step failed
    #[error("Enrichment {name} failed: {reason}")]
    Enrichment {
        /// Enricher name
        name: String,
        /// Failure description
        reason: String,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

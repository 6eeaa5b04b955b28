//! Error types for inventory policy evaluation.

use thiserror::Error;

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors that can occur while evaluating an inventory policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A policy field is outside its valid range
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// A demand or stock input is outside its valid range
    #[error("Invalid input {name}: {reason}")]
    InvalidInput {
        /// Input name
        name: String,
        /// Why the value was rejected
        reason: String,
    },
}

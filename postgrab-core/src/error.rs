//! Core error types for postgrab.

use thiserror::Error;

/// Core error type for postgrab operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Identifier rejected by strict validation.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid or incomplete post data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

//! SKIPTTL - Custom Error Types
//! Defines the error hierarchy for the skip list engine.
//!
//! A missing or expired key is not an error: lookups return `Option`
//! and erasure returns `bool`.

use thiserror::Error;

/// Custom Result type for the skip list engine.
pub type Result<T> = std::result::Result<T, SkipListError>;

/// Error types for the skip list engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipListError {
    /// The engine was configured with unusable parameters (e.g. `max_level == 0`).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Memory for a new node could not be reserved.
    /// The list is left exactly as it was before the call.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A structural invariant does not hold (reported by `validate`).
    #[error("Structure corruption detected: {0}")]
    Corruption(String),
}

impl From<std::collections::TryReserveError> for SkipListError {
    fn from(err: std::collections::TryReserveError) -> Self {
        SkipListError::ResourceExhausted(err.to_string())
    }
}

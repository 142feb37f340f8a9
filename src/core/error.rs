//! Error types for the compression engine.
//!
//! Provides a unified error type for pipeline operations, covering input
//! validation, pattern store failures, and feedback persistence.

use thiserror::Error;

use super::store::StoreError;

/// Unified error type for compression operations.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Input rejected before the pipeline ran (oversized, non-text).
    /// Caller-visible and non-retryable.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Pattern store was unreachable while loading rule sets.
    /// Aborts the call; retryable once the store recovers.
    #[error("Pattern store unavailable: {0}")]
    PatternLoad(#[source] StoreError),

    /// Feedback event could not be persisted.
    #[error("Feedback persistence failed: {0}")]
    Feedback(#[source] StoreError),

    /// Confidence update failure during feedback processing.
    #[error("Confidence update failed for pattern {pattern_id}: {source}")]
    ConfidenceUpdate {
        pattern_id: i64,
        #[source]
        source: StoreError,
    },
}

impl CompressionError {
    /// Create a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the caller may retry the same call later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }
}

/// Result type alias for compression operations.
pub type CompressionResult<T> = Result<T, CompressionError>;

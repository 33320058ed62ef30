//! Core error types.

use thiserror::Error;

/// Errors that can occur in the core data model.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A trail ARN could not be parsed.
    #[error("invalid trail ARN: {0}")]
    InvalidTrailArn(String),

    /// A requested time range has its start after its end.
    #[error("invalid time range specified: start time must occur before end time")]
    InvalidTimeRange,

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// An object key does not carry a digest timestamp suffix.
    #[error("object key has no digest timestamp: {0}")]
    MalformedDigestKey(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

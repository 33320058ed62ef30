//! Store error types.

use thiserror::Error;

/// Errors that can occur at the object-store boundary and in digest
/// retrieval.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist. A distinct variant because "deleted" and
    /// "tampered" are different findings to an auditor.
    #[error("object not found: s3://{bucket}/{key}")]
    NotFound {
        /// Bucket the lookup targeted.
        bucket: String,
        /// Key the lookup targeted.
        key: String,
    },

    /// Any other transport failure. Not recovered at this layer.
    #[error("object store error: {0}")]
    Transport(String),

    /// A digest object could not be decompressed or parsed.
    #[error("invalid digest format: s3://{bucket}/{key}")]
    InvalidDigestFormat {
        /// Bucket the digest was fetched from.
        bucket: String,
        /// Key the digest was fetched under.
        key: String,
    },

    /// A digest object decoded fine but carries no signature metadata, so
    /// it can never be trusted. An authentication condition, not a format
    /// one.
    #[error("digest has no signature metadata: s3://{bucket}/{key}")]
    MissingSignature {
        /// Bucket the digest was fetched from.
        bucket: String,
        /// Key the digest was fetched under.
        key: String,
    },

    /// A core data-model failure (key timestamps, time math).
    #[error(transparent)]
    Core(#[from] veritrail_core::CoreError),
}

impl StoreError {
    /// Whether this is the not-found transport class.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

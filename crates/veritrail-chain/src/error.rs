//! Chain traversal error types.

use thiserror::Error;
use veritrail_core::CoreError;
use veritrail_crypto::CryptoError;
use veritrail_store::StoreError;

/// Errors that abort a traversal.
///
/// Per-digest findings (missing, invalid, gaps) are *not* errors; they are
/// reported through the observer and traversal continues. Only conditions
/// that make the whole run meaningless surface here.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The key service returned no signing keys for the window. Nothing
    /// can ever validate, so the run stops before touching the store.
    #[error("no public keys found between {start} and {end}")]
    NoKeysFound {
        /// Formatted start of the requested window.
        start: String,
        /// Formatted end of the requested window.
        end: String,
    },

    /// A store failure other than a missing digest.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A data-model failure (time parsing, key timestamps).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The key service itself failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

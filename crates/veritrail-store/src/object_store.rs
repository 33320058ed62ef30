//! The object-store boundary trait.
//!
//! Implementations are expected to surface provider semantics faithfully:
//! listing returns keys in ascending string order strictly *after* the
//! marker, and a missing object is [`StoreError::NotFound`], never a
//! generic failure.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreResult;

/// Metadata entry carrying the hex-encoded RSA signature of a digest.
pub const METADATA_SIGNATURE: &str = "signature";

/// Metadata entry naming the digest signature algorithm.
pub const METADATA_SIGNATURE_ALGORITHM: &str = "signature-algorithm";

/// One page of a listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Keys in ascending string order.
    pub keys: Vec<String>,
    /// Marker to pass for the next page; `None` when the listing is
    /// exhausted.
    pub next_marker: Option<String>,
}

/// A fetched object: body plus user metadata.
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    /// Raw object bytes as stored.
    pub body: Vec<u8>,
    /// User metadata attached to the object.
    pub metadata: HashMap<String, String>,
}

/// A client against one region of an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List keys in a bucket, ascending, strictly after `marker`
    /// (pass `""` to start from the beginning).
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Transport`] on provider failure.
    async fn list_objects(&self, bucket: &str, marker: &str) -> StoreResult<ObjectPage>;

    /// Fetch an object with its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::NotFound`] when the object does not
    /// exist, [`crate::StoreError::Transport`] otherwise.
    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<StoredObject>;

    /// Resolve the region a bucket lives in. `None` or an empty value means
    /// the provider's classic default region.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Transport`] on provider failure.
    async fn get_bucket_location(&self, bucket: &str) -> StoreResult<Option<String>>;
}

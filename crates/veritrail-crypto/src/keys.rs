//! Public key records and the fingerprint-keyed key ring.
//!
//! Signing keys rotate, so a key is only meaningful for the time window it
//! was fetched for. The ring is loaded once per traversal and consulted by
//! fingerprint for every manifest.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CryptoResult;

/// One signing public key as returned by the key service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    /// Identifier manifests use to select this key.
    pub fingerprint: String,
    /// Base64-encoded, DER-formatted (PKCS#1) RSA public key.
    pub value: String,
}

/// Boundary trait to the upstream key service.
///
/// Implementations return every signing key that was valid at any point in
/// the given window.
#[async_trait]
pub trait PublicKeySource: Send + Sync {
    /// List the public keys valid in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CryptoError::KeyLookup`] when the service fails.
    async fn list_public_keys(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CryptoResult<Vec<PublicKeyRecord>>;
}

/// A fingerprint-keyed set of candidate signing keys.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: HashMap<String, PublicKeyRecord>,
}

impl KeyRing {
    /// Build a ring from key-service records. Later duplicates of a
    /// fingerprint win.
    #[must_use]
    pub fn from_records(records: Vec<PublicKeyRecord>) -> Self {
        let keys = records
            .into_iter()
            .map(|record| (record.fingerprint.clone(), record))
            .collect();
        Self { keys }
    }

    /// Look up a key by fingerprint.
    #[must_use]
    pub fn get(&self, fingerprint: &str) -> Option<&PublicKeyRecord> {
        self.keys.get(fingerprint)
    }

    /// Whether the ring holds no keys at all. An empty ring means nothing
    /// can ever be validated for the window — callers treat it as fatal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of keys in the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// All fingerprints in the ring.
    #[must_use]
    pub fn fingerprints(&self) -> Vec<&str> {
        self.keys.keys().map(String::as_str).collect()
    }
}

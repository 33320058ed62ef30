//! The signed digest manifest.
//!
//! A digest manifest is a gzip-compressed JSON document summarizing a batch
//! of audit-log files delivered in a time window, plus a pointer to the
//! previous digest that forms the backward hash chain. The signature itself
//! travels out of band in object-store metadata, never in the body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A parsed digest manifest.
///
/// Required fields are rejected at the deserialization boundary when absent.
/// `previous_digest_signature` must be *present* but may be JSON `null`
/// (genesis digests), which is why it is an `Option` without a serde
/// default. The two `previous_digest_s3_*` pointer fields may be absent
/// entirely — that is a chain gap, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestManifest {
    /// Fingerprint of the public key that signed this manifest.
    pub digest_public_key_fingerprint: String,
    /// Bucket this manifest claims it was delivered to.
    pub digest_s3_bucket: String,
    /// Key this manifest claims it was delivered under.
    pub digest_s3_object: String,
    /// Signature of the previous digest in the chain, `null` on the genesis
    /// digest. Feeds the canonical string to sign as the literal `null`
    /// when absent.
    #[serde(deserialize_with = "Option::deserialize")]
    pub previous_digest_signature: Option<String>,
    /// Start of the window this digest covers (RFC 3339).
    pub digest_start_time: String,
    /// End of the window this digest covers (RFC 3339).
    pub digest_end_time: String,
    /// Bucket holding the previous digest. Absent together with
    /// [`Self::previous_digest_s3_object`] when the chain has a gap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_digest_s3_bucket: Option<String>,
    /// Key of the previous digest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_digest_s3_object: Option<String>,
    /// Log files delivered in this digest's window.
    #[serde(default)]
    pub log_files: Vec<LogFileRecord>,
    /// Hex-encoded RSA signature, copied from object-store metadata after
    /// fetching. Never part of the manifest body.
    #[serde(skip)]
    pub signature_hex: String,
    /// Signature algorithm, copied from object-store metadata.
    #[serde(skip)]
    pub signature_algorithm: String,
}

impl DigestManifest {
    /// Parse `digestStartTime` into a UTC datetime.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimestamp`] if the field is not RFC 3339.
    pub fn start_time(&self) -> CoreResult<DateTime<Utc>> {
        parse_rfc3339_utc(&self.digest_start_time)
    }

    /// Parse `digestEndTime` into a UTC datetime.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimestamp`] if the field is not RFC 3339.
    pub fn end_time(&self) -> CoreResult<DateTime<Utc>> {
        parse_rfc3339_utc(&self.digest_end_time)
    }

    /// The backward chain pointer, if this digest carries one.
    ///
    /// `None` means a chain gap: audit logging was off (or the chain was
    /// restarted) before this digest.
    #[must_use]
    pub fn previous_pointer(&self) -> Option<(&str, &str)> {
        match (
            self.previous_digest_s3_bucket.as_deref(),
            self.previous_digest_s3_object.as_deref(),
        ) {
            (Some(bucket), Some(key)) => Some((bucket, key)),
            _ => None,
        }
    }

    /// Whether the manifest's embedded location matches where it was
    /// actually fetched from. Divergence means the file was moved or
    /// tampered with and must be rejected even if the signature verifies.
    #[must_use]
    pub fn located_at(&self, bucket: &str, key: &str) -> bool {
        self.digest_s3_bucket == bucket && self.digest_s3_object == key
    }
}

/// One log file referenced by a digest manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFileRecord {
    /// Bucket holding the log file.
    pub s3_bucket: String,
    /// Key of the log file.
    pub s3_object: String,
    /// Declared hash of the decompressed log content, hex-encoded.
    pub hash_value: String,
    /// Hash algorithm the declared hash was computed with.
    pub hash_algorithm: String,
}

fn parse_rfc3339_utc(raw: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CoreError::InvalidTimestamp(raw.to_string()))
}

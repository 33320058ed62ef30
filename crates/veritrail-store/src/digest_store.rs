//! Digest listing and retrieval.
//!
//! Candidate digest keys are enumerated by string-ordered listing (see
//! `veritrail_core::digest_key` for why that equals time order), and
//! individual manifests are fetched, gzip-inflated, parsed, and stamped
//! with their out-of-band signature metadata.

use std::io::Read;
use std::sync::Arc;

use chrono::Duration;
use flate2::read::GzDecoder;
use tracing::{debug, trace};
use veritrail_core::{DigestManifest, TimeRange, TrailIdentity, digest_key};

use crate::error::{StoreError, StoreResult};
use crate::object_store::{METADATA_SIGNATURE, METADATA_SIGNATURE_ALGORITHM};
use crate::regional::RegionalClientCache;

/// Listing slack past the end of the range, in hours. Digests for logs that
/// spill slightly past a window boundary land up to this much later; the
/// value is empirical delivery-latency behavior, preserved verbatim.
pub const LIST_END_SLACK_HOURS: i64 = 1;

/// How far before the range start the listing marker is placed, in minutes.
/// Listing is exclusive-after-marker, so backing off makes the range start
/// inclusive.
pub const MARKER_BACKOFF_MINUTES: i64 = 1;

/// Lists candidate digest keys and fetches digest manifests for one trail.
#[derive(Debug)]
pub struct DigestStore {
    trail: TrailIdentity,
    prefix: Option<String>,
    clients: Arc<RegionalClientCache>,
}

impl DigestStore {
    /// Create a digest store for a trail.
    #[must_use]
    pub fn new(
        trail: TrailIdentity,
        prefix: Option<String>,
        clients: Arc<RegionalClientCache>,
    ) -> Self {
        Self {
            trail,
            prefix,
            clients,
        }
    }

    /// The trail this store serves.
    #[must_use]
    pub fn trail(&self) -> &TrailIdentity {
        &self.trail
    }

    /// The shared client cache.
    #[must_use]
    pub fn clients(&self) -> &Arc<RegionalClientCache> {
        &self.clients
    }

    /// List digest keys for this trail in a time range, ascending.
    ///
    /// The listing marker is the key this trail would have been delivered
    /// under [`MARKER_BACKOFF_MINUTES`] before the range start; keys from a
    /// shared bucket are filtered against the trail pattern; the scan stops
    /// as soon as an embedded timestamp passes the range end plus
    /// [`LIST_END_SLACK_HOURS`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] on listing failure.
    pub async fn list_digest_keys(
        &self,
        bucket: &str,
        range: &TimeRange,
    ) -> StoreResult<Vec<String>> {
        let client = self.clients.client_for_bucket(bucket).await?;

        let marker_time = range.start() - Duration::minutes(MARKER_BACKOFF_MINUTES);
        let mut marker = digest_key::derive(&self.trail, marker_time, self.prefix.as_deref());
        let pattern = digest_key::pattern(&self.trail, self.prefix.as_deref());

        let start_ts = range
            .start()
            .format(digest_key::KEY_TIMESTAMP_FORMAT)
            .to_string();
        let end_ts = (range.end() + Duration::hours(LIST_END_SLACK_HOURS))
            .format(digest_key::KEY_TIMESTAMP_FORMAT)
            .to_string();

        debug!(bucket, %marker, "listing digest keys");

        let mut keys = Vec::new();
        loop {
            let page = client.list_objects(bucket, &marker).await?;
            for key in page.keys {
                if !pattern.is_match(&key) {
                    trace!(%key, "skipping non-matching key");
                    continue;
                }
                let Some(ts) = digest_key::extract_timestamp(&key) else {
                    continue;
                };
                if ts > end_ts.as_str() {
                    debug!(count = keys.len(), "digest listing complete (passed range end)");
                    return Ok(keys);
                }
                if ts >= start_ts.as_str() {
                    keys.push(key);
                }
            }
            match page.next_marker {
                Some(next) => marker = next,
                None => break,
            }
        }

        debug!(count = keys.len(), "digest listing complete (exhausted)");
        Ok(keys)
    }

    /// Fetch a digest manifest: get the object, gzip-inflate the body,
    /// parse the JSON, and inject the signature metadata.
    ///
    /// Returns the parsed manifest together with the raw decompressed bytes
    /// the signature was computed over.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] when the object is gone.
    /// - [`StoreError::InvalidDigestFormat`] when inflate or parse fails.
    /// - [`StoreError::MissingSignature`] when either metadata entry is
    ///   absent — the body decoded fine but can never be authenticated.
    pub async fn fetch_manifest(
        &self,
        bucket: &str,
        key: &str,
    ) -> StoreResult<(DigestManifest, Vec<u8>)> {
        let client = self.clients.client_for_bucket(bucket).await?;
        let object = client.get_object(bucket, key).await?;

        let invalid_format = || StoreError::InvalidDigestFormat {
            bucket: bucket.to_string(),
            key: key.to_string(),
        };

        let mut raw = Vec::new();
        GzDecoder::new(object.body.as_slice())
            .read_to_end(&mut raw)
            .map_err(|_| invalid_format())?;

        let mut manifest: DigestManifest =
            serde_json::from_slice(&raw).map_err(|_| invalid_format())?;

        let missing_signature = || StoreError::MissingSignature {
            bucket: bucket.to_string(),
            key: key.to_string(),
        };
        let signature = object
            .metadata
            .get(METADATA_SIGNATURE)
            .ok_or_else(missing_signature)?;
        let algorithm = object
            .metadata
            .get(METADATA_SIGNATURE_ALGORITHM)
            .ok_or_else(missing_signature)?;

        manifest.signature_hex = signature.clone();
        manifest.signature_algorithm = algorithm.clone();

        trace!(bucket, key, "fetched digest manifest");
        Ok((manifest, raw))
    }
}

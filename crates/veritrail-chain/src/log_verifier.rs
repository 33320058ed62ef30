//! Per-log-file hash verification.
//!
//! Each validated digest declares the log files it covers and the SHA-256
//! of their decompressed content. The verifier streams every body through
//! an inflater into a rolling hash in fixed 2048-byte chunks and compares
//! the result against the declaration.

use std::io::Write;
use std::sync::Arc;

use flate2::write::GzDecoder;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use veritrail_core::LogFileRecord;
use veritrail_store::{RegionalClientCache, StoreError};

use crate::error::ChainResult;
use crate::observer::LogObserver;

const HASH_CHUNK_SIZE: usize = 2048;

/// Verifies log file content hashes against their digest declarations.
#[derive(Debug)]
pub struct LogFileVerifier {
    clients: Arc<RegionalClientCache>,
}

impl LogFileVerifier {
    /// Create a verifier over a shared client cache.
    #[must_use]
    pub fn new(clients: Arc<RegionalClientCache>) -> Self {
        Self { clients }
    }

    /// Fetch one log file, recompute its content hash, and report the
    /// outcome to `observer`.
    ///
    /// A missing object, an undecodable body, and a hash mismatch are
    /// findings, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ChainError::Store`] on transport failures other
    /// than a missing object.
    pub async fn verify(
        &self,
        log: &LogFileRecord,
        observer: &mut dyn LogObserver,
    ) -> ChainResult<()> {
        let client = self.clients.client_for_bucket(&log.s3_bucket).await?;
        let object = match client.get_object(&log.s3_bucket, &log.s3_object).await {
            Ok(object) => object,
            Err(StoreError::NotFound { .. }) => {
                observer.on_missing(log);
                return Ok(());
            },
            Err(other) => return Err(other.into()),
        };

        let Some(computed) = rolling_content_hash(&object.body) else {
            observer.on_invalid_format(log);
            return Ok(());
        };

        if computed == log.hash_value {
            trace!(key = %log.s3_object, "log hash matched");
            observer.on_valid(log);
        } else {
            debug!(key = %log.s3_object, "log hash mismatch");
            observer.on_hash_mismatch(log);
        }
        Ok(())
    }

    /// Verify every log a digest declares, checking for cancellation
    /// between files.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ChainError::Store`] on transport failures other
    /// than a missing object.
    pub async fn verify_all(
        &self,
        logs: &[LogFileRecord],
        cancel: &CancellationToken,
        observer: &mut dyn LogObserver,
    ) -> ChainResult<()> {
        for log in logs {
            if cancel.is_cancelled() {
                debug!("log verification cancelled");
                return Ok(());
            }
            self.verify(log, observer).await?;
        }
        Ok(())
    }
}

/// Inflate `body` chunk by chunk through a rolling SHA-256 and return the
/// hex hash of the decompressed content. `None` when the body is not valid
/// gzip.
fn rolling_content_hash(body: &[u8]) -> Option<String> {
    let mut decoder = GzDecoder::new(Sha256::new());
    for chunk in body.chunks(HASH_CHUNK_SIZE) {
        decoder.write_all(chunk).ok()?;
    }
    let hasher = decoder.finish().ok()?;
    Some(hex::encode(hasher.finalize()))
}

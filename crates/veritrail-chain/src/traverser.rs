//! Backward traversal of the digest chain.
//!
//! Traversal starts from the newest digest in the requested window and
//! follows each manifest's previous-digest pointer back in time. One
//! validation failure never stops the walk: the failed digest is reported
//! through the observer and traversal resumes from the newest remaining
//! candidate that is strictly older, so a single tampered file cannot
//! hide everything before it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use veritrail_core::{DigestManifest, TimeRange, digest_key};
use veritrail_crypto::{CryptoError, KeyRing, PublicKeySource, verify_digest_signature};
use veritrail_store::{DigestStore, StoreError};

use crate::error::{ChainError, ChainResult};
use crate::observer::{ChainAnomaly, ChainObserver, format_display_time};

/// A digest that passed every validation step, with where it was fetched
/// from.
#[derive(Debug, Clone)]
pub struct ValidatedDigest {
    /// Bucket the digest was fetched from.
    pub bucket: String,
    /// Key the digest was fetched under.
    pub key: String,
    /// The authenticated manifest.
    pub manifest: DigestManifest,
}

/// Ascending candidate keys consumed newest-first through a cursor.
#[derive(Debug)]
struct Candidates {
    keys: Vec<String>,
    /// `keys[..cursor]` are still unconsumed.
    cursor: usize,
}

impl Candidates {
    fn new(keys: Vec<String>) -> Self {
        let cursor = keys.len();
        Self { keys, cursor }
    }

    /// Take the newest unconsumed candidate.
    fn take_latest(&mut self) -> Option<String> {
        self.cursor = self.cursor.checked_sub(1)?;
        self.keys.get(self.cursor).cloned()
    }

    /// Take the newest candidate strictly older than `before_key`.
    ///
    /// Embedded timestamps are fixed-width, so comparing them as strings
    /// compares them as times.
    fn take_before(&mut self, before_key: &str) -> Option<String> {
        let before_ts = digest_key::extract_timestamp(before_key)?.to_string();
        while let Some(key) = self.take_latest() {
            if digest_key::extract_timestamp(&key).is_some_and(|ts| ts < before_ts.as_str()) {
                debug!(%key, "resuming from older digest");
                return Some(key);
            }
        }
        None
    }
}

enum StepOutcome {
    Validated {
        manifest: DigestManifest,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Missing,
    Invalid(String),
}

/// What to do once the caller has consumed a validated digest. Deferring
/// this keeps observer callbacks ordered after the digest they follow.
enum PendingStep {
    /// Follow the manifest's previous-digest pointer.
    Follow { bucket: String, key: String },
    /// The manifest carried no pointer; resume from the candidate list.
    Gap { last_key: String },
}

enum AnomalyKind {
    Gap,
    Missing,
    Invalid,
}

/// Walks a trail's digest chain backwards, validating as it goes.
pub struct ChainTraverser {
    store: DigestStore,
    keys: Arc<dyn PublicKeySource>,
    starting_bucket: String,
}

impl ChainTraverser {
    /// Create a traverser over a digest store, starting from `bucket`.
    #[must_use]
    pub fn new(
        store: DigestStore,
        keys: Arc<dyn PublicKeySource>,
        starting_bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            keys,
            starting_bucket: starting_bucket.into(),
        }
    }

    /// Start a traversal over `range`.
    ///
    /// Loads the signing key ring for the window and the initial candidate
    /// list, then positions the cursor on the newest candidate.
    ///
    /// # Errors
    ///
    /// - [`ChainError::NoKeysFound`] when the key service has no keys for
    ///   the window.
    /// - [`ChainError::Store`] / [`ChainError::Crypto`] on transport
    ///   failure.
    pub async fn begin(
        &self,
        range: TimeRange,
        cancel: CancellationToken,
    ) -> ChainResult<Traversal<'_>> {
        let records = self
            .keys
            .list_public_keys(range.start(), range.end())
            .await?;
        let ring = KeyRing::from_records(records);
        if ring.is_empty() {
            return Err(ChainError::NoKeysFound {
                start: format_display_time(range.start()),
                end: format_display_time(range.end()),
            });
        }
        debug!(keys = ring.len(), "loaded signing key ring");

        let listed = self
            .store
            .list_digest_keys(&self.starting_bucket, &range)
            .await?;
        let mut candidates = Candidates::new(listed);
        let current = candidates.take_latest();

        Ok(Traversal {
            traverser: self,
            ring,
            cancel,
            bucket: self.starting_bucket.clone(),
            candidates,
            current,
            cursor_time: range.end(),
            end_time: range.end(),
            pending: None,
            range,
        })
    }
}

impl std::fmt::Debug for ChainTraverser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainTraverser")
            .field("starting_bucket", &self.starting_bucket)
            .finish_non_exhaustive()
    }
}

/// An in-progress chain walk. Pull validated digests one at a time with
/// [`Traversal::next_validated`].
pub struct Traversal<'a> {
    traverser: &'a ChainTraverser,
    ring: KeyRing,
    range: TimeRange,
    cancel: CancellationToken,
    bucket: String,
    candidates: Candidates,
    current: Option<String>,
    /// Start time of the newest validated digest. Traversal stops once it
    /// crosses the range start.
    cursor_time: DateTime<Utc>,
    /// Upper bound for candidate reloads after the chain crosses buckets.
    end_time: DateTime<Utc>,
    pending: Option<PendingStep>,
}

impl std::fmt::Debug for Traversal<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traversal")
            .field("bucket", &self.bucket)
            .field("current", &self.current)
            .field("cursor_time", &self.cursor_time)
            .finish_non_exhaustive()
    }
}

impl Traversal<'_> {
    /// Advance to and return the next validated digest, oldest-last.
    ///
    /// Missing, invalid, and gap findings along the way are reported to
    /// `observer` and skipped over. Returns `Ok(None)` when the chain is
    /// exhausted, the range start is crossed, or the run was cancelled.
    ///
    /// # Errors
    ///
    /// Only unrecoverable conditions: transport failures other than a
    /// missing object, and candidate-list reload failures.
    pub async fn next_validated(
        &mut self,
        observer: &mut dyn ChainObserver,
    ) -> ChainResult<Option<ValidatedDigest>> {
        if let Some(step) = self.pending.take() {
            self.apply_pending(step, observer).await?;
        }

        loop {
            if self.cancel.is_cancelled() {
                debug!("traversal cancelled");
                return Ok(None);
            }
            let Some(key) = self.current.clone() else {
                return Ok(None);
            };
            if self.range.start() > self.cursor_time {
                return Ok(None);
            }

            match self.load_and_validate(&key).await? {
                StepOutcome::Validated {
                    manifest,
                    start,
                    end,
                } => {
                    self.cursor_time = start;
                    self.end_time = end;
                    self.pending = Some(match manifest.previous_pointer() {
                        Some((prev_bucket, prev_key)) => PendingStep::Follow {
                            bucket: prev_bucket.to_string(),
                            key: prev_key.to_string(),
                        },
                        None => PendingStep::Gap {
                            last_key: key.clone(),
                        },
                    });
                    debug!(bucket = %self.bucket, %key, "digest validated");
                    return Ok(Some(ValidatedDigest {
                        bucket: self.bucket.clone(),
                        key,
                        manifest,
                    }));
                },
                StepOutcome::Missing => {
                    let message =
                        format!("Digest file\ts3://{}/{key}\tnot found", self.bucket);
                    self.advance(&key, AnomalyKind::Missing, Some(message), observer);
                },
                StepOutcome::Invalid(message) => {
                    self.advance(&key, AnomalyKind::Invalid, Some(message), observer);
                },
            }
        }
    }

    async fn apply_pending(
        &mut self,
        step: PendingStep,
        observer: &mut dyn ChainObserver,
    ) -> ChainResult<()> {
        match step {
            PendingStep::Follow { bucket, key } => {
                if bucket != self.bucket {
                    debug!(from = %self.bucket, to = %bucket, "chain crosses buckets");
                    self.bucket = bucket;
                    // A digest ending before the range start would invert
                    // the listing range; clamp instead of erroring.
                    let end = self.end_time.max(self.range.start());
                    let range = TimeRange::new(self.range.start(), end)?;
                    let listed = self
                        .traverser
                        .store
                        .list_digest_keys(&self.bucket, &range)
                        .await?;
                    self.candidates = Candidates::new(listed);
                }
                self.current = Some(key);
            },
            PendingStep::Gap { last_key } => {
                self.advance(&last_key, AnomalyKind::Gap, None, observer);
            },
        }
        Ok(())
    }

    /// Report an anomaly and reposition on the newest strictly-older
    /// candidate. Gap callbacks only fire when traversal can actually
    /// resume; missing and invalid callbacks always fire.
    fn advance(
        &mut self,
        last_key: &str,
        kind: AnomalyKind,
        message: Option<String>,
        observer: &mut dyn ChainObserver,
    ) {
        let next_key = self.candidates.take_before(last_key);
        let next_end_time = next_key
            .as_deref()
            .and_then(|key| digest_key::parse_key_timestamp(key).ok());

        let conditional = matches!(kind, AnomalyKind::Gap);
        if !conditional || next_key.is_some() {
            let anomaly = ChainAnomaly {
                bucket: self.bucket.clone(),
                last_key: last_key.to_string(),
                last_start_time: self.cursor_time,
                next_key: next_key.clone(),
                next_end_time,
                message,
            };
            match kind {
                AnomalyKind::Gap => observer.on_gap(&anomaly),
                AnomalyKind::Missing => observer.on_missing(&anomaly),
                AnomalyKind::Invalid => observer.on_invalid(&anomaly),
            }
        }

        if let Some(at) = next_end_time {
            self.end_time = at;
        }
        self.current = next_key;
    }

    async fn load_and_validate(&self, key: &str) -> ChainResult<StepOutcome> {
        let bucket = &self.bucket;
        let (manifest, raw) = match self.traverser.store.fetch_manifest(bucket, key).await {
            Ok(fetched) => fetched,
            Err(StoreError::NotFound { .. }) => return Ok(StepOutcome::Missing),
            Err(StoreError::InvalidDigestFormat { .. }) => {
                return Ok(StepOutcome::Invalid(format!(
                    "Digest file\ts3://{bucket}/{key}\tINVALID: invalid format"
                )));
            },
            Err(StoreError::MissingSignature { .. }) => {
                return Ok(StepOutcome::Invalid(format!(
                    "Digest file\ts3://{bucket}/{key}\tINVALID: signature verification failed"
                )));
            },
            Err(other) => return Err(other.into()),
        };

        if !manifest.located_at(bucket, key) {
            return Ok(StepOutcome::Invalid(format!(
                "Digest file\ts3://{bucket}/{key}\tINVALID: has been moved from its original location"
            )));
        }

        let fingerprint = &manifest.digest_public_key_fingerprint;
        let Some(record) = self.ring.get(fingerprint) else {
            let region = &self.traverser.store.trail().home_region;
            return Ok(StepOutcome::Invalid(format!(
                "Digest file\ts3://{bucket}/{key}\tINVALID: public key not found in region {region} for fingerprint {fingerprint}"
            )));
        };

        if let Err(err) = verify_digest_signature(&manifest, &raw, &record.value) {
            let message = match err {
                CryptoError::InvalidPublicKey | CryptoError::InvalidBase64Encoding => format!(
                    "Digest file\ts3://{bucket}/{key}\tINVALID: Unable to load PKCS #1 key with fingerprint {fingerprint}"
                ),
                CryptoError::SignatureVerificationFailed => format!(
                    "Digest file\ts3://{bucket}/{key}\tINVALID: signature verification failed"
                ),
                other => {
                    format!("Digest file\ts3://{bucket}/{key}\tINVALID: {other}")
                },
            };
            return Ok(StepOutcome::Invalid(message));
        }

        match (manifest.start_time(), manifest.end_time()) {
            (Ok(start), Ok(end)) => Ok(StepOutcome::Validated {
                manifest,
                start,
                end,
            }),
            (Err(err), _) | (_, Err(err)) => Ok(StepOutcome::Invalid(format!(
                "Digest file\ts3://{bucket}/{key}\tINVALID: {err}"
            ))),
        }
    }
}

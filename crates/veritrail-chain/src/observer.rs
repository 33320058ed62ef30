//! Traversal observers and the run summary.
//!
//! The traverser and log verifier never print. Findings are pushed through
//! these traits so a frontend can render them however it likes while the
//! engine keeps walking the chain.

use chrono::{DateTime, Utc};
use veritrail_core::LogFileRecord;

/// Render a UTC time the way reports display times.
#[must_use]
pub fn format_display_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Context for one chain anomaly.
///
/// `last_*` describe the digest the traverser was at when the anomaly was
/// found; `next_*` describe the older digest it resumes from, when one
/// exists. `message` is the preformatted report line for missing and
/// invalid digests.
#[derive(Debug, Clone)]
pub struct ChainAnomaly {
    /// Bucket the anomaly was found in.
    pub bucket: String,
    /// Key of the digest the traverser was examining.
    pub last_key: String,
    /// Start of the window covered so far.
    pub last_start_time: DateTime<Utc>,
    /// Key of the older digest traversal resumes from, if any remain.
    pub next_key: Option<String>,
    /// Timestamp embedded in `next_key`.
    pub next_end_time: Option<DateTime<Utc>>,
    /// Preformatted report line. `None` for gaps.
    pub message: Option<String>,
}

/// Receives chain findings during traversal.
///
/// All methods default to no-ops so observers only handle what they care
/// about.
pub trait ChainObserver: Send {
    /// The chain was deliberately broken before `anomaly.last_key`
    /// (logging was off, or the chain restarted). Only fired when an older
    /// digest exists to resume from.
    fn on_gap(&mut self, anomaly: &ChainAnomaly) {
        let _ = anomaly;
    }

    /// A referenced digest object no longer exists; `anomaly.message`
    /// carries the report line.
    fn on_missing(&mut self, anomaly: &ChainAnomaly) {
        let _ = anomaly;
    }

    /// A digest failed validation; `anomaly.message` carries the report
    /// line.
    fn on_invalid(&mut self, anomaly: &ChainAnomaly) {
        let _ = anomaly;
    }
}

/// Receives per-log-file findings during verification.
pub trait LogObserver: Send {
    /// The log decompressed and its hash matched the digest's declaration.
    fn on_valid(&mut self, log: &LogFileRecord) {
        let _ = log;
    }

    /// The log object no longer exists.
    fn on_missing(&mut self, log: &LogFileRecord) {
        let _ = log;
    }

    /// The log could not be decompressed.
    fn on_invalid_format(&mut self, log: &LogFileRecord) {
        let _ = log;
    }

    /// The computed hash did not match the digest's declaration.
    fn on_hash_mismatch(&mut self, log: &LogFileRecord) {
        let _ = log;
    }
}

/// Counters accumulated across a whole validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Digests that verified end to end.
    pub valid_digests: u64,
    /// Digests that were missing or failed validation.
    pub invalid_digests: u64,
    /// Log files whose hash matched.
    pub valid_logs: u64,
    /// Log files missing, undecodable, or hash-mismatched.
    pub invalid_logs: u64,
}

impl ValidationSummary {
    /// Whether the run found nothing wrong.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.invalid_digests == 0 && self.invalid_logs == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_display_time_format() {
        let at = Utc.with_ymd_and_hms(2015, 8, 17, 0, 17, 28).unwrap();
        assert_eq!(format_display_time(at), "2015-08-17T00:17:28Z");
    }

    #[test]
    fn test_summary_clean() {
        let mut summary = ValidationSummary {
            valid_digests: 3,
            valid_logs: 7,
            ..ValidationSummary::default()
        };
        assert!(summary.is_clean());

        summary.invalid_logs = 1;
        assert!(!summary.is_clean());
    }
}

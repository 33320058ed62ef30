//! Terminal status reporting and run counters.
//!
//! Valid-file status lines go to stdout and are suppressed by `--quiet`;
//! anomaly lines always go to stderr. The exact line shapes are part of the
//! tool's contract and are emitted byte for byte.

use colored::Colorize;
use veritrail_chain::{ChainAnomaly, ChainObserver, LogObserver, ValidationSummary, format_display_time};
use veritrail_core::{LogFileRecord, TimeRange, TrailIdentity};

/// Accumulates counters and renders status lines as findings arrive.
#[derive(Debug, Default)]
pub(crate) struct StatusReporter {
    summary: ValidationSummary,
    quiet: bool,
}

impl StatusReporter {
    pub(crate) fn new(quiet: bool) -> Self {
        Self {
            summary: ValidationSummary::default(),
            quiet,
        }
    }

    pub(crate) fn summary(&self) -> ValidationSummary {
        self.summary
    }

    fn status(&self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }

    fn finding(&self, line: &str) {
        eprintln!("{}", line.red());
    }

    pub(crate) fn startup(&self, trail: &TrailIdentity, range: &TimeRange) {
        self.status(&format!(
            "Validating log files for trail {trail} between {} and {}\n",
            format_display_time(range.start()),
            format_display_time(range.end()),
        ));
    }

    /// Count and report a digest that passed every validation step.
    pub(crate) fn digest_valid(&mut self, bucket: &str, key: &str) {
        self.summary.valid_digests += 1;
        self.status(&format!("Digest file\ts3://{bucket}/{key}\tvalid"));
    }

    /// Render the end-of-run summary.
    pub(crate) fn finish(&self, range: &TimeRange) {
        if !self.quiet {
            println!();
        }
        println!(
            "Results requested for {} to {}",
            format_display_time(range.start()),
            format_display_time(range.end()),
        );

        if self.summary.valid_digests == 0 && self.summary.invalid_digests == 0 {
            println!("No digests found");
            return;
        }

        let digests = format!(
            "{} valid, {} invalid digest(s)",
            self.summary.valid_digests, self.summary.invalid_digests
        );
        let logs = format!(
            "{} valid, {} invalid log file(s)",
            self.summary.valid_logs, self.summary.invalid_logs
        );
        if self.summary.is_clean() {
            println!("{}", digests.green());
            println!("{}", logs.green());
        } else {
            println!("{}", digests.red());
            println!("{}", logs.red());
        }
    }
}

impl ChainObserver for StatusReporter {
    fn on_gap(&mut self, anomaly: &ChainAnomaly) {
        // Gaps are informational; they do not fail the run.
        if let Some(next_end) = anomaly.next_end_time {
            self.status(&format!(
                "No log files were delivered by CloudTrail between {} and {}",
                format_display_time(next_end),
                format_display_time(anomaly.last_start_time),
            ));
        }
    }

    fn on_missing(&mut self, anomaly: &ChainAnomaly) {
        self.summary.invalid_digests += 1;
        if let Some(message) = anomaly.message.as_deref() {
            self.finding(message);
        }
    }

    fn on_invalid(&mut self, anomaly: &ChainAnomaly) {
        self.summary.invalid_digests += 1;
        if let Some(message) = anomaly.message.as_deref() {
            self.finding(message);
        }
    }
}

impl LogObserver for StatusReporter {
    fn on_valid(&mut self, log: &LogFileRecord) {
        self.summary.valid_logs += 1;
        self.status(&format!(
            "Log file\ts3://{}/{}\tvalid",
            log.s3_bucket, log.s3_object
        ));
    }

    fn on_missing(&mut self, log: &LogFileRecord) {
        self.summary.invalid_logs += 1;
        self.finding(&format!(
            "Log file\ts3://{}/{}\tINVALID: not found",
            log.s3_bucket, log.s3_object
        ));
    }

    fn on_invalid_format(&mut self, log: &LogFileRecord) {
        self.summary.invalid_logs += 1;
        self.finding(&format!(
            "Log file\ts3://{}/{}\tINVALID: invalid format",
            log.s3_bucket, log.s3_object
        ));
    }

    fn on_hash_mismatch(&mut self, log: &LogFileRecord) {
        self.summary.invalid_logs += 1;
        self.finding(&format!(
            "Log file\ts3://{}/{}\tINVALID: hash value doesn't match",
            log.s3_bucket, log.s3_object
        ));
    }
}

//! Validated UTC time ranges.
//!
//! Every traversal is bounded by a range validated up front — a reversed
//! range must fail before any network call is made.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};

/// A closed, validated UTC time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range, normalizing both endpoints to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimeRange`] when `start > end`.
    pub fn new<Tz1, Tz2>(start: DateTime<Tz1>, end: DateTime<Tz2>) -> CoreResult<Self>
    where
        Tz1: chrono::TimeZone,
        Tz2: chrono::TimeZone,
    {
        let start = start.with_timezone(&Utc);
        let end = end.with_timezone(&Utc);
        if start > end {
            return Err(CoreError::InvalidTimeRange);
        }
        Ok(Self { start, end })
    }

    /// Create a range ending now.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTimeRange`] when `start` is in the future.
    pub fn through_now<Tz: chrono::TimeZone>(start: DateTime<Tz>) -> CoreResult<Self> {
        Self::new(start, Utc::now())
    }

    /// Start of the range (inclusive).
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the range (inclusive).
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether a timestamp falls within the range.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

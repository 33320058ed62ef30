//! Deterministic digest key derivation.
//!
//! Digest manifests are stored under a fixed key template that embeds the
//! account, regions, trail name, and a zero-padded UTC timestamp:
//!
//! ```text
//! AWSLogs/{account}/CloudTrail-Digest/{source_region}/{yyyy}/{mm}/{dd}/
//!     {account}_CloudTrail-Digest_{source_region}_{trail}_{home_region}_{yyyymmddThhmmssZ}.json.gz
//! ```
//!
//! Because every variable-width component is fixed for a given trail and the
//! timestamp is zero-padded, lexicographic key order equals chronological
//! order: for `t1 < t2`, `derive(t1) < derive(t2)` under plain string
//! comparison. Listing code depends on this.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::{CoreError, CoreResult};
use crate::identity::TrailIdentity;

/// Timestamp format embedded in digest keys (UTC, second precision).
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Date format of the directory portion of a digest key.
pub const KEY_DATE_FORMAT: &str = "%Y/%m/%d";

/// Length of the timestamp portion of a digest key.
const TIMESTAMP_LEN: usize = 16;

/// Suffix every digest key carries.
const KEY_SUFFIX: &str = ".json.gz";

/// Derive the canonical digest key for a trail at a timestamp.
///
/// This is the key a digest delivered at `timestamp` would have been stored
/// under. A non-empty `prefix` is prepended as `{prefix}/`.
#[must_use]
pub fn derive(trail: &TrailIdentity, timestamp: DateTime<Utc>, prefix: Option<&str>) -> String {
    let key = format!(
        "AWSLogs/{account}/CloudTrail-Digest/{source_region}/{ymd}/\
         {account}_CloudTrail-Digest_{source_region}_{name}_{home_region}_{date}{suffix}",
        account = trail.account_id,
        source_region = trail.source_region,
        ymd = timestamp.format(KEY_DATE_FORMAT),
        name = trail.trail_name,
        home_region = trail.home_region,
        date = timestamp.format(KEY_TIMESTAMP_FORMAT),
        suffix = KEY_SUFFIX,
    );
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}/{key}"),
        _ => key,
    }
}

/// Build a regex matching only digest keys belonging to this exact
/// trail/account/region combination.
///
/// All literal components are escaped, so listing results from a shared
/// bucket can be filtered to the relevant trail.
#[must_use]
pub fn pattern(trail: &TrailIdentity, prefix: Option<&str>) -> Regex {
    let body = format!(
        "AWSLogs/{account}/CloudTrail-Digest/{source_region}/\\d+/\\d+/\\d+/\
         {account}_CloudTrail-Digest_{source_region}_{name}_{home_region}_.+\\.json\\.gz",
        account = regex::escape(&trail.account_id),
        source_region = regex::escape(&trail.source_region),
        name = regex::escape(&trail.trail_name),
        home_region = regex::escape(&trail.home_region),
    );
    let full = match prefix {
        Some(prefix) if !prefix.is_empty() => {
            format!("^{}/{body}$", regex::escape(prefix))
        },
        _ => format!("^{body}$"),
    };
    Regex::new(&full).expect("escaped key pattern always compiles")
}

/// Slice the fixed-width timestamp out of a digest key.
///
/// Returns `None` if the key is too short or lacks the `.json.gz` suffix.
/// No parsing is needed for ordering — timestamps compare correctly as
/// strings.
#[must_use]
pub fn extract_timestamp(key: &str) -> Option<&str> {
    let stem = key.strip_suffix(KEY_SUFFIX)?;
    if stem.len() < TIMESTAMP_LEN || !stem.is_char_boundary(stem.len() - TIMESTAMP_LEN) {
        return None;
    }
    Some(&stem[stem.len() - TIMESTAMP_LEN..])
}

/// Parse the timestamp embedded in a digest key into a UTC datetime.
///
/// # Errors
///
/// Returns [`CoreError::MalformedDigestKey`] when the key carries no
/// timestamp suffix, or [`CoreError::InvalidTimestamp`] when the suffix does
/// not parse.
pub fn parse_key_timestamp(key: &str) -> CoreResult<DateTime<Utc>> {
    let raw = extract_timestamp(key).ok_or_else(|| CoreError::MalformedDigestKey(key.to_string()))?;
    NaiveDateTime::parse_from_str(raw, KEY_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| CoreError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trail() -> TrailIdentity {
        TrailIdentity::new("123456789012", "my-trail", "us-east-1")
    }

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 8, 17, h, m, s).unwrap()
    }

    #[test]
    fn test_derive_canonical_key() {
        let key = derive(&trail(), ts(0, 17, 28), None);
        assert_eq!(
            key,
            "AWSLogs/123456789012/CloudTrail-Digest/us-east-1/2015/08/17/\
             123456789012_CloudTrail-Digest_us-east-1_my-trail_us-east-1_20150817T001728Z.json.gz"
        );
    }

    #[test]
    fn test_derive_with_prefix() {
        let key = derive(&trail(), ts(0, 17, 28), Some("org/audit"));
        assert!(key.starts_with("org/audit/AWSLogs/"));

        // Empty prefix behaves like no prefix.
        assert_eq!(derive(&trail(), ts(0, 17, 28), Some("")), derive(&trail(), ts(0, 17, 28), None));
    }

    #[test]
    fn test_lexicographic_order_matches_chronological() {
        let trail = trail();
        let times = [
            Utc.with_ymd_and_hms(2014, 12, 31, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2015, 8, 17, 0, 17, 28).unwrap(),
            Utc.with_ymd_and_hms(2015, 8, 17, 1, 17, 28).unwrap(),
            Utc.with_ymd_and_hms(2015, 10, 2, 9, 0, 0).unwrap(),
        ];

        for pair in times.windows(2) {
            let earlier = derive(&trail, pair[0], None);
            let later = derive(&trail, pair[1], None);
            assert!(earlier < later, "{earlier} !< {later}");
        }
    }

    #[test]
    fn test_pattern_matches_own_keys_only() {
        let trail = trail();
        let pattern = pattern(&trail, None);

        assert!(pattern.is_match(&derive(&trail, ts(0, 17, 28), None)));

        // Another trail in the same bucket must not match.
        let other = TrailIdentity::new("123456789012", "other-trail", "us-east-1");
        assert!(!pattern.is_match(&derive(&other, ts(0, 17, 28), None)));

        // Another account must not match.
        let other = TrailIdentity::new("999999999999", "my-trail", "us-east-1");
        assert!(!pattern.is_match(&derive(&other, ts(0, 17, 28), None)));

        // Plain log files (not digests) must not match.
        assert!(!pattern.is_match(
            "AWSLogs/123456789012/CloudTrail/us-east-1/2015/08/17/\
             123456789012_CloudTrail_us-east-1_20150817T0015Z_xyz.json.gz"
        ));
    }

    #[test]
    fn test_pattern_escapes_literals() {
        // A trail name with regex metacharacters matches itself, not the
        // pattern the metacharacters would describe.
        let dotted = TrailIdentity::new("123456789012", "my.trail", "us-east-1");
        let pattern = pattern(&dotted, None);

        assert!(pattern.is_match(&derive(&dotted, ts(0, 17, 28), None)));

        let undotted = TrailIdentity::new("123456789012", "myXtrail", "us-east-1");
        assert!(!pattern.is_match(&derive(&undotted, ts(0, 17, 28), None)));
    }

    #[test]
    fn test_pattern_with_prefix() {
        let trail = trail();
        let pattern = pattern(&trail, Some("org/audit"));

        assert!(pattern.is_match(&derive(&trail, ts(0, 17, 28), Some("org/audit"))));
        assert!(!pattern.is_match(&derive(&trail, ts(0, 17, 28), None)));
    }

    #[test]
    fn test_extract_timestamp() {
        let key = derive(&trail(), ts(0, 17, 28), None);
        assert_eq!(extract_timestamp(&key), Some("20150817T001728Z"));

        assert_eq!(extract_timestamp("short.json.gz"), None);
        assert_eq!(extract_timestamp("no-suffix"), None);
    }

    #[test]
    fn test_parse_key_timestamp_round_trip() {
        let at = ts(23, 5, 9);
        let key = derive(&trail(), at, None);
        assert_eq!(parse_key_timestamp(&key).unwrap(), at);
    }

    #[test]
    fn test_parse_key_timestamp_rejects_garbage() {
        assert!(parse_key_timestamp("nope").is_err());
        assert!(parse_key_timestamp("prefix_XXXXXXXXXXXXXXXX.json.gz").is_err());
    }
}

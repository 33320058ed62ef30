//! Veritrail Core - Data model for audit-log chain-of-custody validation.
//!
//! This crate provides:
//! - Trail identity (account, trail name, home/source region)
//! - Deterministic digest key derivation and matching
//! - The signed digest manifest data model
//! - Validated UTC time ranges
//!
//! # Ordering Invariant
//!
//! Digest object keys embed a zero-padded UTC timestamp, so plain string
//! ordering of keys equals chronological ordering. Listing a bucket with a
//! string-sorted marker therefore doubles as a time-sorted scan — the whole
//! traversal engine leans on this.
//!
//! # Example
//!
//! ```
//! use veritrail_core::{TrailIdentity, digest_key};
//! use chrono::{TimeZone, Utc};
//!
//! let trail = TrailIdentity::new("123456789012", "my-trail", "us-east-1");
//! let ts = Utc.with_ymd_and_hms(2015, 8, 17, 0, 17, 28).unwrap();
//!
//! let key = digest_key::derive(&trail, ts, None);
//! assert!(key.ends_with("20150817T001728Z.json.gz"));
//! assert!(digest_key::pattern(&trail, None).is_match(&key));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod digest_key;

mod error;
mod identity;
mod manifest;
mod time_range;

pub use error::{CoreError, CoreResult};
pub use identity::TrailIdentity;
pub use manifest::{DigestManifest, LogFileRecord};
pub use time_range::TimeRange;

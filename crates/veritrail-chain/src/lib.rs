//! Veritrail Chain - Backward digest-chain traversal and log verification.
//!
//! This crate provides:
//! - [`ChainTraverser`]: walks a trail's digest chain newest-to-oldest,
//!   authenticating every manifest and resuming past missing or tampered
//!   links
//! - [`LogFileVerifier`]: recomputes the content hash of every log file a
//!   validated digest declares
//! - Observer traits ([`ChainObserver`], [`LogObserver`]) through which
//!   findings reach the frontend, and the [`ValidationSummary`] counters
//!
//! # Resilience
//!
//! A single bad digest never ends a run. The traverser reports it and
//! resumes from the newest remaining candidate that is strictly older, so
//! deleting or corrupting one file cannot suppress findings about the rest
//! of the chain.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod log_verifier;
mod observer;
mod traverser;

pub use error::{ChainError, ChainResult};
pub use log_verifier::LogFileVerifier;
pub use observer::{
    ChainAnomaly, ChainObserver, LogObserver, ValidationSummary, format_display_time,
};
pub use traverser::{ChainTraverser, Traversal, ValidatedDigest};

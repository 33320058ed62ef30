//! Veritrail Store - Object store boundary and digest retrieval.
//!
//! This crate provides:
//! - The [`ObjectStore`] boundary trait (paginated listing with a marker,
//!   object fetch with metadata, bucket location lookup)
//! - Two backends behind the same API: [`MemoryObjectStore`] for tests and
//!   embedding, [`FsObjectStore`] for directory-per-bucket local mirrors
//! - [`RegionalClientCache`]: bucket→region and region→client resolution
//!   with exactly one location lookup per bucket
//! - [`DigestStore`]: candidate digest key listing in a time range and
//!   manifest fetch + decompress + metadata injection
//!
//! Transport failures are typed: [`StoreError::NotFound`] is its own
//! variant so callers classify "deleted" separately from "broken" without
//! inspecting error strings.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod digest_store;
mod error;
mod fs;
mod memory;
mod object_store;
mod regional;

pub use digest_store::{DigestStore, LIST_END_SLACK_HOURS, MARKER_BACKOFF_MINUTES};
pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use object_store::{
    METADATA_SIGNATURE, METADATA_SIGNATURE_ALGORITHM, ObjectPage, ObjectStore, StoredObject,
};
pub use regional::{DEFAULT_REGION, ObjectStoreFactory, RegionalClientCache};

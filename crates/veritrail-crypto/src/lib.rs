//! Veritrail Crypto - Digest manifest authentication.
//!
//! This crate provides:
//! - Public key records and the fingerprint-keyed [`KeyRing`]
//! - The [`PublicKeySource`] boundary trait to the upstream key service
//! - RSA PKCS#1-v1.5/SHA-256 verification of digest manifests over their
//!   canonical string-to-sign
//!
//! # Security Philosophy
//!
//! Manifests are only trusted after their signature verifies against a key
//! that was valid for the requested time window. Key-decoding failures are
//! reported opaquely: the underlying decoder's diagnostics never reach
//! user-facing reports.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod digest;
mod error;
mod keys;

pub use digest::{SIGNATURE_ALGORITHM, sha256_hex, string_to_sign, verify_digest_signature};
pub use error::{CryptoError, CryptoResult};
pub use keys::{KeyRing, PublicKeyRecord, PublicKeySource};

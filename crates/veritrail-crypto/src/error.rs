//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during manifest authentication.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A public key could not be DER-decoded.
    ///
    /// Deliberately opaque: the decoder's message is dropped so that
    /// cryptographic diagnostics never leak into reports.
    #[error("unable to load PKCS #1 public key")]
    InvalidPublicKey,

    /// Signature verification failed.
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// The signature metadata names an algorithm this validator does not
    /// speak.
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A signature was not valid hex.
    #[error("invalid hex encoding")]
    InvalidHexEncoding,

    /// A public key value was not valid base64.
    #[error("invalid base64 encoding")]
    InvalidBase64Encoding,

    /// The upstream key service failed.
    #[error("public key lookup failed: {0}")]
    KeyLookup(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

//! RSA/SHA-256 digest manifest verification.
//!
//! The signature covers a canonical string built from manifest fields and
//! the SHA-256 of the raw decompressed body:
//!
//! ```text
//! {digestEndTime}\n{digestS3Bucket}/{digestS3Object}\n{sha256_hex(raw)}\n{previousDigestSignature}
//! ```
//!
//! An absent previous signature canonicalizes to the literal text `null`
//! (not the empty string) to match the producer's canonicalization.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};
use veritrail_core::DigestManifest;

use crate::error::{CryptoError, CryptoResult};

/// The only signature algorithm digests are produced with.
pub const SIGNATURE_ALGORITHM: &str = "SHA256withRSA";

/// Hex-encoded SHA-256 of a byte slice.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Build the canonical string the digest signature covers.
#[must_use]
pub fn string_to_sign(manifest: &DigestManifest, raw: &[u8]) -> String {
    let previous_signature = manifest
        .previous_digest_signature
        .as_deref()
        .unwrap_or("null");
    format!(
        "{}\n{}/{}\n{}\n{}",
        manifest.digest_end_time,
        manifest.digest_s3_bucket,
        manifest.digest_s3_object,
        sha256_hex(raw),
        previous_signature,
    )
}

/// Verify a manifest's out-of-band RSA signature against a candidate key.
///
/// `public_key_b64` is the base64 DER (PKCS#1) key selected from the ring
/// by the manifest's fingerprint; `raw` is the decompressed body exactly as
/// fetched.
///
/// # Errors
///
/// - [`CryptoError::UnsupportedAlgorithm`] when the metadata names anything
///   but `SHA256withRSA`.
/// - [`CryptoError::InvalidBase64Encoding`] / [`CryptoError::InvalidHexEncoding`]
///   when key or signature are not decodable as transport encodings.
/// - [`CryptoError::InvalidPublicKey`] when the DER payload is not an RSA
///   public key (opaque; the decoder's message is discarded).
/// - [`CryptoError::SignatureVerificationFailed`] when the signature does
///   not match.
pub fn verify_digest_signature(
    manifest: &DigestManifest,
    raw: &[u8],
    public_key_b64: &str,
) -> CryptoResult<()> {
    if manifest.signature_algorithm != SIGNATURE_ALGORITHM {
        return Err(CryptoError::UnsupportedAlgorithm(
            manifest.signature_algorithm.clone(),
        ));
    }

    let der = BASE64
        .decode(public_key_b64)
        .map_err(|_| CryptoError::InvalidBase64Encoding)?;
    let public_key =
        RsaPublicKey::from_pkcs1_der(&der).map_err(|_| CryptoError::InvalidPublicKey)?;

    let signature = hex::decode(&manifest.signature_hex)
        .map_err(|_| CryptoError::InvalidHexEncoding)?;

    let hashed = Sha256::digest(string_to_sign(manifest, raw).as_bytes());
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, &signature)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::RsaPrivateKey;
    use rsa::pkcs1::EncodeRsaPublicKey;

    fn test_key() -> (RsaPrivateKey, String) {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let der = private.to_public_key().to_pkcs1_der().unwrap();
        (private, BASE64.encode(der.as_bytes()))
    }

    fn signed_manifest(private: &RsaPrivateKey, raw: &[u8]) -> DigestManifest {
        let mut manifest: DigestManifest = serde_json::from_value(serde_json::json!({
            "digestPublicKeyFingerprint": "fp-1",
            "digestS3Bucket": "audit-bucket",
            "digestS3Object": "digest.json.gz",
            "previousDigestSignature": null,
            "digestStartTime": "2015-08-16T23:17:28Z",
            "digestEndTime": "2015-08-17T00:17:28Z",
        }))
        .unwrap();
        manifest.signature_algorithm = SIGNATURE_ALGORITHM.to_string();

        let hashed = Sha256::digest(string_to_sign(&manifest, raw).as_bytes());
        let signature = private
            .sign(Pkcs1v15Sign::new::<Sha256>(), &hashed)
            .unwrap();
        manifest.signature_hex = hex::encode(signature);
        manifest
    }

    #[test]
    fn test_round_trip_verification() {
        let (private, public_b64) = test_key();
        let raw = b"raw manifest body";
        let manifest = signed_manifest(&private, raw);

        assert!(verify_digest_signature(&manifest, raw, &public_b64).is_ok());
    }

    #[test]
    fn test_tampered_body_fails_as_signature_error() {
        let (private, public_b64) = test_key();
        let manifest = signed_manifest(&private, b"raw manifest body");

        // One flipped byte after signing.
        assert!(matches!(
            verify_digest_signature(&manifest, b"rAw manifest body", &public_b64),
            Err(CryptoError::SignatureVerificationFailed)
        ));
    }

    #[test]
    fn test_null_previous_signature_canonicalizes_to_literal_null() {
        let (private, _) = test_key();
        let raw = b"body";
        let manifest = signed_manifest(&private, raw);

        let canonical = string_to_sign(&manifest, raw);
        assert!(canonical.ends_with("\nnull"));
        assert_eq!(canonical.lines().count(), 4);
    }

    #[test]
    fn test_undecodable_key_is_opaque() {
        let (private, _) = test_key();
        let raw = b"body";
        let manifest = signed_manifest(&private, raw);

        // Valid base64, garbage DER.
        let bogus = BASE64.encode(b"not a DER key");
        let err = verify_digest_signature(&manifest, raw, &bogus).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPublicKey));
        assert_eq!(err.to_string(), "unable to load PKCS #1 public key");
    }

    #[test]
    fn test_wrong_algorithm_rejected() {
        let (private, public_b64) = test_key();
        let raw = b"body";
        let mut manifest = signed_manifest(&private, raw);
        manifest.signature_algorithm = "SHA1withRSA".to_string();

        assert!(matches!(
            verify_digest_signature(&manifest, raw, &public_b64),
            Err(CryptoError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let (private, _) = test_key();
        let (_, other_public) = test_key();
        let raw = b"body";
        let manifest = signed_manifest(&private, raw);

        assert!(matches!(
            verify_digest_signature(&manifest, raw, &other_public),
            Err(CryptoError::SignatureVerificationFailed)
        ));
    }
}

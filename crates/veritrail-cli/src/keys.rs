//! File-backed public key source.
//!
//! Offline validation cannot reach the upstream key service, so signing
//! keys are supplied as a JSON file: an array of
//! `{"fingerprint": "...", "value": "<base64 PKCS#1 DER>"}` records.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use veritrail_crypto::{CryptoResult, PublicKeyRecord, PublicKeySource};

/// A key source loaded once from a JSON file.
#[derive(Debug)]
pub(crate) struct FileKeySource {
    records: Vec<PublicKeyRecord>,
}

impl FileKeySource {
    /// Load key records from `path`.
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("reading keys file {}: {e}", path.display()))?;
        let records: Vec<PublicKeyRecord> = serde_json::from_slice(&raw)
            .map_err(|e| anyhow::anyhow!("parsing keys file {}: {e}", path.display()))?;
        Ok(Self { records })
    }
}

#[async_trait]
impl PublicKeySource for FileKeySource {
    async fn list_public_keys(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> CryptoResult<Vec<PublicKeyRecord>> {
        // The file holds every key the caller trusts; window filtering
        // happened when the file was exported.
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_and_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"fingerprint": "aa", "value": "QUJD"}]"#)
            .unwrap();

        let source = FileKeySource::load(file.path()).unwrap();
        let records = source
            .list_public_keys(Utc::now(), Utc::now())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fingerprint, "aa");
    }

    #[test]
    fn test_malformed_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        assert!(FileKeySource::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_rejected() {
        assert!(FileKeySource::load(Path::new("/nonexistent/keys.json")).is_err());
    }
}

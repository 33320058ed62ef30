//! Filesystem-backed object store.
//!
//! Lays buckets out as directories under a root, for offline validation of
//! a locally synced archive mirror:
//!
//! ```text
//! {root}/{bucket}/.location            # optional region pin
//! {root}/{bucket}/{key}                # object body
//! {root}/{bucket}/{key}.meta.json      # optional user metadata map
//! ```
//!
//! Operations are plain local synchronous I/O, run inline on the async
//! executor.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::object_store::{ObjectPage, ObjectStore, StoredObject};

const META_SUFFIX: &str = ".meta.json";
const LOCATION_FILE: &str = ".location";
const DEFAULT_PAGE_SIZE: usize = 1000;

/// A directory-per-bucket object store mirror.
#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    page_size: usize,
}

impl FsObjectStore {
    /// Open a mirror rooted at `root`. The directory is created if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] when the root cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| StoreError::Transport(format!("create {}: {e}", root.display())))?;
        Ok(Self {
            root,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the listing page size (for pagination tests).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Write an object (and its metadata sidecar) into the mirror.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] on I/O failure.
    pub fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        metadata: &HashMap<String, String>,
    ) -> StoreResult<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Transport(format!("create {}: {e}", parent.display())))?;
        }
        std::fs::write(&path, body)
            .map_err(|e| StoreError::Transport(format!("write {}: {e}", path.display())))?;

        if !metadata.is_empty() {
            let sidecar = sidecar_path(&path);
            let json = serde_json::to_vec_pretty(metadata)
                .map_err(|e| StoreError::Transport(format!("encode metadata: {e}")))?;
            std::fs::write(&sidecar, json)
                .map_err(|e| StoreError::Transport(format!("write {}: {e}", sidecar.display())))?;
        }
        Ok(())
    }

    /// Delete an object and its sidecar. Returns whether the body existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] on I/O failure other than absence.
    pub fn remove_object(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        let path = self.object_path(bucket, key)?;
        let _ = std::fs::remove_file(sidecar_path(&path));
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Transport(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }

    /// Pin a bucket to a region.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] on I/O failure.
    pub fn set_bucket_location(&self, bucket: &str, region: &str) -> StoreResult<()> {
        let dir = self.bucket_dir(bucket)?;
        std::fs::create_dir_all(&dir)
            .map_err(|e| StoreError::Transport(format!("create {}: {e}", dir.display())))?;
        std::fs::write(dir.join(LOCATION_FILE), region)
            .map_err(|e| StoreError::Transport(format!("write location: {e}")))
    }

    fn bucket_dir(&self, bucket: &str) -> StoreResult<PathBuf> {
        validate_component(bucket)?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> StoreResult<PathBuf> {
        let dir = self.bucket_dir(bucket)?;
        let relative = Path::new(key);
        // Keys may contain '/', but never path escapes.
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(StoreError::Transport(format!("unsafe object key: {key}")));
        }
        Ok(dir.join(relative))
    }
}

fn validate_component(bucket: &str) -> StoreResult<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
        return Err(StoreError::Transport(format!("unsafe bucket name: {bucket}")));
    }
    Ok(())
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(META_SUFFIX);
    PathBuf::from(os)
}

fn collect_keys(dir: &Path, base: &Path, keys: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_keys(&path, base, keys)?;
            continue;
        }
        let Ok(relative) = path.strip_prefix(base) else {
            continue;
        };
        let key = relative.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
        if key == LOCATION_FILE || key.ends_with(META_SUFFIX) {
            continue;
        }
        keys.push(key);
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn list_objects(&self, bucket: &str, marker: &str) -> StoreResult<ObjectPage> {
        let dir = self.bucket_dir(bucket)?;
        if !dir.is_dir() {
            return Ok(ObjectPage::default());
        }

        let mut keys = Vec::new();
        collect_keys(&dir, &dir, &mut keys)
            .map_err(|e| StoreError::Transport(format!("list {}: {e}", dir.display())))?;
        keys.sort();
        keys.retain(|key| key.as_str() > marker);

        let next_marker = if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            keys.last().cloned()
        } else {
            None
        };

        Ok(ObjectPage { keys, next_marker })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<StoredObject> {
        let path = self.object_path(bucket, key)?;
        let body = match std::fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                });
            },
            Err(e) => {
                return Err(StoreError::Transport(format!(
                    "read {}: {e}",
                    path.display()
                )));
            },
        };

        let metadata = match std::fs::read(sidecar_path(&path)) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Transport(format!("metadata for {key}: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Transport(format!("metadata for {key}: {e}"))),
        };

        Ok(StoredObject { body, metadata })
    }

    async fn get_bucket_location(&self, bucket: &str) -> StoreResult<Option<String>> {
        let dir = self.bucket_dir(bucket)?;
        match std::fs::read_to_string(dir.join(LOCATION_FILE)) {
            Ok(region) => {
                let region = region.trim().to_string();
                Ok((!region.is_empty()).then_some(region))
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Transport(format!("location for {bucket}: {e}"))),
        }
    }
}

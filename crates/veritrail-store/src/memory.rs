//! In-memory object store for tests and embedding.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::object_store::{ObjectPage, ObjectStore, StoredObject};

const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Default)]
struct MemoryBucket {
    location: Option<String>,
    objects: BTreeMap<String, StoredObject>,
}

/// An in-memory object store.
///
/// Keys are held in a sorted map, so listing semantics (ascending order,
/// strictly-after-marker) match a real provider.
#[derive(Debug)]
pub struct MemoryObjectStore {
    buckets: Mutex<HashMap<String, MemoryBucket>>,
    page_size: usize,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the listing page size (for pagination tests).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Store an object, creating the bucket if needed.
    pub fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        metadata: HashMap<String, String>,
    ) {
        let mut buckets = self.lock();
        buckets
            .entry(bucket.to_string())
            .or_default()
            .objects
            .insert(key.to_string(), StoredObject { body, metadata });
    }

    /// Delete an object. Returns whether it existed.
    pub fn remove_object(&self, bucket: &str, key: &str) -> bool {
        let mut buckets = self.lock();
        buckets
            .get_mut(bucket)
            .is_some_and(|b| b.objects.remove(key).is_some())
    }

    /// Pin a bucket to a region, creating the bucket if needed.
    pub fn set_bucket_location(&self, bucket: &str, region: &str) {
        let mut buckets = self.lock();
        buckets.entry(bucket.to_string()).or_default().location = Some(region.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, MemoryBucket>> {
        // Lock poisoning only happens if a writer panicked; propagating the
        // inner state is still sound for tests.
        match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_objects(&self, bucket: &str, marker: &str) -> StoreResult<ObjectPage> {
        let buckets = self.lock();
        let Some(bucket) = buckets.get(bucket) else {
            return Ok(ObjectPage::default());
        };

        let mut keys: Vec<String> = bucket
            .objects
            .range::<str, _>((
                std::ops::Bound::Excluded(marker),
                std::ops::Bound::Unbounded,
            ))
            .map(|(key, _)| key.clone())
            .take(self.page_size.saturating_add(1))
            .collect();

        let next_marker = if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            keys.last().cloned()
        } else {
            None
        };

        Ok(ObjectPage { keys, next_marker })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<StoredObject> {
        let buckets = self.lock();
        buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn get_bucket_location(&self, bucket: &str) -> StoreResult<Option<String>> {
        let buckets = self.lock();
        Ok(buckets.get(bucket).and_then(|b| b.location.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let store = MemoryObjectStore::new();
        let mut metadata = HashMap::new();
        metadata.insert("signature".to_string(), "00ff".to_string());

        store.put_object("bucket", "a/key", b"body".to_vec(), metadata);

        let object = store.get_object("bucket", "a/key").await.unwrap();
        assert_eq!(object.body, b"body");
        assert_eq!(object.metadata.get("signature").map(String::as_str), Some("00ff"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryObjectStore::new();
        store.put_object("bucket", "exists", Vec::new(), HashMap::new());

        let err = store.get_object("bucket", "missing").await.unwrap_err();
        assert!(err.is_not_found());

        let err = store.get_object("no-bucket", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_listing_is_sorted_and_after_marker() {
        let store = MemoryObjectStore::new();
        for key in ["c", "a", "b", "d"] {
            store.put_object("bucket", key, Vec::new(), HashMap::new());
        }

        let page = store.list_objects("bucket", "").await.unwrap();
        assert_eq!(page.keys, vec!["a", "b", "c", "d"]);
        assert!(page.next_marker.is_none());

        // Strictly after the marker.
        let page = store.list_objects("bucket", "b").await.unwrap();
        assert_eq!(page.keys, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = MemoryObjectStore::new().with_page_size(2);
        for key in ["a", "b", "c", "d", "e"] {
            store.put_object("bucket", key, Vec::new(), HashMap::new());
        }

        let mut collected = Vec::new();
        let mut marker = String::new();
        loop {
            let page = store.list_objects("bucket", &marker).await.unwrap();
            collected.extend(page.keys);
            match page.next_marker {
                Some(next) => marker = next,
                None => break,
            }
        }
        assert_eq!(collected, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_bucket_location() {
        let store = MemoryObjectStore::new();
        store.set_bucket_location("bucket", "eu-west-1");

        assert_eq!(
            store.get_bucket_location("bucket").await.unwrap().as_deref(),
            Some("eu-west-1")
        );
        assert!(store.get_bucket_location("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_object() {
        let store = MemoryObjectStore::new();
        store.put_object("bucket", "key", Vec::new(), HashMap::new());

        assert!(store.remove_object("bucket", "key"));
        assert!(!store.remove_object("bucket", "key"));
        assert!(store.get_object("bucket", "key").await.unwrap_err().is_not_found());
    }
}

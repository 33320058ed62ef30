//! Region-aware client cache.
//!
//! Buckets live in regions, and a client only speaks to one region. The
//! cache resolves bucket→region once (a `get_bucket_location` call issued
//! from the default-region client) and constructs one client per resolved
//! region, reusing both for the lifetime of the verification session.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreResult;
use crate::object_store::ObjectStore;

/// The classic single-region sentinel: what an empty bucket location means.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Constructs clients for a region on demand.
pub trait ObjectStoreFactory: Send + Sync {
    /// Build (or hand out) a client usable against `region`.
    fn create(&self, region: &str) -> Arc<dyn ObjectStore>;
}

#[derive(Default)]
struct CacheState {
    /// bucket name → resolved region.
    regions: HashMap<String, String>,
    /// region → constructed client.
    clients: HashMap<String, Arc<dyn ObjectStore>>,
}

/// Bucket-region-aware client cache, owned by one verification session.
pub struct RegionalClientCache {
    factory: Arc<dyn ObjectStoreFactory>,
    default_region: String,
    state: Mutex<CacheState>,
}

impl RegionalClientCache {
    /// Create a cache over a client factory.
    #[must_use]
    pub fn new(factory: Arc<dyn ObjectStoreFactory>) -> Self {
        Self {
            factory,
            default_region: DEFAULT_REGION.to_string(),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Override the region location lookups are issued from (and that empty
    /// locations resolve to).
    #[must_use]
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = region.into();
        self
    }

    /// Resolve a client usable against `bucket`.
    ///
    /// The first call for a bucket performs exactly one location lookup;
    /// every later call (and every other bucket in the same region) reuses
    /// the cached result.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Transport`] when the location lookup
    /// fails.
    pub async fn client_for_bucket(&self, bucket: &str) -> StoreResult<Arc<dyn ObjectStore>> {
        // The lock is held across the lookup so a bucket is never resolved
        // twice.
        let mut state = self.state.lock().await;

        let region = match state.regions.get(bucket) {
            Some(region) => region.clone(),
            None => {
                let probe = Self::client_for(&mut state, &self.factory, &self.default_region);
                let located = probe.get_bucket_location(bucket).await?;
                let region = located
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| self.default_region.clone());
                debug!(bucket, %region, "resolved bucket location");
                state.regions.insert(bucket.to_string(), region.clone());
                region
            },
        };

        Ok(Self::client_for(&mut state, &self.factory, &region))
    }

    /// Resolve a client for an explicit region, reusing any cached one.
    pub async fn client_for_region(&self, region: &str) -> Arc<dyn ObjectStore> {
        let mut state = self.state.lock().await;
        Self::client_for(&mut state, &self.factory, region)
    }

    fn client_for(
        state: &mut CacheState,
        factory: &Arc<dyn ObjectStoreFactory>,
        region: &str,
    ) -> Arc<dyn ObjectStore> {
        if let Some(client) = state.clients.get(region) {
            return Arc::clone(client);
        }
        debug!(region, "constructing object store client");
        let client = factory.create(region);
        state.clients.insert(region.to_string(), Arc::clone(&client));
        client
    }
}

impl std::fmt::Debug for RegionalClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionalClientCache")
            .field("default_region", &self.default_region)
            .finish_non_exhaustive()
    }
}

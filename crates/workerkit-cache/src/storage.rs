//! Registry of named caches.

use hashbrown::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;
use workerkit_common::Result;

use crate::cache::Cache;
use crate::request::RequestInput;
use crate::response::Response;
use crate::snapshot::Snapshot;

#[derive(Default)]
struct StorageState {
    caches: HashMap<String, Cache>,
    /// Creation order of cache names.
    order: Vec<String>,
}

/// The registry of named caches (the `caches` global).
///
/// Caches are created lazily on first [`open`](Self::open); repeated
/// opens of the same name return handles to the same cache, so
/// mutations through one handle are visible through every other.
/// `CacheStorage` itself is a cheap-clone handle.
#[derive(Clone)]
pub struct CacheStorage {
    base: Arc<Url>,
    state: Arc<RwLock<StorageState>>,
}

impl CacheStorage {
    /// Create an empty registry resolving raw URLs against `base`.
    pub fn new(base: Url) -> Self {
        Self {
            base: Arc::new(base),
            state: Arc::new(RwLock::new(StorageState::default())),
        }
    }

    /// The base origin used for request normalization.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Open the cache for `name`, creating an empty one on first use.
    pub async fn open(&self, name: &str) -> Cache {
        let mut state = self.state.write().await;
        if let Some(cache) = state.caches.get(name) {
            return cache.clone();
        }
        debug!(cache = %name, "creating cache");
        let cache = Cache::new(name, Arc::clone(&self.base));
        state.order.push(name.to_string());
        state.caches.insert(name.to_string(), cache.clone());
        cache
    }

    /// Whether a cache with `name` exists.
    pub async fn has(&self, name: &str) -> bool {
        self.state.read().await.caches.contains_key(name)
    }

    /// Remove the cache registered under `name`, entries and all.
    ///
    /// Returns false if no such cache exists. Handles obtained
    /// earlier stay usable but the name no longer reaches them.
    pub async fn delete(&self, name: &str) -> bool {
        let mut state = self.state.write().await;
        let removed = state.caches.remove(name).is_some();
        if removed {
            state.order.retain(|stored| stored != name);
            debug!(cache = %name, "deleted cache");
        }
        removed
    }

    /// All known cache names, in creation order.
    pub async fn keys(&self) -> Vec<String> {
        self.state.read().await.order.clone()
    }

    /// Look `input` up across every cache, in creation order.
    ///
    /// This is the cross-cache match fetch listeners use for
    /// cache-first strategies; the first hit wins.
    pub async fn match_request(&self, input: impl Into<RequestInput>) -> Result<Option<Response>> {
        let request = input.into().normalize(&self.base)?;
        let state = self.state.read().await;
        for name in &state.order {
            if let Some(cache) = state.caches.get(name) {
                if let Some(response) = cache.match_request(&request).await? {
                    return Ok(Some(response));
                }
            }
        }
        Ok(None)
    }

    /// Read-only structural copy of every cache's contents, for
    /// assertions. Mutating the snapshot never affects live state.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.read().await;
        let mut snapshot = Snapshot::default();
        for (name, cache) in &state.caches {
            snapshot.caches.insert(name.clone(), cache.dump().await);
        }
        snapshot
    }
}

impl std::fmt::Debug for CacheStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStorage")
            .field("base", &self.base.as_str())
            .finish()
    }
}

//! A single named cache.

use hashbrown::HashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;
use url::Url;
use workerkit_common::Result;

use crate::request::{Request, RequestInput};
use crate::response::Response;

struct StoredEntry {
    request: Request,
    response: Response,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, StoredEntry>,
    /// Insertion order of URLs, for deterministic enumeration.
    order: Vec<String>,
}

/// A named URL → response store.
///
/// `Cache` is a handle; clones share state, so every handle obtained
/// for the same name from [`CacheStorage::open`] observes the same
/// entries. Every operation normalizes its request input against the
/// environment's base origin before touching the store.
///
/// [`CacheStorage::open`]: crate::storage::CacheStorage::open
#[derive(Clone)]
pub struct Cache {
    name: String,
    base: Arc<Url>,
    state: Arc<RwLock<CacheState>>,
}

impl Cache {
    pub(crate) fn new(name: &str, base: Arc<Url>) -> Self {
        Self {
            name: name.to_string(),
            base,
            state: Arc::new(RwLock::new(CacheState::default())),
        }
    }

    /// The cache's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store `response` under the normalized URL of `input`,
    /// overwriting any existing entry for that URL.
    pub async fn put(&self, input: impl Into<RequestInput>, response: Response) -> Result<()> {
        let request = input.into().normalize(&self.base)?;
        let url = request.url_str().to_string();
        let mut state = self.state.write().await;
        if !state.entries.contains_key(&url) {
            state.order.push(url.clone());
        }
        trace!(cache = %self.name, url = %url, "cache put");
        state.entries.insert(url, StoredEntry { request, response });
        Ok(())
    }

    /// Look up the stored response for the normalized URL of `input`.
    ///
    /// A miss is `Ok(None)`, never an error.
    pub async fn match_request(&self, input: impl Into<RequestInput>) -> Result<Option<Response>> {
        let request = input.into().normalize(&self.base)?;
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(request.url_str())
            .map(|entry| entry.response.clone()))
    }

    /// Remove the entry for the normalized URL of `input`.
    ///
    /// Returns whether an entry was actually removed.
    pub async fn delete(&self, input: impl Into<RequestInput>) -> Result<bool> {
        let request = input.into().normalize(&self.base)?;
        let url = request.url_str();
        let mut state = self.state.write().await;
        let removed = state.entries.remove(url).is_some();
        if removed {
            state.order.retain(|stored| stored != url);
            trace!(cache = %self.name, url = %url, "cache delete");
        }
        Ok(removed)
    }

    /// The stored requests, in insertion order. Overwriting an entry
    /// keeps its original position.
    pub async fn keys(&self) -> Vec<Request> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|url| state.entries.get(url))
            .map(|entry| entry.request.clone())
            .collect()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Structural dump of the entries for snapshotting: URL → deep
    /// copy of the payload.
    pub(crate) async fn dump(&self) -> BTreeMap<String, serde_json::Value> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .map(|(url, entry)| (url.clone(), entry.response.payload_clone()))
            .collect()
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("name", &self.name).finish()
    }
}

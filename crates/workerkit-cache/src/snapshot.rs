//! Point-in-time cache dumps for assertions.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A read-only structural copy of all cache contents, keyed by cache
/// name and then by resolved request URL.
///
/// Payloads are deep copies; nothing in a snapshot aliases live
/// cache state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// cache name → (URL → payload)
    pub caches: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Snapshot {
    /// The entries of one cache, if it exists.
    pub fn cache(&self, name: &str) -> Option<&BTreeMap<String, Value>> {
        self.caches.get(name)
    }

    /// One stored payload, if both the cache and the URL exist.
    pub fn entry(&self, name: &str, url: &str) -> Option<&Value> {
        self.caches.get(name).and_then(|entries| entries.get(url))
    }

    /// Whether a cache with `name` was present.
    pub fn contains_cache(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// All cache names, sorted.
    pub fn cache_names(&self) -> Vec<&str> {
        self.caches.keys().map(|name| name.as_str()).collect()
    }

    /// Whether no caches were present.
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        let mut entries = BTreeMap::new();
        entries.insert("https://www.test.com/a".to_string(), json!("body"));
        snapshot.caches.insert("v1".to_string(), entries);
        snapshot
    }

    #[test]
    fn test_accessors() {
        let snapshot = snapshot();
        assert!(snapshot.contains_cache("v1"));
        assert!(!snapshot.contains_cache("v2"));
        assert_eq!(
            snapshot.entry("v1", "https://www.test.com/a"),
            Some(&json!("body"))
        );
        assert_eq!(snapshot.cache_names(), vec!["v1"]);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_serializes_by_name_then_url() {
        let json = serde_json::to_value(snapshot()).unwrap();
        assert_eq!(json["caches"]["v1"]["https://www.test.com/a"], json!("body"));
    }
}

//! Leaf API shims: small value objects worker code expects to find
//! in its global scope. None of them hold interesting state
//! machines; they exist so code under test can run unmodified.

use hashbrown::HashMap;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::trace;
use url::Url;
use workerkit_common::{Result, WorkerKitError};

/// Monotonic clock anchored at scope construction.
#[derive(Debug, Clone)]
pub struct Performance {
    origin: Instant,
}

impl Performance {
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the scope was created.
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Records the script URLs worker code imports.
#[derive(Clone)]
pub struct ScriptImporter {
    base: Arc<Url>,
    imported: Arc<Mutex<Vec<Url>>>,
}

impl ScriptImporter {
    pub(crate) fn new(base: Arc<Url>) -> Self {
        Self {
            base,
            imported: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record an import, resolving `url` against the scope origin.
    pub fn import(&self, url: &str) -> Result<()> {
        let resolved = self
            .base
            .join(url)
            .map_err(|e| WorkerKitError::invalid_url(url, e))?;
        trace!(url = %resolved, "import script");
        self.imported
            .lock()
            .expect("importer lock poisoned")
            .push(resolved);
        Ok(())
    }

    /// The imported URLs, in import order.
    pub fn imported(&self) -> Vec<Url> {
        self.imported
            .lock()
            .expect("importer lock poisoned")
            .clone()
    }
}

impl std::fmt::Debug for ScriptImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptImporter")
            .field("imported", &self.imported().len())
            .finish()
    }
}

/// Per-scope buffers backing [`BroadcastChannel`].
#[derive(Default)]
pub(crate) struct ChannelHub {
    buffers: Mutex<HashMap<String, Arc<Mutex<Vec<Value>>>>>,
}

impl ChannelHub {
    pub(crate) fn channel(&self, name: &str) -> BroadcastChannel {
        let mut buffers = self.buffers.lock().expect("channel hub poisoned");
        let buffer = buffers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone();
        BroadcastChannel {
            name: name.to_string(),
            buffer,
        }
    }
}

/// A named in-memory pub/sub channel stub.
///
/// Channels opened under the same name within one scope share a
/// buffer: posting on one is visible on all.
#[derive(Clone)]
pub struct BroadcastChannel {
    name: String,
    buffer: Arc<Mutex<Vec<Value>>>,
}

impl BroadcastChannel {
    /// The channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a message to the shared buffer.
    pub fn post_message(&self, message: impl Into<Value>) {
        self.buffer
            .lock()
            .expect("channel buffer poisoned")
            .push(message.into());
    }

    /// Copy of the buffered messages, in post order.
    pub fn messages(&self) -> Vec<Value> {
        self.buffer.lock().expect("channel buffer poisoned").clone()
    }

    /// Take the buffered messages, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Value> {
        std::mem::take(&mut *self.buffer.lock().expect("channel buffer poisoned"))
    }
}

impl std::fmt::Debug for BroadcastChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastChannel")
            .field("name", &self.name)
            .finish()
    }
}

/// File-reading stub: "reads" caller-provided bytes as text.
#[derive(Debug, Clone, Default)]
pub struct FileReader {
    result: Option<String>,
}

impl FileReader {
    /// Decode `bytes` as UTF-8 text (lossily) and store the result.
    pub fn read_as_text(&mut self, bytes: &[u8]) {
        self.result = Some(String::from_utf8_lossy(bytes).into_owned());
    }

    /// The last read result, if any read has happened.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }
}

/// URL-query-parameter parser, the `URLSearchParams` stand-in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    /// Parse a query string; a leading `?` is tolerated.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// Parse the query portion of a URL.
    pub fn from_url(url: &Url) -> Self {
        Self::parse(url.query().unwrap_or(""))
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Append a key/value pair.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Serialize back into a query string (no leading `?`).
    pub fn to_query(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_performance_is_monotonic_and_positive() {
        let performance = Performance::new();
        let first = performance.now();
        let second = performance.now();
        assert!(first > 0.0);
        assert!(second >= first);
    }

    #[test]
    fn test_importer_resolves_and_records() {
        let base = Arc::new(Url::parse("https://www.test.com").unwrap());
        let importer = ScriptImporter::new(base);
        importer.import("/sw-helpers.js").unwrap();
        importer.import("https://cdn.example/lib.js").unwrap();

        let imported = importer.imported();
        assert_eq!(imported[0].as_str(), "https://www.test.com/sw-helpers.js");
        assert_eq!(imported[1].as_str(), "https://cdn.example/lib.js");
    }

    #[test]
    fn test_broadcast_channels_share_by_name() {
        let hub = ChannelHub::default();
        let a = hub.channel("updates");
        let b = hub.channel("updates");
        let other = hub.channel("other");

        a.post_message(json!(1));
        b.post_message(json!(2));

        assert_eq!(a.messages(), vec![json!(1), json!(2)]);
        assert!(other.messages().is_empty());

        assert_eq!(b.drain().len(), 2);
        assert!(a.messages().is_empty());
    }

    #[test]
    fn test_file_reader_roundtrip() {
        let mut reader = FileReader::default();
        assert!(reader.result().is_none());
        reader.read_as_text(b"hello");
        assert_eq!(reader.result(), Some("hello"));
    }

    #[test]
    fn test_search_params_parse_and_get() {
        let params = SearchParams::parse("?a=1&b=two&a=3");
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get_all("a"), vec!["1", "3"]);
        assert_eq!(params.get("b"), Some("two"));
        assert!(params.get("c").is_none());
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_search_params_append_and_serialize() {
        let mut params = SearchParams::default();
        params.append("q", "service worker");
        params.append("page", "2");
        assert_eq!(params.to_query(), "q=service+worker&page=2");
    }

    #[test]
    fn test_search_params_from_url() {
        let url = Url::parse("https://www.test.com/search?q=x").unwrap();
        let params = SearchParams::from_url(&url);
        assert_eq!(params.get("q"), Some("x"));
        assert!(SearchParams::from_url(&Url::parse("https://www.test.com/").unwrap()).is_empty());
    }
}

//! Request normalization.
//!
//! Cache keys are resolved absolute URLs. Callers hand the
//! environment either a raw URL string or an already-built
//! [`Request`]; both flow through [`RequestInput::normalize`] so the
//! two forms of the same address collide in the cache.

use serde_json::{Map, Value};
use url::Url;
use workerkit_common::{Result, WorkerKitError};

/// A canonical request: a fully-resolved absolute URL plus any
/// passthrough fields supplied by the caller.
///
/// Two requests are cache-equivalent iff their resolved URLs are
/// equal as strings; passthrough fields never participate in
/// identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    url: Url,
    fields: Map<String, Value>,
}

impl Request {
    /// Create a request from an already-absolute URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            fields: Map::new(),
        }
    }

    /// Parse an absolute URL string into a request.
    ///
    /// Relative URLs are rejected here; resolve them through
    /// [`RequestInput::normalize`] with a base origin instead.
    pub fn parse(url: &str) -> Result<Self> {
        Url::parse(url)
            .map(Self::new)
            .map_err(|e| WorkerKitError::invalid_url(url, e))
    }

    /// Attach a passthrough field. The environment carries these
    /// untouched; only the URL is inspected.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The resolved absolute URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The resolved URL as a string, the cache key.
    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }

    /// Look up a passthrough field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All passthrough fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Request input as supplied by callers: either a raw URL string
/// that still needs resolving, or a structured request used as-is.
#[derive(Debug, Clone)]
pub enum RequestInput {
    /// A URL string, possibly relative to the environment's origin.
    RawUrl(String),
    /// An already-normalized request.
    Structured(Request),
}

impl RequestInput {
    /// Resolve this input into a canonical [`Request`].
    ///
    /// Raw URLs are joined against `base`; structured requests pass
    /// through unchanged. Every cache operation and the fetch-event
    /// construction path call this, so listener code only ever
    /// observes resolved requests.
    pub fn normalize(self, base: &Url) -> Result<Request> {
        match self {
            RequestInput::RawUrl(raw) => base
                .join(&raw)
                .map(Request::new)
                .map_err(|e| WorkerKitError::invalid_url(raw, e)),
            RequestInput::Structured(request) => Ok(request),
        }
    }
}

impl From<&str> for RequestInput {
    fn from(url: &str) -> Self {
        RequestInput::RawUrl(url.to_string())
    }
}

impl From<String> for RequestInput {
    fn from(url: String) -> Self {
        RequestInput::RawUrl(url)
    }
}

impl From<&String> for RequestInput {
    fn from(url: &String) -> Self {
        RequestInput::RawUrl(url.clone())
    }
}

impl From<Request> for RequestInput {
    fn from(request: Request) -> Self {
        RequestInput::Structured(request)
    }
}

impl From<&Request> for RequestInput {
    fn from(request: &Request) -> Self {
        RequestInput::Structured(request.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.test.com").unwrap()
    }

    #[test]
    fn test_raw_url_resolves_against_base() {
        let request = RequestInput::from("/test").normalize(&base()).unwrap();
        assert_eq!(request.url_str(), "https://www.test.com/test");
    }

    #[test]
    fn test_absolute_raw_url_keeps_origin() {
        let request = RequestInput::from("https://other.example/a")
            .normalize(&base())
            .unwrap();
        assert_eq!(request.url_str(), "https://other.example/a");
    }

    #[test]
    fn test_structured_passes_through() {
        let original = Request::parse("https://www.test.com/x").unwrap();
        let normalized = RequestInput::from(&original).normalize(&base()).unwrap();
        assert_eq!(normalized, original);
    }

    #[test]
    fn test_string_and_structured_share_key() {
        let from_string = RequestInput::from("/same").normalize(&base()).unwrap();
        let from_request = RequestInput::from(Request::parse("https://www.test.com/same").unwrap())
            .normalize(&base())
            .unwrap();
        assert_eq!(from_string.url_str(), from_request.url_str());
    }

    #[test]
    fn test_passthrough_fields_kept() {
        let request = Request::parse("https://www.test.com/api")
            .unwrap()
            .with_field("method", "POST");
        assert_eq!(request.field("method"), Some(&"POST".into()));
        assert!(request.field("mode").is_none());
    }

    #[test]
    fn test_relative_parse_is_rejected() {
        assert!(Request::parse("/relative").is_err());
    }
}

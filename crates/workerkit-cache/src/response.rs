//! Opaque response values.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;

/// An opaque response payload.
///
/// The environment never inspects or mutates the payload; it only
/// stores and returns it. Clones share the same allocation, so a
/// response retrieved from a cache is the exact value that was
/// stored ([`Response::ptr_eq`] observes this).
#[derive(Debug, Clone)]
pub struct Response {
    payload: Arc<Value>,
}

impl Response {
    /// Wrap a caller-defined payload.
    pub fn new(payload: impl Into<Value>) -> Self {
        Self {
            payload: Arc::new(payload.into()),
        }
    }

    /// The stored payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Deep copy of the payload, detached from this response.
    pub fn payload_clone(&self) -> Value {
        (*self.payload).clone()
    }

    /// Whether two responses are the same stored value, not merely
    /// structurally equal.
    pub fn ptr_eq(a: &Response, b: &Response) -> bool {
        Arc::ptr_eq(&a.payload, &b.payload)
    }
}

impl PartialEq for Response {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
    }
}

impl From<Value> for Response {
    fn from(payload: Value) -> Self {
        Self::new(payload)
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}

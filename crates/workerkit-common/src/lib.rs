//! # WorkerKit Common
//!
//! Shared error types and logging configuration for the WorkerKit
//! service-worker test environment.
//!
//! ## Features
//!
//! - Unified error type used across all WorkerKit crates
//! - Logging configuration and setup

use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};

/// Unified error type for WorkerKit.
#[derive(Error, Debug, Clone)]
pub enum WorkerKitError {
    /// A URL string could not be parsed or resolved against the base
    /// origin.
    #[error("Invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A listener failed synchronously during dispatch.
    #[error("Listener error: {0}")]
    Listener(String),

    /// The network-fetch hook (or work depending on it) failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A fetch was attempted before a handler was installed.
    #[error("No fetch handler installed")]
    NoFetchHandler,

    /// An event was asked for a capability its type does not carry.
    #[error("{event_type:?} event does not support {capability}")]
    Capability {
        event_type: String,
        capability: &'static str,
    },
}

impl WorkerKitError {
    /// Create an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Create a listener error.
    pub fn listener(message: impl Into<String>) -> Self {
        Self::Listener(message.into())
    }

    /// Create a fetch error.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    /// Create a capability error.
    pub fn capability(event_type: impl Into<String>, capability: &'static str) -> Self {
        Self::Capability {
            event_type: event_type.into(),
            capability,
        }
    }

    /// Get the error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            WorkerKitError::InvalidUrl { .. } => "invalid_url",
            WorkerKitError::Listener(_) => "listener",
            WorkerKitError::Fetch(_) => "fetch",
            WorkerKitError::NoFetchHandler => "no_fetch_handler",
            WorkerKitError::Capability { .. } => "capability",
        }
    }
}

/// Result type alias for WorkerKit operations.
pub type Result<T> = std::result::Result<T, WorkerKitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(WorkerKitError::listener("boom").category(), "listener");
        assert_eq!(WorkerKitError::fetch("down").category(), "fetch");
        assert_eq!(WorkerKitError::NoFetchHandler.category(), "no_fetch_handler");
    }

    #[test]
    fn test_invalid_url_display() {
        let err = url::Url::parse("not a url").unwrap_err();
        let wrapped = WorkerKitError::invalid_url("not a url", err);
        assert!(wrapped.to_string().contains("not a url"));
        assert_eq!(wrapped.category(), "invalid_url");
    }

    #[test]
    fn test_capability_display() {
        let err = WorkerKitError::capability("install", "respond_with");
        assert!(err.to_string().contains("install"));
        assert!(err.to_string().contains("respond_with"));
    }
}

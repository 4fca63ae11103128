//! Environment configuration.

use url::Url;
use workerkit_common::{Result, WorkerKitError};

use crate::scope::GlobalScope;

/// Base origin relative URLs resolve against when none is
/// configured. Matches the origin the emulated environment has
/// always used, so harness fixtures can rely on stable cache keys.
pub const DEFAULT_ORIGIN: &str = "https://www.test.com";

/// Configuration for one environment instance.
///
/// A config is built once and turned into a [`GlobalScope`] with
/// [`install`](Self::install). Environments are not mutated between
/// tests; build a fresh config and scope instead.
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    /// Base origin used to resolve relative URLs.
    pub origin: Url,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            // the constant is known-good; parse cannot fail
            origin: Url::parse(DEFAULT_ORIGIN).expect("default origin parses"),
        }
    }
}

impl ScopeConfig {
    /// Create a config with an explicit base origin.
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }

    /// Create a config from an origin string.
    pub fn with_origin(origin: &str) -> Result<Self> {
        Url::parse(origin)
            .map(Self::new)
            .map_err(|e| WorkerKitError::invalid_url(origin, e))
    }

    /// Install this configuration into a fresh global scope.
    pub fn install(self) -> GlobalScope {
        GlobalScope::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origin() {
        let config = ScopeConfig::default();
        assert_eq!(config.origin.as_str(), "https://www.test.com/");
    }

    #[test]
    fn test_with_origin() {
        let config = ScopeConfig::with_origin("https://app.example").unwrap();
        assert_eq!(config.origin.host_str(), Some("app.example"));
        assert!(ScopeConfig::with_origin("nope").is_err());
    }

    #[test]
    fn test_install_carries_origin() {
        let scope = ScopeConfig::with_origin("https://app.example")
            .unwrap()
            .install();
        assert_eq!(scope.origin().host_str(), Some("app.example"));
    }
}

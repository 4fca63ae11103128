//! # WorkerKit Cache
//!
//! Named request/response caches for the WorkerKit service-worker
//! test environment.
//!
//! ## Features
//!
//! - **Normalization**: string and structured request input collapse
//!   to one canonical request keyed by absolute URL
//! - **Cache**: a single named URL → response store
//! - **CacheStorage**: registry of named caches, created on first open
//! - **Snapshot**: mutation-safe structural dump for assertions
//!
//! ## Architecture
//!
//! ```text
//! CacheStorage (caches)
//!     └── Cache ("precache-v1", "runtime", ...)
//!             └── resolved URL → Response (opaque payload)
//! ```
//!
//! Everything is in-memory and scoped to one environment instance;
//! handles are cheap clones sharing the same state, so two `open`
//! calls for the same name observe each other's mutations.

pub mod cache;
pub mod request;
pub mod response;
pub mod snapshot;
pub mod storage;

pub use cache::Cache;
pub use request::{Request, RequestInput};
pub use response::Response;
pub use snapshot::Snapshot;
pub use storage::CacheStorage;

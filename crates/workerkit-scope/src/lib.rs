//! # WorkerKit Scope
//!
//! The emulated global scope for the WorkerKit service-worker test
//! environment: event registration, the trigger engine, the named
//! cache storage handle, the caller-supplied network-fetch hook, and
//! the small leaf API shims worker code expects to find.
//!
//! ## Architecture
//!
//! ```text
//! ScopeConfig ── install() ──→ GlobalScope
//!     │                            ├── EventRegistry   (add_event_listener)
//!     │                            ├── CacheStorage    (caches)
//!     │                            ├── NetFetcher      (fetch hook)
//!     │                            └── shims           (clock, importer, ...)
//!     └── base origin
//!
//! trigger(type, args)
//!     → build event → run listeners in order → await collected
//!       completion tokens → TriggerOutcome
//! ```
//!
//! One scope per test: construct from a [`ScopeConfig`], drive it,
//! discard it. There is no reset; deterministic isolation comes from
//! re-creation.
//!
//! ## Example
//!
//! ```no_run
//! use workerkit_cache::Response;
//! use workerkit_scope::{ScopeConfig, Trigger};
//!
//! # async fn demo() -> workerkit_common::Result<()> {
//! let scope = ScopeConfig::default().install();
//! let caches = scope.caches();
//!
//! scope.add_event_listener("fetch", move |event| {
//!     let request = event.request().cloned().expect("fetch event");
//!     let caches = caches.clone();
//!     event.respond_with(async move {
//!         match caches.match_request(&request).await? {
//!             Some(hit) => Ok(hit),
//!             None => Ok(Response::new("offline fallback")),
//!         }
//!     })
//! });
//!
//! let outcome = scope.trigger(Trigger::fetch("/index.html")).await?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod scope;
pub mod shims;
pub mod trigger;

pub use config::{ScopeConfig, DEFAULT_ORIGIN};
pub use scope::{GlobalScope, NetFetcher};
pub use shims::{BroadcastChannel, FileReader, Performance, ScriptImporter, SearchParams};
pub use trigger::{Trigger, TriggerOutcome};

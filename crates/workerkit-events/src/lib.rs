//! # WorkerKit Events
//!
//! Listener registration and event objects for the WorkerKit
//! service-worker test environment.
//!
//! ## Features
//!
//! - **EventRegistry**: per-type ordered listener lists, type-agnostic
//! - **Extendable events**: install/activate with `wait_until`
//! - **FetchEvent**: normalized request plus `respond_with`
//! - **Message / Sync events**: payload wrappers with `wait_until`
//!
//! The registry knows nothing about event semantics; it stores and
//! enumerates listeners. Event shapes, and which completion
//! capability each type carries, live in [`event`]. The trigger
//! engine that ties the two together lives in `workerkit-scope`.

pub mod event;
pub mod registry;

pub use event::{
    CompletionToken, Event, EventTokens, ExtendableEvent, FetchEvent, GenericEvent, MessageEvent,
    ResponseToken, SyncEvent,
};
pub use registry::{EventRegistry, Listener};

//! Listener registration, independent of event semantics.

use hashbrown::HashMap;
use std::sync::{Arc, RwLock};
use tracing::trace;
use workerkit_common::Result;

use crate::event::Event;

/// A registered listener. Listeners run synchronously during
/// dispatch; asynchronous work is attached to the event through its
/// completion capabilities, not returned.
pub type Listener = Arc<dyn Fn(&mut Event) -> Result<()> + Send + Sync>;

#[derive(Default)]
struct RegistryState {
    listeners: HashMap<String, Vec<Listener>>,
    /// First-registration order of event types.
    order: Vec<String>,
}

/// Ordered listener lists keyed by event-type string.
///
/// The registry is type-agnostic: any type string is accepted, and
/// registering the same listener twice accumulates two entries.
/// Listener lifetime equals environment lifetime; there is no
/// removal.
#[derive(Default)]
pub struct EventRegistry {
    state: RwLock<RegistryState>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` to the ordered list for `event_type`.
    pub fn add_listener<F>(&self, event_type: &str, listener: F)
    where
        F: Fn(&mut Event) -> Result<()> + Send + Sync + 'static,
    {
        let mut state = self.state.write().expect("listener registry poisoned");
        trace!(event_type = %event_type, "registering listener");
        if !state.listeners.contains_key(event_type) {
            state.order.push(event_type.to_string());
        }
        state
            .listeners
            .entry(event_type.to_string())
            .or_default()
            .push(Arc::new(listener));
    }

    /// Whether any listener is registered for `event_type`.
    pub fn has_type(&self, event_type: &str) -> bool {
        self.state
            .read()
            .expect("listener registry poisoned")
            .listeners
            .contains_key(event_type)
    }

    /// Number of distinct event types with at least one listener.
    pub fn type_count(&self) -> usize {
        self.state
            .read()
            .expect("listener registry poisoned")
            .listeners
            .len()
    }

    /// Number of listeners registered for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.state
            .read()
            .expect("listener registry poisoned")
            .listeners
            .get(event_type)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// The registered event types, in first-registration order.
    pub fn event_types(&self) -> Vec<String> {
        self.state
            .read()
            .expect("listener registry poisoned")
            .order
            .clone()
    }

    /// Snapshot of the listener list for `event_type`, in
    /// registration order. Dispatch iterates the snapshot, so a
    /// listener registering further listeners affects the next
    /// trigger, not the current one.
    pub fn listeners_for(&self, event_type: &str) -> Vec<Listener> {
        self.state
            .read()
            .expect("listener registry poisoned")
            .listeners
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("type_count", &self.type_count())
            .finish()
    }
}

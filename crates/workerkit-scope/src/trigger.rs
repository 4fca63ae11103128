//! Trigger requests and their results.

use serde_json::Value;
use workerkit_cache::{RequestInput, Response};

/// What to dispatch: one variant per event shape the engine knows,
/// plus a catch-all for unrecognized types.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Dispatch an install event.
    Install,
    /// Dispatch an activate event.
    Activate,
    /// Dispatch a fetch event for the given request input; raw URLs
    /// are normalized against the scope's origin first.
    Fetch(RequestInput),
    /// Dispatch a cross-context message event.
    Message(Value),
    /// Dispatch a background-sync event.
    Sync { tag: String, last_chance: bool },
    /// Dispatch a minimal event carrying positional args.
    Custom {
        event_type: String,
        args: Vec<Value>,
    },
}

impl Trigger {
    /// Build a fetch trigger from a URL string or request.
    pub fn fetch(input: impl Into<RequestInput>) -> Self {
        Trigger::Fetch(input.into())
    }

    /// Build a message trigger.
    pub fn message(data: impl Into<Value>) -> Self {
        Trigger::Message(data.into())
    }

    /// Build a sync trigger that is not a last-chance attempt.
    pub fn sync(tag: impl Into<String>) -> Self {
        Trigger::Sync {
            tag: tag.into(),
            last_chance: false,
        }
    }

    /// Build a trigger for an arbitrary event type.
    pub fn custom(event_type: impl Into<String>, args: Vec<Value>) -> Self {
        Trigger::Custom {
            event_type: event_type.into(),
            args,
        }
    }

    /// The event-type string listeners register under.
    pub fn event_type(&self) -> &str {
        match self {
            Trigger::Install => "install",
            Trigger::Activate => "activate",
            Trigger::Fetch(_) => "fetch",
            Trigger::Message(_) => "message",
            Trigger::Sync { .. } => "sync",
            Trigger::Custom { event_type, .. } => event_type,
        }
    }
}

/// The declared result of a trigger call once every collected
/// completion token has settled.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// All deferred work settled; no payload (install, activate,
    /// message, sync, and unrecognized types).
    Settled,
    /// The responses supplied via respond-with across listeners, in
    /// call order (fetch).
    Responses(Vec<Response>),
}

impl TriggerOutcome {
    /// The response sequence; empty for [`Settled`](Self::Settled).
    pub fn responses(&self) -> &[Response] {
        match self {
            TriggerOutcome::Responses(responses) => responses,
            TriggerOutcome::Settled => &[],
        }
    }

    /// Consume the outcome into its response sequence.
    pub fn into_responses(self) -> Vec<Response> {
        match self {
            TriggerOutcome::Responses(responses) => responses,
            TriggerOutcome::Settled => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_types() {
        assert_eq!(Trigger::Install.event_type(), "install");
        assert_eq!(Trigger::Activate.event_type(), "activate");
        assert_eq!(Trigger::fetch("/x").event_type(), "fetch");
        assert_eq!(Trigger::message(json!(1)).event_type(), "message");
        assert_eq!(Trigger::sync("tag").event_type(), "sync");
        assert_eq!(Trigger::custom("push", vec![]).event_type(), "push");
    }

    #[test]
    fn test_outcome_responses() {
        assert!(TriggerOutcome::Settled.responses().is_empty());
        let outcome = TriggerOutcome::Responses(vec![Response::new("x")]);
        assert_eq!(outcome.responses().len(), 1);
        assert_eq!(outcome.into_responses().len(), 1);
    }
}

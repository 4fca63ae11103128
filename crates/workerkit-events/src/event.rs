//! Event objects, one shape per event type.
//!
//! An event is constructed fresh per trigger call, handed to every
//! listener in registration order, then torn down into its collected
//! completion tokens ([`Event::into_tokens`]) for the engine to
//! await. Listeners never return work directly; they attach it to
//! the event through `wait_until` / `respond_with`.

use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use workerkit_cache::{Request, Response};
use workerkit_common::{Result, WorkerKitError};

/// A future-like handle a listener registers to signal pending work
/// the dispatcher must wait for.
pub type CompletionToken = BoxFuture<'static, Result<()>>;

/// A deferred response supplied through `respond_with`.
pub type ResponseToken = BoxFuture<'static, Result<Response>>;

/// An install/activate-style event: carries no payload, only the
/// defer-completion capability.
pub struct ExtendableEvent {
    event_type: String,
    pending: Vec<CompletionToken>,
}

impl ExtendableEvent {
    fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            pending: Vec::new(),
        }
    }

    /// The event type this event was constructed for.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Register pending work the trigger call must wait for before
    /// resolving. May be called any number of times per listener.
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.pending.push(Box::pin(work));
    }
}

/// A fetch event: the normalized request plus the respond-with
/// capability.
pub struct FetchEvent {
    request: Request,
    responses: Vec<ResponseToken>,
    pending: Vec<CompletionToken>,
}

impl FetchEvent {
    fn new(request: Request) -> Self {
        Self {
            request,
            responses: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// The normalized request being fetched.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Supply the eventual response for this fetch. Each call adds
    /// one element to the trigger call's result sequence, in call
    /// order across all listeners.
    pub fn respond_with<F>(&mut self, response: F)
    where
        F: Future<Output = Result<Response>> + Send + 'static,
    {
        self.responses.push(Box::pin(response));
    }

    /// Register pending side work, independent of the response.
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.pending.push(Box::pin(work));
    }
}

/// A cross-context message event: opaque data plus optional
/// origin/source markers, extendable like install/activate.
pub struct MessageEvent {
    data: Value,
    origin: Option<String>,
    source: Option<String>,
    pending: Vec<CompletionToken>,
}

impl MessageEvent {
    fn new(data: Value) -> Self {
        Self {
            data,
            origin: None,
            source: None,
            pending: Vec::new(),
        }
    }

    /// The message payload.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The sending context's origin, if one was attached.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// An identifier for the sending context, if one was attached.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_origin(&mut self, origin: impl Into<String>) {
        self.origin = Some(origin.into());
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    /// Register pending work the trigger call must wait for.
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.pending.push(Box::pin(work));
    }
}

/// A background-sync event marker.
pub struct SyncEvent {
    tag: String,
    last_chance: bool,
    pending: Vec<CompletionToken>,
}

impl SyncEvent {
    fn new(tag: impl Into<String>, last_chance: bool) -> Self {
        Self {
            tag: tag.into(),
            last_chance,
            pending: Vec::new(),
        }
    }

    /// The sync registration tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether the host would retry this sync again on failure.
    pub fn last_chance(&self) -> bool {
        self.last_chance
    }

    /// Register pending work the trigger call must wait for.
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.pending.push(Box::pin(work));
    }
}

/// A minimal event for types the engine has no special protocol for:
/// just the type name and positional arguments.
pub struct GenericEvent {
    event_type: String,
    args: Vec<Value>,
}

impl GenericEvent {
    fn new(event_type: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            event_type: event_type.into(),
            args,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The positional arguments the trigger call supplied.
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

/// The event object handed to listeners, tagged by type.
pub enum Event {
    Install(ExtendableEvent),
    Activate(ExtendableEvent),
    Fetch(FetchEvent),
    Message(MessageEvent),
    Sync(SyncEvent),
    Generic(GenericEvent),
}

impl Event {
    /// Build an install event.
    pub fn install() -> Self {
        Event::Install(ExtendableEvent::new("install"))
    }

    /// Build an activate event.
    pub fn activate() -> Self {
        Event::Activate(ExtendableEvent::new("activate"))
    }

    /// Build a fetch event for an already-normalized request.
    pub fn fetch(request: Request) -> Self {
        Event::Fetch(FetchEvent::new(request))
    }

    /// Build a message event.
    pub fn message(data: Value) -> Self {
        Event::Message(MessageEvent::new(data))
    }

    /// Build a background-sync event.
    pub fn sync(tag: impl Into<String>, last_chance: bool) -> Self {
        Event::Sync(SyncEvent::new(tag, last_chance))
    }

    /// Build a generic event for an unrecognized type.
    pub fn generic(event_type: impl Into<String>, args: Vec<Value>) -> Self {
        Event::Generic(GenericEvent::new(event_type, args))
    }

    /// The event type tag.
    pub fn event_type(&self) -> &str {
        match self {
            Event::Install(e) | Event::Activate(e) => e.event_type(),
            Event::Fetch(_) => "fetch",
            Event::Message(_) => "message",
            Event::Sync(_) => "sync",
            Event::Generic(e) => e.event_type(),
        }
    }

    /// The normalized request, for fetch events.
    pub fn request(&self) -> Option<&Request> {
        match self {
            Event::Fetch(e) => Some(e.request()),
            _ => None,
        }
    }

    /// Positional arguments, for generic events.
    pub fn args(&self) -> &[Value] {
        match self {
            Event::Generic(e) => e.args(),
            _ => &[],
        }
    }

    /// Register pending work on any extendable event type.
    ///
    /// Fails with a capability error on generic events, which carry
    /// no completion protocol.
    pub fn wait_until<F>(&mut self, work: F) -> Result<()>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        match self {
            Event::Install(e) | Event::Activate(e) => e.wait_until(work),
            Event::Fetch(e) => e.wait_until(work),
            Event::Message(e) => e.wait_until(work),
            Event::Sync(e) => e.wait_until(work),
            Event::Generic(e) => {
                return Err(WorkerKitError::capability(e.event_type(), "wait_until"))
            }
        }
        Ok(())
    }

    /// Supply a deferred response; only fetch events accept one.
    pub fn respond_with<F>(&mut self, response: F) -> Result<()>
    where
        F: Future<Output = Result<Response>> + Send + 'static,
    {
        match self {
            Event::Fetch(e) => {
                e.respond_with(response);
                Ok(())
            }
            other => Err(WorkerKitError::capability(
                other.event_type(),
                "respond_with",
            )),
        }
    }

    /// Tear the event down into the tokens collected during
    /// dispatch. Tokens registered after this point are lost, which
    /// is exactly the "no late registration" contract.
    pub fn into_tokens(self) -> EventTokens {
        match self {
            Event::Install(e) | Event::Activate(e) => EventTokens {
                responses: Vec::new(),
                pending: e.pending,
            },
            Event::Fetch(e) => EventTokens {
                responses: e.responses,
                pending: e.pending,
            },
            Event::Message(e) => EventTokens {
                responses: Vec::new(),
                pending: e.pending,
            },
            Event::Sync(e) => EventTokens {
                responses: Vec::new(),
                pending: e.pending,
            },
            Event::Generic(_) => EventTokens {
                responses: Vec::new(),
                pending: Vec::new(),
            },
        }
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type())
            .finish()
    }
}

/// Completion tokens drained from a dispatched event.
pub struct EventTokens {
    /// Deferred responses, in respond-with call order.
    pub responses: Vec<ResponseToken>,
    /// Deferred side work, in wait-until call order.
    pub pending: Vec<CompletionToken>,
}

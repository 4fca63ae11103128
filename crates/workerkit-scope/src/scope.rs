//! The global scope and its trigger engine.

use futures::future::{self, BoxFuture};
use std::future::Future;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace, warn};
use url::Url;
use workerkit_cache::{CacheStorage, Request, RequestInput, Response, Snapshot};
use workerkit_common::{Result, WorkerKitError};
use workerkit_events::{Event, EventRegistry, Listener};

use crate::config::ScopeConfig;
use crate::shims::{BroadcastChannel, ChannelHub, FileReader, Performance, ScriptImporter};
use crate::trigger::{Trigger, TriggerOutcome};

type FetchFn = Arc<dyn Fn(Request) -> BoxFuture<'static, Result<Response>> + Send + Sync>;

/// The caller-supplied network-fetch hook.
///
/// `NetFetcher` is a cheap-clone handle; listener futures capture a
/// clone and the handler is looked up at call time, so a test may
/// install or swap the handler after listeners are wired up.
/// Fetching with no handler installed fails with
/// [`WorkerKitError::NoFetchHandler`].
#[derive(Clone)]
pub struct NetFetcher {
    base: Arc<Url>,
    handler: Arc<RwLock<Option<FetchFn>>>,
}

impl NetFetcher {
    fn new(base: Arc<Url>) -> Self {
        Self {
            base,
            handler: Arc::new(RwLock::new(None)),
        }
    }

    /// Install (or replace) the network-fetch handler.
    pub fn set_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response>> + Send + 'static,
    {
        let boxed: FetchFn = Arc::new(move |request| Box::pin(handler(request)));
        *self.handler.write().expect("fetch handler lock poisoned") = Some(boxed);
    }

    /// Remove the handler; later fetches fail again.
    pub fn clear_handler(&self) {
        *self.handler.write().expect("fetch handler lock poisoned") = None;
    }

    /// Whether a handler is currently installed.
    pub fn has_handler(&self) -> bool {
        self.handler
            .read()
            .expect("fetch handler lock poisoned")
            .is_some()
    }

    /// Normalize `input` and pass it to the installed handler.
    pub async fn fetch(&self, input: impl Into<RequestInput>) -> Result<Response> {
        let request = input.into().normalize(&self.base)?;
        let handler = self
            .handler
            .read()
            .expect("fetch handler lock poisoned")
            .clone();
        match handler {
            Some(handler) => {
                trace!(url = %request.url_str(), "network fetch");
                handler(request).await
            }
            None => Err(WorkerKitError::NoFetchHandler),
        }
    }
}

impl std::fmt::Debug for NetFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetFetcher")
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

/// The emulated worker global scope.
///
/// One instance per test: it owns the listener registry, the named
/// cache storage, the network-fetch hook, and the leaf shims. Code
/// under test registers listeners; the harness calls
/// [`trigger`](Self::trigger) and asserts on the outcome and on
/// [`snapshot`](Self::snapshot).
pub struct GlobalScope {
    config: ScopeConfig,
    registry: EventRegistry,
    caches: CacheStorage,
    net: NetFetcher,
    performance: Performance,
    importer: ScriptImporter,
    channels: ChannelHub,
}

impl GlobalScope {
    /// Construct a scope from its configuration. Equivalent to
    /// [`ScopeConfig::install`].
    pub fn new(config: ScopeConfig) -> Self {
        let base = Arc::new(config.origin.clone());
        debug!(origin = %base, "installing global scope");
        Self {
            caches: CacheStorage::new(config.origin.clone()),
            net: NetFetcher::new(Arc::clone(&base)),
            importer: ScriptImporter::new(Arc::clone(&base)),
            performance: Performance::new(),
            registry: EventRegistry::new(),
            channels: ChannelHub::default(),
            config,
        }
    }

    /// The scope's configuration.
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    /// The base origin relative URLs resolve against.
    pub fn origin(&self) -> &Url {
        &self.config.origin
    }

    /// Register a listener for `event_type`. Any type string is
    /// accepted; duplicate registrations accumulate.
    pub fn add_event_listener<F>(&self, event_type: &str, listener: F)
    where
        F: Fn(&mut Event) -> Result<()> + Send + Sync + 'static,
    {
        self.registry.add_listener(event_type, listener);
    }

    /// The listener registry, for introspection.
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// A handle to the named cache storage.
    pub fn caches(&self) -> CacheStorage {
        self.caches.clone()
    }

    /// A handle to the network-fetch hook.
    pub fn net(&self) -> NetFetcher {
        self.net.clone()
    }

    /// Install the network-fetch handler on this scope's hook.
    pub fn set_fetch_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response>> + Send + 'static,
    {
        self.net.set_handler(handler);
    }

    /// Fetch through the installed handler, normalizing `input`
    /// first.
    pub async fn fetch(&self, input: impl Into<RequestInput>) -> Result<Response> {
        self.net.fetch(input).await
    }

    /// Build a request resolved against this scope's origin, the way
    /// worker code constructs `Request` values.
    pub fn request(&self, url: &str) -> Result<Request> {
        RequestInput::from(url).normalize(self.origin())
    }

    /// The monotonic clock shim.
    pub fn performance(&self) -> &Performance {
        &self.performance
    }

    /// The script-importer shim.
    pub fn importer(&self) -> &ScriptImporter {
        &self.importer
    }

    /// Record script imports, resolving each URL against the origin.
    pub fn import_scripts<'a>(&self, urls: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for url in urls {
            self.importer.import(url)?;
        }
        Ok(())
    }

    /// Open a broadcast channel; channels of the same name within
    /// one scope share a message buffer.
    pub fn broadcast_channel(&self, name: &str) -> BroadcastChannel {
        self.channels.channel(name)
    }

    /// A fresh file-reader shim.
    pub fn file_reader(&self) -> FileReader {
        FileReader::default()
    }

    /// Read-only structural copy of all cache contents.
    pub async fn snapshot(&self) -> Snapshot {
        self.caches.snapshot().await
    }

    /// Dispatch an event and wait for every completion token the
    /// listeners registered.
    ///
    /// Listeners run synchronously in registration order; a listener
    /// returning an error aborts dispatch immediately. The tokens
    /// collected during dispatch are then awaited together, and the
    /// first failure among them fails the call; work that already
    /// settled is not rolled back.
    pub async fn trigger(&self, trigger: Trigger) -> Result<TriggerOutcome> {
        let event_type = trigger.event_type().to_string();
        let mut event = self.build_event(trigger)?;
        let listeners: Vec<Listener> = self.registry.listeners_for(&event_type);
        debug!(
            event_type = %event_type,
            listeners = listeners.len(),
            "dispatching event"
        );

        for listener in listeners {
            if let Err(error) = listener(&mut event) {
                warn!(
                    event_type = %event_type,
                    category = error.category(),
                    "listener failed, aborting dispatch"
                );
                return Err(error);
            }
        }

        let is_fetch = matches!(event, Event::Fetch(_));
        let tokens = event.into_tokens();
        trace!(
            event_type = %event_type,
            responses = tokens.responses.len(),
            pending = tokens.pending.len(),
            "awaiting completion tokens"
        );
        let (responses, _settled) = future::try_join(
            future::try_join_all(tokens.responses),
            future::try_join_all(tokens.pending),
        )
        .await?;

        if is_fetch {
            Ok(TriggerOutcome::Responses(responses))
        } else {
            Ok(TriggerOutcome::Settled)
        }
    }

    fn build_event(&self, trigger: Trigger) -> Result<Event> {
        Ok(match trigger {
            Trigger::Install => Event::install(),
            Trigger::Activate => Event::activate(),
            Trigger::Fetch(input) => Event::fetch(input.normalize(self.origin())?),
            Trigger::Message(data) => Event::message(data),
            Trigger::Sync { tag, last_chance } => Event::sync(tag, last_chance),
            Trigger::Custom { event_type, args } => Event::generic(event_type, args),
        })
    }
}

impl std::fmt::Debug for GlobalScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalScope")
            .field("origin", &self.config.origin.as_str())
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scope() -> GlobalScope {
        ScopeConfig::default().install()
    }

    #[tokio::test]
    async fn test_trigger_without_listeners_settles() {
        let scope = scope();
        let outcome = scope.trigger(Trigger::Install).await.unwrap();
        assert!(matches!(outcome, TriggerOutcome::Settled));

        let outcome = scope.trigger(Trigger::fetch("/nothing")).await.unwrap();
        assert!(outcome.responses().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_responses_in_registration_order() {
        let scope = scope();
        for tag in ["first", "second"] {
            scope.add_event_listener("fetch", move |event| {
                event.respond_with(async move { Ok(Response::new(tag)) })
            });
        }

        let responses = scope
            .trigger(Trigger::fetch("/x"))
            .await
            .unwrap()
            .into_responses();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].payload(), &json!("first"));
        assert_eq!(responses[1].payload(), &json!("second"));
    }

    #[tokio::test]
    async fn test_fetch_event_exposes_normalized_request() {
        let scope = scope();
        scope.add_event_listener("fetch", |event| {
            let request = event.request().expect("fetch event carries a request");
            assert_eq!(request.url_str(), "https://www.test.com/page");
            Ok(())
        });
        scope.trigger(Trigger::fetch("/page")).await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_listener_failure_aborts_dispatch() {
        let scope = scope();
        let later_ran = Arc::new(AtomicUsize::new(0));

        scope.add_event_listener("install", |_| Err(WorkerKitError::listener("boom")));
        let later = later_ran.clone();
        scope.add_event_listener("install", move |_| {
            later.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let error = scope.trigger(Trigger::Install).await.unwrap_err();
        assert!(matches!(error, WorkerKitError::Listener(_)));
        assert_eq!(later_ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_token_fails_trigger_but_keeps_effects() {
        let scope = scope();
        let caches = scope.caches();

        scope.add_event_listener("install", move |event| {
            let caches = caches.clone();
            event.wait_until(async move {
                let cache = caches.open("v1").await;
                cache.put("/kept", Response::new("x")).await
            })?;
            event.wait_until(async {
                // settle after the cache write has had its turn
                tokio::task::yield_now().await;
                Err(WorkerKitError::fetch("network down"))
            })
        });

        let error = scope.trigger(Trigger::Install).await.unwrap_err();
        assert!(matches!(error, WorkerKitError::Fetch(_)));

        // the successful token's mutation is not rolled back
        let snapshot = scope.snapshot().await;
        assert!(snapshot.entry("v1", "https://www.test.com/kept").is_some());
    }

    #[tokio::test]
    async fn test_fetch_without_handler_fails() {
        let scope = scope();
        let net = scope.net();
        scope.add_event_listener("fetch", move |event| {
            let net = net.clone();
            let request = event.request().cloned().expect("fetch event");
            event.respond_with(async move { net.fetch(&request).await })
        });

        let error = scope.trigger(Trigger::fetch("/x")).await.unwrap_err();
        assert!(matches!(error, WorkerKitError::NoFetchHandler));
    }

    #[tokio::test]
    async fn test_handler_can_be_installed_after_listeners() {
        let scope = scope();
        let net = scope.net();
        scope.add_event_listener("fetch", move |event| {
            let net = net.clone();
            let request = event.request().cloned().expect("fetch event");
            event.respond_with(async move { net.fetch(&request).await })
        });

        scope.set_fetch_handler(|request| async move {
            Ok(Response::new(json!({ "echo": request.url_str() })))
        });

        let responses = scope
            .trigger(Trigger::fetch("/late"))
            .await
            .unwrap()
            .into_responses();
        assert_eq!(
            responses[0].payload(),
            &json!({ "echo": "https://www.test.com/late" })
        );
    }

    #[tokio::test]
    async fn test_message_event_waits_for_pending_work() {
        let scope = scope();
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = delivered.clone();
        scope.add_event_listener("message", move |event| {
            assert!(matches!(event, Event::Message(_)));
            let counter = counter.clone();
            event.wait_until(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });

        let outcome = scope
            .trigger(Trigger::message(json!({ "kind": "ping" })))
            .await
            .unwrap();
        assert!(matches!(outcome, TriggerOutcome::Settled));
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_event_carries_args() {
        let scope = scope();
        scope.add_event_listener("push", |event| {
            assert_eq!(event.event_type(), "push");
            assert_eq!(event.args(), [json!("payload"), json!(2)]);
            Ok(())
        });
        let outcome = scope
            .trigger(Trigger::custom("push", vec![json!("payload"), json!(2)]))
            .await
            .unwrap();
        assert!(matches!(outcome, TriggerOutcome::Settled));
    }

    #[tokio::test]
    async fn test_invalid_fetch_url_fails_before_dispatch() {
        let scope = scope();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        scope.add_event_listener("fetch", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let error = scope
            .trigger(Trigger::fetch("https://exa mple.com/x"))
            .await
            .unwrap_err();
        assert!(matches!(error, WorkerKitError::InvalidUrl { .. }));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_constructor_resolves_origin() {
        let scope = scope();
        let request = scope.request("/test").unwrap();
        assert_eq!(request.url_str(), "https://www.test.com/test");
    }
}

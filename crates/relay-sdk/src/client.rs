// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The client facade views and controllers talk to.

use crate::config::ClientConfig;
use crate::queue::{Deferred, DispatchHandle, DispatchQueue};
use crate::scene::{SceneNotifier, SceneScopeBridge};
use crate::view::{DescriptorCache, EventListeners, ViewBinder};
use relay_control::{DispatcherBuilder, Feature, RequestDispatcher, ScopeCatalog};
use relay_core::{EventBus, EventHandler, FaultSink, Payload, RoutingKey, ScopeId};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Builds a [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
    dispatcher: DispatcherBuilder,
}

impl ClientBuilder {
    /// Starts from the default configuration and no features.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            dispatcher: RequestDispatcher::builder(),
        }
    }

    /// Replaces the configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a feature registering handlers explicitly.
    pub fn feature(mut self, feature: impl Feature + 'static) -> Self {
        self.dispatcher = self.dispatcher.feature(feature);
        self
    }

    /// Adds several boxed features, in order.
    pub fn features(mut self, features: impl IntoIterator<Item = Box<dyn Feature>>) -> Self {
        self.dispatcher = self.dispatcher.features(features);
        self
    }

    /// Uses `bus` instead of a fresh event bus.
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.dispatcher = self.dispatcher.event_bus(bus);
        self
    }

    /// Reports every absorbed fault to `faults` instead of the log.
    pub fn fault_sink(mut self, faults: Arc<dyn FaultSink>) -> Self {
        self.dispatcher = self.dispatcher.fault_sink(faults);
        self
    }

    /// Builds the client. Discovery still waits for first use.
    pub fn build(self) -> Client {
        let dispatcher = Arc::new(
            self.dispatcher
                .include_declarations(self.config.discover_declarations)
                .build(),
        );
        let views = Arc::new(DescriptorCache::with_fault_sink(Arc::clone(
            dispatcher.fault_sink(),
        )));
        let scenes = self.config.scene_bridge.then(|| {
            Arc::new(SceneScopeBridge::new(
                Arc::clone(&dispatcher),
                self.config.warn_unmapped_scenes,
            ))
        });
        let queue = DispatchQueue::new(self.config.queue_capacity);
        log::info!(
            "Client built (declarations: {}, scene bridge: {}).",
            self.config.discover_declarations,
            scenes.is_some()
        );

        Client {
            config: self.config,
            dispatcher,
            views,
            queue,
            scenes,
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The single entry point of a game client.
///
/// Owns the [`RequestDispatcher`] and its event bus, the view descriptor
/// cache, the optional scene bridge and the dispatch queue. Every method
/// takes `&self`; the client can be shared behind an `Arc`.
pub struct Client {
    config: ClientConfig,
    dispatcher: Arc<RequestDispatcher>,
    views: Arc<DescriptorCache>,
    queue: DispatchQueue,
    scenes: Option<Arc<SceneScopeBridge>>,
}

impl Client {
    /// Starts building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The request dispatcher.
    pub fn dispatcher(&self) -> &Arc<RequestDispatcher> {
        &self.dispatcher
    }

    /// The event bus.
    pub fn bus(&self) -> &EventBus {
        self.dispatcher.bus()
    }

    /// The view descriptor cache.
    pub fn descriptors(&self) -> &Arc<DescriptorCache> {
        &self.views
    }

    /// Runs discovery now rather than on the first request.
    pub fn start(&self) -> &ScopeCatalog {
        let catalog = self.dispatcher.ensure_discovered();
        log::info!(
            "Client started: {} handler(s) and {} hook(s) across {} scope(s).",
            catalog.handler_count(),
            catalog.hook_count(),
            catalog.scope_ids().len()
        );
        catalog
    }

    /// Sends a request, discarding any result.
    pub fn send_request(&self, key: impl AsRef<str>, payload: Payload) {
        self.dispatcher.execute(key, payload);
    }

    /// Sends a request answered by a query handler and returns its result.
    ///
    /// ## Arguments
    /// * `key` - The routing key of the query.
    /// * `payload` - The request payload, possibly empty.
    /// ## Returns
    /// * The handler's value, or `None` if it failed, was not routable or
    ///   produced something other than an `R`.
    pub fn send_request_for<R: Any>(&self, key: impl AsRef<str>, payload: Payload) -> Option<R> {
        self.dispatcher.query(key, payload)
    }

    /// Publishes an event, returning the number of listeners called.
    pub fn publish(&self, key: impl AsRef<str>, payload: Payload) -> usize {
        self.dispatcher.bus().publish(key, payload)
    }

    /// Subscribes a free-standing listener.
    pub fn subscribe(&self, key: impl Into<RoutingKey>, handler: EventHandler) {
        self.dispatcher.bus().subscribe(key, handler);
    }

    /// Removes a listener added with [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&self, key: impl AsRef<str>, handler: &EventHandler) -> bool {
        self.dispatcher.bus().unsubscribe(key, handler)
    }

    /// Activates `scope` directly, bypassing the scene bridge.
    pub fn activate_scope(&self, scope: impl Into<ScopeId>) -> bool {
        self.dispatcher.activate_scope(scope)
    }

    /// Deactivates `scope` directly, bypassing the scene bridge.
    pub fn deactivate_scope(&self, scope: impl Into<ScopeId>) -> bool {
        self.dispatcher.deactivate_scope(scope)
    }

    /// Activates the scope of `scene` on behalf of a view.
    ///
    /// Goes through the scene bridge when there is one, so a later load
    /// notification for the same scene does nothing.
    ///
    /// ## Returns
    /// `true` if the scene names a scope that was activated by this call.
    pub fn enter_scene(&self, scene: &str) -> bool {
        match &self.scenes {
            Some(bridge) => bridge.ensure_scene_scope(scene),
            None => self
                .dispatcher
                .resolve_scope(scene)
                .is_some_and(|scope| self.dispatcher.activate_scope(scope)),
        }
    }

    /// Deactivates the scope of `scene`, see [`enter_scene`](Self::enter_scene).
    pub fn leave_scene(&self, scene: &str) -> bool {
        match &self.scenes {
            Some(bridge) => bridge.release_scene_scope(scene),
            None => self
                .dispatcher
                .resolve_scope(scene)
                .is_some_and(|scope| self.dispatcher.deactivate_scope(scope)),
        }
    }

    /// The scene bridge, unless disabled by configuration.
    pub fn scene_bridge(&self) -> Option<&Arc<SceneScopeBridge>> {
        self.scenes.as_ref()
    }

    /// Subscribes the scene bridge to the engine's scene notifications.
    ///
    /// ## Returns
    ///
    /// `false` if the bridge is disabled or was already attached.
    pub fn attach_scenes(&self, notifier: &dyn SceneNotifier) -> bool {
        match &self.scenes {
            Some(bridge) => bridge.attach(notifier),
            None => {
                log::warn!("Scene bridge disabled by configuration; not attaching.");
                false
            }
        }
    }

    /// Creates an unbound binder for `view`.
    pub fn binder_for<V: EventListeners>(&self, view: &Arc<V>) -> ViewBinder<V> {
        ViewBinder::new(view, self.dispatcher.bus_handle(), Arc::clone(&self.views))
    }

    /// A handle background threads post work through.
    pub fn dispatch_handle(&self) -> DispatchHandle {
        self.queue.handle()
    }

    /// Applies the work queued so far, in posting order, on this thread.
    ///
    /// ## Returns
    ///
    /// The number of items applied.
    pub fn pump(&self) -> usize {
        let batch = self.queue.take_batch();
        let applied = batch.len();
        for work in batch {
            match work {
                Deferred::Publish { key, payload } => {
                    self.publish(key, payload);
                }
                Deferred::Request { key, payload } => self.send_request(key, payload),
            }
        }
        if applied > 0 {
            log::trace!("Pumped {applied} deferred item(s).");
        }
        applied
    }
}

impl Default for Client {
    fn default() -> Self {
        ClientBuilder::new().build()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_control::{CatalogBuilder, HandlerContext};
    use relay_telemetry::FaultRecorder;

    fn client(config: ClientConfig, faults: Arc<FaultRecorder>) -> Client {
        Client::builder()
            .config(config)
            .fault_sink(faults)
            .feature(|catalog: &mut CatalogBuilder| {
                catalog
                    .global()
                    .query_with("math.double.query", |_ctx: &HandlerContext<'_>, n: &i64| n * 2);
                catalog
                    .scope("Arena")
                    .request("arena.ready.request", |ctx: &HandlerContext<'_>| {
                        ctx.publish("arena.ready.event", Payload::empty());
                    });
            })
            .build()
    }

    fn quiet() -> ClientConfig {
        ClientConfig {
            discover_declarations: false,
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_send_request_for_returns_value() {
        let client = client(quiet(), Arc::new(FaultRecorder::silent()));
        assert_eq!(client.send_request_for::<i64>("math.double.query", Payload::new(21_i64)), Some(42));
    }

    #[test]
    fn test_enter_scene_without_bridge() {
        let faults = Arc::new(FaultRecorder::silent());
        let config = ClientConfig {
            scene_bridge: false,
            ..quiet()
        };
        let client = client(config, faults.clone());

        assert!(client.scene_bridge().is_none());
        assert!(client.enter_scene("Arena"));
        assert!(client.dispatcher().is_routable("arena.ready.request"));
        assert!(client.leave_scene("Arena"));
        assert!(!client.enter_scene("Nowhere"));
        assert!(faults.is_empty());
    }

    #[test]
    fn test_pump_applies_in_order() {
        let client = client(quiet(), Arc::new(FaultRecorder::silent()));
        client.enter_scene("Arena");
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        client.subscribe(
            "arena.ready.event",
            relay_core::event::listener::untyped(move || sink.lock().unwrap().push("ready")),
        );

        let handle = client.dispatch_handle();
        handle.request("arena.ready.request", Payload::empty());
        handle.publish("arena.ready.event", Payload::empty());

        assert_eq!(client.pump(), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["ready", "ready"]);
        assert_eq!(client.pump(), 0);
    }
}

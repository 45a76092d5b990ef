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

//! Central service routing requests to the handlers of the active scopes.

use crate::context::{HandlerContext, ScopeState};
use crate::declaration::{CatalogBuilder, Declaration, Feature};
use crate::registry::{HandlerDescriptor, HookDescriptor, ScopeCatalog};
use relay_core::{
    run_isolated, DispatchFault, EventBus, FaultSink, HookPhase, LogSink, Payload, RoutingKey,
    ScopeId,
};
use std::any::{self, Any};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

/// Where discovery reads declarations from. Consumed by the first discovery.
#[derive(Default)]
struct DiscoverySources {
    features: Vec<Box<dyn Feature>>,
    include_declarations: bool,
}

/// The routable state: which scopes are active and which handler answers
/// each active key.
#[derive(Default)]
struct DispatchTable {
    active: HashMap<RoutingKey, Arc<HandlerDescriptor>>,
    states: HashMap<ScopeId, ScopeState>,
}

impl DispatchTable {
    fn state(&self, scope: &ScopeId) -> ScopeState {
        self.states.get(scope).copied().unwrap_or_default()
    }
}

/// Builder for a [`RequestDispatcher`].
pub struct DispatcherBuilder {
    sources: DiscoverySources,
    bus: Option<Arc<EventBus>>,
    faults: Option<Arc<dyn FaultSink>>,
}

impl DispatcherBuilder {
    /// Creates a builder with no features and declaration discovery off.
    pub fn new() -> Self {
        Self {
            sources: DiscoverySources::default(),
            bus: None,
            faults: None,
        }
    }

    /// Adds an explicitly registered feature.
    pub fn feature(mut self, feature: impl Feature + 'static) -> Self {
        self.sources.features.push(Box::new(feature));
        self
    }

    /// Adds several boxed features.
    pub fn features(mut self, features: impl IntoIterator<Item = Box<dyn Feature>>) -> Self {
        self.sources.features.extend(features);
        self
    }

    /// Also discovers the [`Declaration`]s submitted by the attribute
    /// markers anywhere in the final binary.
    pub fn include_declarations(mut self, include: bool) -> Self {
        self.sources.include_declarations = include;
        self
    }

    /// Uses `bus` instead of a fresh one. Unless a fault sink is given, the
    /// dispatcher reports to the bus's sink.
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Reports absorbed faults to `faults`.
    pub fn fault_sink(mut self, faults: Arc<dyn FaultSink>) -> Self {
        self.faults = Some(faults);
        self
    }

    /// Builds the dispatcher. Discovery is deferred to first use.
    pub fn build(self) -> RequestDispatcher {
        let faults = match (&self.faults, &self.bus) {
            (Some(faults), _) => Arc::clone(faults),
            (None, Some(bus)) => Arc::clone(bus.fault_sink()),
            (None, None) => Arc::new(LogSink),
        };
        let bus = self
            .bus
            .unwrap_or_else(|| Arc::new(EventBus::with_fault_sink(Arc::clone(&faults))));

        log::info!(
            "RequestDispatcher created with {} feature(s), declarations {}.",
            self.sources.features.len(),
            if self.sources.include_declarations {
                "included"
            } else {
                "excluded"
            }
        );

        RequestDispatcher {
            bus,
            faults,
            sources: Mutex::new(Some(self.sources)),
            catalog: OnceLock::new(),
            discovered: AtomicBool::new(false),
            discovery_lock: Mutex::new(()),
            global_ready: AtomicBool::new(false),
            ready_lock: Mutex::new(false),
            ready_signal: Condvar::new(),
            initializer: OnceLock::new(),
            table: Mutex::new(DispatchTable::default()),
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes keyed requests to the handlers of the active scopes.
///
/// Discovery runs exactly once, on the first call that needs it, and ends by
/// activating [`ScopeId::GLOBAL`]. Concurrent first callers block until the
/// global handlers are routable.
///
/// Scopes move between [`ScopeState::Inactive`] and [`ScopeState::Active`].
/// Activation copies the scope's handlers into the active table; a key that
/// is already routable keeps its first registration and the newcomer is
/// reported as a [`DispatchFault::DuplicateKey`]. Deactivation removes only
/// the entries that still point at the scope's own handlers. Hooks always run
/// with no lock held, so a hook may itself change scopes or send requests.
///
/// No method ever panics or returns an error to the caller: every failure is
/// reported to the fault sink.
pub struct RequestDispatcher {
    bus: Arc<EventBus>,
    faults: Arc<dyn FaultSink>,
    sources: Mutex<Option<DiscoverySources>>,
    catalog: OnceLock<ScopeCatalog>,
    discovered: AtomicBool,
    discovery_lock: Mutex<()>,
    global_ready: AtomicBool,
    ready_lock: Mutex<bool>,
    ready_signal: Condvar,
    initializer: OnceLock<ThreadId>,
    table: Mutex<DispatchTable>,
}

impl RequestDispatcher {
    /// Starts building a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// The event bus handlers publish to.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// A shared handle on the event bus.
    pub fn bus_handle(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// The sink faults are reported to.
    pub fn fault_sink(&self) -> &Arc<dyn FaultSink> {
        &self.faults
    }

    /// Runs discovery if it has not run yet and returns the catalog.
    ///
    /// Discovery ends once the global enter hooks have run. Until then
    /// other callers block; the thread running those hooks passes through,
    /// so a hook may itself send requests.
    ///
    /// ## Returns
    /// The catalog built by discovery.
    pub fn ensure_discovered(&self) -> &ScopeCatalog {
        if self.global_ready.load(Ordering::Acquire) {
            if let Some(catalog) = self.catalog.get() {
                return catalog;
            }
        }

        let (catalog, global_hooks) = {
            let _guard = self
                .discovery_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let catalog = self.catalog.get_or_init(|| self.discover());
            if self.discovered.load(Ordering::Acquire) {
                (catalog, None)
            } else {
                let hooks = self
                    .register_scope(catalog, &ScopeId::GLOBAL)
                    .unwrap_or_default();
                let _ = self.initializer.set(thread::current().id());
                self.discovered.store(true, Ordering::Release);
                (catalog, Some(hooks))
            }
        };

        if let Some(hooks) = global_hooks {
            self.run_hooks(&ScopeId::GLOBAL, HookPhase::Enter, &hooks);
            self.mark_global_ready();
        } else if self.initializer.get() != Some(&thread::current().id()) {
            self.wait_global_ready();
        }
        catalog
    }

    /// Alias of [`ensure_discovered`](Self::ensure_discovered) for
    /// inspection.
    pub fn catalog(&self) -> &ScopeCatalog {
        self.ensure_discovered()
    }

    /// Maps a name to a declared scope, see [`ScopeCatalog::resolve`].
    pub fn resolve_scope(&self, name: &str) -> Option<ScopeId> {
        self.ensure_discovered().resolve(name)
    }

    /// Makes the handlers of `scope` routable and runs its enter hooks.
    ///
    /// ## Returns
    /// `true` if the scope was inactive and is now active, `false` if it was
    /// already active.
    pub fn activate_scope(&self, scope: impl Into<ScopeId>) -> bool {
        let scope = scope.into();
        let catalog = self.ensure_discovered();
        match self.register_scope(catalog, &scope) {
            Some(hooks) => {
                self.run_hooks(&scope, HookPhase::Enter, &hooks);
                true
            }
            None => false,
        }
    }

    /// Runs the exit hooks of `scope` and removes its handlers from the
    /// active table.
    ///
    /// Deactivating an inactive scope does nothing. The global scope stays
    /// active for the dispatcher's lifetime.
    ///
    /// ## Returns
    /// `true` if the scope was active and is now inactive.
    pub fn deactivate_scope(&self, scope: impl Into<ScopeId>) -> bool {
        let scope = scope.into();
        let catalog = self.ensure_discovered();
        if scope.is_global() {
            log::warn!("Ignoring request to deactivate the global scope.");
            return false;
        }

        {
            let mut table = self.lock_table();
            if !table.state(&scope).can_transition_to(ScopeState::Inactive) {
                log::trace!("Scope {scope} is not active; nothing to deactivate.");
                return false;
            }
            table.states.insert(scope.clone(), ScopeState::Inactive);
        }

        let Some(bindings) = catalog.bindings(scope.as_str()) else {
            log::info!("Scope {scope} deactivated (no bindings).");
            return true;
        };
        self.run_hooks(&scope, HookPhase::Exit, bindings.exit_hooks());

        let mut removed = 0;
        {
            let mut table = self.lock_table();
            // A reactivation may have raced the exit hooks; its entries stay.
            if table.state(&scope).is_active() {
                return true;
            }
            for handler in bindings.handlers() {
                let owned = table
                    .active
                    .get(handler.key.as_str())
                    .is_some_and(|current| Arc::ptr_eq(current, handler));
                if owned {
                    table.active.remove(handler.key.as_str());
                    removed += 1;
                }
            }
        }
        log::info!("Scope {scope} deactivated ({removed} key(s) unregistered).");
        true
    }

    /// Returns the activation state of `scope`.
    pub fn scope_state(&self, scope: &ScopeId) -> ScopeState {
        self.ensure_discovered();
        self.lock_table().state(scope)
    }

    /// Every active scope, sorted by name.
    pub fn active_scopes(&self) -> Vec<ScopeId> {
        self.ensure_discovered();
        let mut scopes: Vec<ScopeId> = self
            .lock_table()
            .states
            .iter()
            .filter(|(_, state)| state.is_active())
            .map(|(scope, _)| scope.clone())
            .collect();
        scopes.sort();
        scopes
    }

    /// Every routable key, sorted.
    pub fn active_keys(&self) -> Vec<RoutingKey> {
        self.ensure_discovered();
        let mut keys: Vec<RoutingKey> = self.lock_table().active.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns `true` if `key` is currently routable.
    pub fn is_routable(&self, key: impl AsRef<str>) -> bool {
        self.ensure_discovered();
        self.lock_table().active.contains_key(key.as_ref())
    }

    /// Returns the scope currently answering `key`, if any.
    pub fn owner_of(&self, key: impl AsRef<str>) -> Option<ScopeId> {
        self.ensure_discovered();
        self.lock_table()
            .active
            .get(key.as_ref())
            .map(|handler| handler.scope.clone())
    }

    /// Sends a request. Any result the handler produces is discarded.
    ///
    /// Empty keys, unknown keys, payload mismatches and handler failures are
    /// reported to the fault sink; the call itself always completes.
    ///
    /// ## Arguments
    /// * `key` - The routing key of the request.
    /// * `payload` - Handed to the handler, which may ignore it.
    pub fn execute(&self, key: impl AsRef<str>, payload: Payload) {
        let _ = self.invoke(key.as_ref(), &payload, "execute");
    }

    /// Sends a request and returns the handler's result as an `R`.
    ///
    /// Returns `None` when [`execute`](Self::execute) would have reported a
    /// fault, or when the handler produced something other than an `R`.
    pub fn query<R: Any>(&self, key: impl AsRef<str>, payload: Payload) -> Option<R> {
        let key = key.as_ref();
        let result = self.invoke(key, &payload, "query")?;
        match result.into_inner::<R>() {
            Ok(value) => Some(value),
            Err(other) => {
                self.faults.report(DispatchFault::ResultMismatch {
                    key: RoutingKey::from(key.to_owned()),
                    expected: any::type_name::<R>(),
                    found: other.type_name(),
                });
                None
            }
        }
    }

    fn invoke(&self, key: &str, payload: &Payload, operation: &'static str) -> Option<Payload> {
        self.ensure_discovered();
        if key.trim().is_empty() {
            self.faults.report(DispatchFault::EmptyKey { operation });
            return None;
        }

        let handler = self.lock_table().active.get(key).cloned();
        let Some(handler) = handler else {
            self.faults.report(DispatchFault::UnknownKey {
                key: RoutingKey::from(key.to_owned()),
            });
            return None;
        };

        log::trace!("Dispatching '{key}' to {}.", handler.origin);
        let ctx = HandlerContext::new(self, &handler.scope, Some(&handler.key));
        match run_isolated(|| (handler.invoker)(&ctx, payload)) {
            Ok(result) => Some(result),
            Err(error) => {
                self.faults
                    .report(DispatchFault::from_handler(&handler.key, error));
                None
            }
        }
    }

    /// Reads every discovery source into a catalog. Each feature registers
    /// into its own builder so a feature that panics half-way contributes
    /// nothing.
    fn discover(&self) -> ScopeCatalog {
        let sources = self
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default();

        let mut catalog = CatalogBuilder::new(Arc::clone(&self.faults));
        for feature in &sources.features {
            self.discover_part(&mut catalog, feature.name(), |part| feature.register(part));
        }
        if sources.include_declarations {
            for declaration in inventory::iter::<Declaration> {
                self.discover_part(&mut catalog, declaration.origin, declaration.install);
            }
        }

        let catalog = catalog.finish();
        log::info!(
            "Handler discovery complete: {} scope(s), {} handler(s), {} hook(s).",
            catalog.scope_ids().len(),
            catalog.handler_count(),
            catalog.hook_count()
        );
        catalog
    }

    fn discover_part(
        &self,
        catalog: &mut CatalogBuilder,
        origin: &str,
        register: impl FnOnce(&mut CatalogBuilder),
    ) {
        let mut part = CatalogBuilder::new(Arc::clone(&self.faults));
        part.set_origin(origin);
        match panic::catch_unwind(AssertUnwindSafe(|| register(&mut part))) {
            Ok(()) => catalog.absorb(part),
            Err(_) => self.faults.report(DispatchFault::MalformedDeclaration {
                origin: origin.to_string(),
                reason: "registration panicked; its declarations were skipped".to_string(),
            }),
        }
    }

    /// Moves `scope` to active and registers its handlers. Returns the enter
    /// hooks to run, or `None` if the scope was already active.
    fn register_scope(
        &self,
        catalog: &ScopeCatalog,
        scope: &ScopeId,
    ) -> Option<Vec<Arc<HookDescriptor>>> {
        let bindings = catalog.bindings(scope.as_str());
        let mut faults = Vec::new();
        let mut registered = 0;
        {
            let mut table = self.lock_table();
            if !table.state(scope).can_transition_to(ScopeState::Active) {
                log::trace!("Scope {scope} is already active.");
                return None;
            }
            for handler in bindings.map(|b| b.handlers()).unwrap_or_default() {
                match table.active.get(handler.key.as_str()) {
                    Some(current) if Arc::ptr_eq(current, handler) => {}
                    Some(current) => faults.push(DispatchFault::DuplicateKey {
                        key: handler.key.clone(),
                        kept: current.scope.clone(),
                        dropped: scope.clone(),
                    }),
                    None => {
                        table.active.insert(handler.key.clone(), Arc::clone(handler));
                        registered += 1;
                    }
                }
            }
            table.states.insert(scope.clone(), ScopeState::Active);
        }

        if !scope.is_global() && bindings.map_or(true, |b| b.is_empty()) {
            faults.push(DispatchFault::EmptyScope {
                scope: scope.clone(),
            });
        }
        for fault in faults {
            self.faults.report(fault);
        }
        log::info!("Scope {scope} activated ({registered} key(s) registered).");

        Some(bindings.map(|b| b.enter_hooks().to_vec()).unwrap_or_default())
    }

    fn run_hooks(&self, scope: &ScopeId, phase: HookPhase, hooks: &[Arc<HookDescriptor>]) {
        for hook in hooks {
            let ctx = HandlerContext::new(self, scope, None);
            if let Err(error) = run_isolated(|| (hook.hook)(&ctx)) {
                self.faults.report(DispatchFault::HookFailed {
                    scope: scope.clone(),
                    phase,
                    hook: hook.origin.clone(),
                    message: error.to_string(),
                });
            }
        }
    }

    fn mark_global_ready(&self) {
        *self.ready_lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.global_ready.store(true, Ordering::Release);
        self.ready_signal.notify_all();
    }

    fn wait_global_ready(&self) {
        let mut ready = self.ready_lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !*ready {
            ready = self
                .ready_signal
                .wait(ready)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn lock_table(&self) -> MutexGuard<'_, DispatchTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("discovered", &self.discovered.load(Ordering::Relaxed))
            .field("global_ready", &self.global_ready.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

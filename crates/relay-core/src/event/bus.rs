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

use crate::fault::{DispatchFault, FaultSink, LogSink};
use crate::key::RoutingKey;
use crate::outcome::{run_isolated, HandlerResult};
use crate::payload::Payload;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A type-erased event listener.
///
/// Handlers are compared by reference identity ([`Arc::ptr_eq`]), so keep the
/// `Arc` returned at subscription time to unsubscribe later.
pub type EventHandler = Arc<dyn Fn(&Payload) -> HandlerResult + Send + Sync>;

/// A thread-safe, synchronous event bus keyed by routing key.
///
/// All operations lock the internal handler map, but handlers always run on a
/// snapshot taken before the first one is invoked, with no lock held. A
/// handler may therefore publish, subscribe or unsubscribe re-entrantly; such
/// changes only affect later publications.
pub struct EventBus {
    handlers: Mutex<HashMap<RoutingKey, Vec<EventHandler>>>,
    faults: Arc<dyn FaultSink>,
}

impl EventBus {
    /// Creates an empty bus reporting faults to the [`LogSink`].
    ///
    /// ## Returns
    /// A new instance of the EventBus struct.
    pub fn new() -> Self {
        Self::with_fault_sink(Arc::new(LogSink))
    }

    /// Creates an empty bus reporting faults to `faults`.
    pub fn with_fault_sink(faults: Arc<dyn FaultSink>) -> Self {
        log::info!("EventBus initialized.");
        Self {
            handlers: Mutex::new(HashMap::new()),
            faults,
        }
    }

    /// Returns the sink this bus reports faults to.
    pub fn fault_sink(&self) -> &Arc<dyn FaultSink> {
        &self.faults
    }

    /// Appends `handler` to the handler list of `key`.
    ///
    /// The same handler may be subscribed several times and will then be
    /// invoked once per subscription.
    ///
    /// ## Arguments
    /// * `key` - The event key to listen to.
    /// * `handler` - The listener to invoke on publication.
    pub fn subscribe(&self, key: impl Into<RoutingKey>, handler: EventHandler) {
        let key = key.into();
        if key.is_blank() {
            self.faults.report(DispatchFault::EmptyKey {
                operation: "subscribe",
            });
            return;
        }
        log::trace!("Subscribing a handler to '{key}'.");
        self.lock().entry(key).or_default().push(handler);
    }

    /// Removes the first subscription of `handler` to `key`.
    ///
    /// Returns `true` if a subscription was removed. Removing the last handler
    /// of a key prunes the key entirely.
    pub fn unsubscribe(&self, key: impl AsRef<str>, handler: &EventHandler) -> bool {
        let key = key.as_ref();
        let mut handlers = self.lock();
        let Some(list) = handlers.get_mut(key) else {
            return false;
        };
        let Some(position) = list.iter().position(|h| Arc::ptr_eq(h, handler)) else {
            return false;
        };
        list.remove(position);
        if list.is_empty() {
            handlers.remove(key);
        }
        log::trace!("Unsubscribed a handler from '{key}'.");
        true
    }

    /// Invokes every handler subscribed to `key` with `payload`.
    ///
    /// Each handler is isolated: a failure or panic is reported to the fault
    /// sink and the remaining handlers still run. Nothing propagates to the
    /// publisher.
    ///
    /// ## Returns
    /// The number of handlers that were invoked.
    pub fn publish(&self, key: impl AsRef<str>, payload: Payload) -> usize {
        let key = key.as_ref();
        if key.trim().is_empty() {
            self.faults.report(DispatchFault::EmptyKey {
                operation: "publish",
            });
            return 0;
        }

        let snapshot: Vec<EventHandler> = self.lock().get(key).cloned().unwrap_or_default();
        if snapshot.is_empty() {
            log::trace!("Published '{key}' with no subscribers.");
            return 0;
        }

        log::trace!("Publishing '{key}' to {} handler(s).", snapshot.len());
        for handler in &snapshot {
            if let Err(error) = run_isolated(|| handler(&payload)) {
                self.faults.report(DispatchFault::from_handler(
                    &RoutingKey::from(key.to_owned()),
                    error,
                ));
            }
        }
        snapshot.len()
    }

    /// Returns the number of live subscriptions to `key`.
    pub fn subscriber_count(&self, key: impl AsRef<str>) -> usize {
        self.lock().get(key.as_ref()).map_or(0, Vec::len)
    }

    /// Returns every key with at least one subscription, sorted.
    pub fn keys(&self) -> Vec<RoutingKey> {
        let mut keys: Vec<RoutingKey> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drops every subscription of every key.
    pub fn clear(&self) {
        self.lock().clear();
        log::debug!("EventBus cleared.");
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RoutingKey, Vec<EventHandler>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("keys", &self.keys())
            .finish_non_exhaustive()
    }
}

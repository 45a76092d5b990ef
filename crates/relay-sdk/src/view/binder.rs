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

//! Binding one view instance to the event bus.

use super::cache::DescriptorCache;
use super::listeners::EventListeners;
use relay_core::{EventBus, EventHandler, HandlerResult, Payload, RoutingKey};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// One listener of a bound view, subscribed or not.
struct EventSubscription {
    key: RoutingKey,
    handler: EventHandler,
    active: bool,
}

/// Subscribes the listeners of one view instance to the event bus.
///
/// The subscriptions are built once, on the first [`bind`](Self::bind), and
/// toggled afterwards. Both [`bind`](Self::bind) and
/// [`unbind`](Self::unbind) are idempotent. The binder only holds a weak
/// reference to its view: events reaching a dropped view are skipped.
/// Dropping the binder unbinds it.
pub struct ViewBinder<V: EventListeners> {
    view: Weak<V>,
    bus: Arc<EventBus>,
    cache: Arc<DescriptorCache>,
    subscriptions: Mutex<Option<Vec<EventSubscription>>>,
}

impl<V: EventListeners> ViewBinder<V> {
    /// Creates an unbound binder for `view`.
    pub fn new(view: &Arc<V>, bus: Arc<EventBus>, cache: Arc<DescriptorCache>) -> Self {
        Self {
            view: Arc::downgrade(view),
            bus,
            cache,
            subscriptions: Mutex::new(None),
        }
    }

    /// Subscribes every listener not currently subscribed.
    ///
    /// ## Returns
    ///
    /// The number of subscriptions made by this call.
    pub fn bind(&self) -> usize {
        let mut guard = self.lock();
        let subscriptions = guard.get_or_insert_with(|| self.build());
        let mut bound = 0;
        for subscription in subscriptions.iter_mut().filter(|s| !s.active) {
            self.bus
                .subscribe(subscription.key.clone(), Arc::clone(&subscription.handler));
            subscription.active = true;
            bound += 1;
        }
        bound
    }

    /// Unsubscribes every active listener. Safe before any `bind`.
    ///
    /// ## Returns
    ///
    /// The number of subscriptions removed by this call.
    pub fn unbind(&self) -> usize {
        let mut guard = self.lock();
        let Some(subscriptions) = guard.as_mut() else {
            return 0;
        };
        let mut unbound = 0;
        for subscription in subscriptions.iter_mut().filter(|s| s.active) {
            self.bus.unsubscribe(&subscription.key, &subscription.handler);
            subscription.active = false;
            unbound += 1;
        }
        unbound
    }

    /// Engine enable notification.
    pub fn on_enable(&self) -> usize {
        self.bind()
    }

    /// Engine disable notification.
    pub fn on_disable(&self) -> usize {
        self.unbind()
    }

    /// Returns `true` if at least one listener is subscribed.
    pub fn is_bound(&self) -> bool {
        self.active_count() > 0
    }

    /// The number of listeners currently subscribed.
    pub fn active_count(&self) -> usize {
        self.lock()
            .as_ref()
            .map_or(0, |subs| subs.iter().filter(|s| s.active).count())
    }

    /// Returns `true` while the view is alive.
    pub fn is_view_alive(&self) -> bool {
        self.view.strong_count() > 0
    }

    fn build(&self) -> Vec<EventSubscription> {
        self.cache
            .get_or_create::<V>()
            .iter()
            .map(|descriptor| {
                let view = Weak::clone(&self.view);
                let invoker = Arc::clone(descriptor.invoker());
                let handler: EventHandler = Arc::new(move |payload: &Payload| -> HandlerResult {
                    match view.upgrade() {
                        Some(view) => invoker(&view, payload),
                        None => Ok(()),
                    }
                });
                EventSubscription {
                    key: descriptor.key().clone(),
                    handler,
                    active: false,
                }
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<EventSubscription>>> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: EventListeners> Drop for ViewBinder<V> {
    fn drop(&mut self) {
        let unbound = self.unbind();
        if unbound > 0 {
            log::trace!(
                "Dropped binder of {} with {unbound} live subscription(s)",
                std::any::type_name::<V>()
            );
        }
    }
}

impl<V: EventListeners> fmt::Debug for ViewBinder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBinder")
            .field("view", &std::any::type_name::<V>())
            .field("active", &self.active_count())
            .finish()
    }
}

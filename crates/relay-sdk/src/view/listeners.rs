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

//! Listener declarations for view types.

use relay_core::{DispatchFault, HandlerOutcome, HandlerResult, Payload, RoutingKey};
use std::any::{self, Any};
use std::fmt;
use std::sync::Arc;

/// A type-erased listener bound to a view instance at call time.
pub type ListenerInvoker<V> = Arc<dyn Fn(&V, &Payload) -> HandlerResult + Send + Sync>;

/// A view type that receives events from the bus.
///
/// Usually implemented by `#[view_listeners]`, which collects the
/// `#[listen("key")]` methods of an impl block.
pub trait EventListeners: Send + Sync + Sized + 'static {
    /// Declares this type's listeners.
    fn listeners(set: &mut ListenerSet<Self>);
}

/// One listener of a view type: the event it receives and how to call it.
pub struct ViewEventDescriptor<V> {
    key: RoutingKey,
    method: &'static str,
    payload_type: Option<&'static str>,
    invoker: ListenerInvoker<V>,
}

impl<V> ViewEventDescriptor<V> {
    /// The event key listened to.
    pub fn key(&self) -> &RoutingKey {
        &self.key
    }

    /// The listener's type name, for diagnostics.
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// The declared payload type, if the listener takes one.
    pub fn payload_type(&self) -> Option<&'static str> {
        self.payload_type
    }

    /// Calls the listener on `view`.
    pub fn invoke(&self, view: &V, payload: &Payload) -> HandlerResult {
        (self.invoker)(view, payload)
    }

    pub(crate) fn invoker(&self) -> &ListenerInvoker<V> {
        &self.invoker
    }
}

impl<V> Clone for ViewEventDescriptor<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            method: self.method,
            payload_type: self.payload_type,
            invoker: Arc::clone(&self.invoker),
        }
    }
}

impl<V> fmt::Debug for ViewEventDescriptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewEventDescriptor")
            .field("key", &self.key)
            .field("method", &self.method)
            .field("payload_type", &self.payload_type)
            .finish()
    }
}

/// Collects the listeners of a view type `V`.
///
/// Listeners with a blank event key are rejected as malformed and left out.
pub struct ListenerSet<V> {
    descriptors: Vec<ViewEventDescriptor<V>>,
    rejected: Vec<DispatchFault>,
}

impl<V: 'static> ListenerSet<V> {
    pub(crate) fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Listens for `key`, ignoring the payload.
    ///
    /// ## Arguments
    /// * `key` - The event key.
    /// * `listener` - Called with the bound view.
    pub fn on<F, O>(&mut self, key: impl Into<RoutingKey>, listener: F) -> &mut Self
    where
        F: Fn(&V) -> O + Send + Sync + 'static,
        O: HandlerOutcome,
    {
        let invoker: ListenerInvoker<V> =
            Arc::new(move |view: &V, _: &Payload| listener(view).into_handler_result());
        self.push(key.into(), any::type_name::<F>(), None, invoker)
    }

    /// Listens for `key` with a non-nullable `T` payload.
    ///
    /// ## Arguments
    /// * `key` - The event key.
    /// * `listener` - Called with the bound view and the payload. Events
    ///   without a `T` are reported as payload mismatches.
    pub fn on_typed<T, F, O>(&mut self, key: impl Into<RoutingKey>, listener: F) -> &mut Self
    where
        T: Any,
        F: Fn(&V, &T) -> O + Send + Sync + 'static,
        O: HandlerOutcome,
    {
        let invoker: ListenerInvoker<V> = Arc::new(move |view: &V, payload: &Payload| -> HandlerResult {
            listener(view, payload.expect_ref::<T>()?).into_handler_result()
        });
        self.push(key.into(), any::type_name::<F>(), Some(any::type_name::<T>()), invoker)
    }

    /// Listens for `key` with a nullable `T` payload.
    pub fn on_optional<T, F, O>(&mut self, key: impl Into<RoutingKey>, listener: F) -> &mut Self
    where
        T: Any,
        F: Fn(&V, Option<&T>) -> O + Send + Sync + 'static,
        O: HandlerOutcome,
    {
        let invoker: ListenerInvoker<V> = Arc::new(move |view: &V, payload: &Payload| -> HandlerResult {
            listener(view, payload.optional_ref::<T>()?).into_handler_result()
        });
        let payload_type = Some(any::type_name::<Option<T>>());
        self.push(key.into(), any::type_name::<F>(), payload_type, invoker)
    }

    /// Pulls in the listeners of a part of `V`, reached through `project`.
    ///
    /// This is how a view reuses the listeners of a shared base component.
    ///
    /// ## Arguments
    /// * `project` - Borrows the component from the view.
    /// ## Returns
    /// * `&mut Self`, for chaining.
    pub fn include<P: EventListeners>(&mut self, project: fn(&V) -> &P) -> &mut Self {
        let mut part = ListenerSet::<P>::new();
        P::listeners(&mut part);
        self.rejected.append(&mut part.rejected);
        for descriptor in part.descriptors {
            let inner = descriptor.invoker;
            self.descriptors.push(ViewEventDescriptor {
                key: descriptor.key,
                method: descriptor.method,
                payload_type: descriptor.payload_type,
                invoker: Arc::new(move |view: &V, payload: &Payload| inner(project(view), payload)),
            });
        }
        self
    }

    /// The listeners declared so far.
    pub fn descriptors(&self) -> &[ViewEventDescriptor<V>] {
        &self.descriptors
    }

    pub(crate) fn into_parts(self) -> (Vec<ViewEventDescriptor<V>>, Vec<DispatchFault>) {
        (self.descriptors, self.rejected)
    }

    fn push(
        &mut self,
        key: RoutingKey,
        method: &'static str,
        payload_type: Option<&'static str>,
        invoker: ListenerInvoker<V>,
    ) -> &mut Self {
        if key.is_blank() {
            self.rejected.push(DispatchFault::MalformedDeclaration {
                origin: any::type_name::<V>().to_string(),
                reason: format!("listener `{method}` has an empty event key"),
            });
            return self;
        }
        self.descriptors.push(ViewEventDescriptor {
            key,
            method,
            payload_type,
            invoker,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Badge {
        shown: Mutex<Vec<u32>>,
    }

    impl EventListeners for Badge {
        fn listeners(set: &mut ListenerSet<Self>) {
            set.on_typed("badge.count.event", |badge: &Badge, count: &u32| {
                badge.shown.lock().unwrap().push(*count)
            });
        }
    }

    #[derive(Default)]
    struct Profile {
        badge: Badge,
        resets: Mutex<usize>,
    }

    fn badge_of(profile: &Profile) -> &Badge {
        &profile.badge
    }

    #[test]
    fn test_typed_listener_checks_payload() {
        let mut set = ListenerSet::<Badge>::new();
        Badge::listeners(&mut set);
        let (descriptors, rejected) = set.into_parts();
        assert!(rejected.is_empty());
        assert_eq!(descriptors[0].payload_type(), Some("u32"));

        let badge = Badge::default();
        assert!(descriptors[0].invoke(&badge, &Payload::new(4_u32)).is_ok());
        assert!(descriptors[0].invoke(&badge, &Payload::new("four")).is_err());
        assert!(descriptors[0].invoke(&badge, &Payload::empty()).is_err());
        assert_eq!(*badge.shown.lock().unwrap(), vec![4]);
    }

    #[test]
    fn test_include_projects_into_part() {
        let mut set = ListenerSet::<Profile>::new();
        set.include(badge_of)
            .on("profile.reset.event", |profile: &Profile| {
                *profile.resets.lock().unwrap() += 1
            });

        let profile = Profile::default();
        let descriptors = set.descriptors();
        assert_eq!(descriptors.len(), 2);
        descriptors[0].invoke(&profile, &Payload::new(9_u32)).unwrap();
        descriptors[1].invoke(&profile, &Payload::empty()).unwrap();
        assert_eq!(*profile.badge.shown.lock().unwrap(), vec![9]);
        assert_eq!(*profile.resets.lock().unwrap(), 1);
    }

    #[test]
    fn test_blank_key_is_rejected() {
        let mut set = ListenerSet::<Badge>::new();
        set.on(" ", |_: &Badge| {});
        let (descriptors, rejected) = set.into_parts();
        assert!(descriptors.is_empty());
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].kind(), "malformed_declaration");
    }
}

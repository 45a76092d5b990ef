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

//! A process-lifetime cache of listener descriptors, keyed by view type.

use super::listeners::{EventListeners, ListenerSet, ViewEventDescriptor};
use relay_core::{run_isolated, DispatchFault, FaultSink, HandlerError, LogSink};
use std::any::{self, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Caches the listener descriptors of each view type.
///
/// A type's descriptors are built once, on first request, and shared by
/// every instance of that type. A type that declares no listeners gets an
/// empty slice.
pub struct DescriptorCache {
    entries: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    faults: Arc<dyn FaultSink>,
}

impl DescriptorCache {
    /// Creates an empty cache reporting malformed listeners to the log.
    pub fn new() -> Self {
        Self::with_fault_sink(Arc::new(LogSink))
    }

    /// Creates an empty cache reporting malformed listeners to `faults`.
    pub fn with_fault_sink(faults: Arc<dyn FaultSink>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            faults,
        }
    }

    /// Returns the descriptors of `V`, building them on first request.
    ///
    /// Malformed listeners are reported once, when the type is first built.
    /// A `listeners` implementation that panics leaves the type with no
    /// listeners.
    pub fn get_or_create<V: EventListeners>(&self) -> Arc<[ViewEventDescriptor<V>]> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = entries
            .get(&TypeId::of::<V>())
            .and_then(|entry| entry.downcast_ref::<Arc<[ViewEventDescriptor<V>]>>())
        {
            return Arc::clone(cached);
        }

        let descriptors = self.build::<V>();
        log::debug!(
            "Cached {} listener(s) for view type {}",
            descriptors.len(),
            any::type_name::<V>()
        );
        entries.insert(TypeId::of::<V>(), Box::new(Arc::clone(&descriptors)));
        descriptors
    }

    /// Returns `true` if the descriptors of `V` have been built.
    pub fn contains<V: EventListeners>(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<V>())
    }

    /// The number of view types cached.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no view type has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn build<V: EventListeners>(&self) -> Arc<[ViewEventDescriptor<V>]> {
        let built = run_isolated(|| -> Result<_, HandlerError> {
            let mut set = ListenerSet::<V>::new();
            V::listeners(&mut set);
            Ok(set.into_parts())
        });
        match built {
            Ok((descriptors, rejected)) => {
                for fault in rejected {
                    self.faults.report(fault);
                }
                descriptors.into()
            }
            Err(error) => {
                self.faults.report(DispatchFault::MalformedDeclaration {
                    origin: any::type_name::<V>().to_string(),
                    reason: format!("listener declaration failed: {error}"),
                });
                Arc::from(Vec::new())
            }
        }
    }
}

impl Default for DescriptorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DescriptorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorCache")
            .field("types", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_telemetry::FaultRecorder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Scoreboard;

    impl EventListeners for Scoreboard {
        fn listeners(set: &mut ListenerSet<Self>) {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            set.on("score.reset.event", |_: &Scoreboard| {})
                .on_typed("score.update.event", |_: &Scoreboard, _: &u64| {});
        }
    }

    struct Decoration;

    impl EventListeners for Decoration {
        fn listeners(_set: &mut ListenerSet<Self>) {}
    }

    struct Broken;

    impl EventListeners for Broken {
        fn listeners(set: &mut ListenerSet<Self>) {
            set.on("", |_: &Broken| {});
            panic!("listener table unavailable");
        }
    }

    #[test]
    fn test_descriptors_are_built_once_per_type() {
        let cache = DescriptorCache::new();
        let first = cache.get_or_create::<Scoreboard>();
        let second = cache.get_or_create::<Scoreboard>();

        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
        assert!(cache.contains::<Scoreboard>());
    }

    #[test]
    fn test_type_without_listeners_gets_empty_slice() {
        let cache = DescriptorCache::new();
        assert!(cache.get_or_create::<Decoration>().is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_panicking_declaration_is_contained() {
        let faults = Arc::new(FaultRecorder::silent());
        let cache = DescriptorCache::with_fault_sink(faults.clone());

        assert!(cache.get_or_create::<Broken>().is_empty());
        assert_eq!(faults.count("malformed_declaration"), 1);

        // Cached as empty: no second report.
        assert!(cache.get_or_create::<Broken>().is_empty());
        assert_eq!(faults.len(), 1);
    }
}

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

//! Driving scope activation from engine scene notifications.

use relay_control::RequestDispatcher;
use relay_core::{DispatchFault, ScopeId};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives scene lifecycle notifications from the engine.
pub trait SceneObserver: Send + Sync {
    /// A scene finished loading.
    fn on_scene_loaded(&self, scene: &str);

    /// A scene was unloaded.
    fn on_scene_unloaded(&self, scene: &str);
}

/// The engine side of scene notifications.
pub trait SceneNotifier {
    /// Registers `observer` for every subsequent load and unload.
    fn subscribe(&self, observer: Arc<dyn SceneObserver>);
}

/// Activates the scope named like each loaded scene and deactivates it when
/// the scene unloads.
///
/// Scene names must match a declared scope exactly. The bridge keeps its own
/// set of the scopes it activated, so a scene activated both explicitly and
/// by a load notification is only activated once, and an unload only
/// deactivates scopes the bridge itself activated. The global scope is never
/// tracked.
pub struct SceneScopeBridge {
    dispatcher: Arc<RequestDispatcher>,
    tracked: Mutex<BTreeSet<ScopeId>>,
    attached: AtomicBool,
    warn_unmapped: bool,
}

impl SceneScopeBridge {
    /// Creates a bridge over `dispatcher`.
    ///
    /// ## Arguments
    ///
    /// * `warn_unmapped` - report unmapped scene names as warnings rather
    ///   than debug logs.
    pub fn new(dispatcher: Arc<RequestDispatcher>, warn_unmapped: bool) -> Self {
        Self {
            dispatcher,
            tracked: Mutex::new(BTreeSet::new()),
            attached: AtomicBool::new(false),
            warn_unmapped,
        }
    }

    /// Subscribes the bridge to `notifier`. Only the first call subscribes.
    ///
    /// ## Returns
    ///
    /// `true` if this call subscribed the bridge.
    pub fn attach(self: &Arc<Self>, notifier: &dyn SceneNotifier) -> bool {
        if self.attached.swap(true, Ordering::AcqRel) {
            log::debug!("Scene bridge already attached; ignoring.");
            return false;
        }
        let observer: Arc<dyn SceneObserver> = Arc::clone(self) as Arc<dyn SceneObserver>;
        notifier.subscribe(observer);
        log::info!("Scene bridge attached.");
        true
    }

    /// Returns `true` once [`attach`](Self::attach) has subscribed the
    /// bridge.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Activates the scope of `scene` unless the bridge already did.
    ///
    /// ## Returns
    ///
    /// `true` if this call activated the scope.
    pub fn ensure_scene_scope(&self, scene: &str) -> bool {
        let Some(scope) = self.scope_of(scene) else {
            return false;
        };
        if !self.lock().insert(scope.clone()) {
            log::trace!("Scene '{scene}' already tracked as active.");
            return false;
        }
        // Hooks run by activation may load further scenes; no lock is held.
        self.dispatcher.activate_scope(scope)
    }

    /// Deactivates the scope of `scene` if the bridge activated it.
    ///
    /// ## Returns
    ///
    /// `true` if this call deactivated the scope.
    pub fn release_scene_scope(&self, scene: &str) -> bool {
        let Some(scope) = self.scope_of(scene) else {
            return false;
        };
        if !self.lock().remove(&scope) {
            log::trace!("Scene '{scene}' is not tracked; leaving its scope alone.");
            return false;
        }
        self.dispatcher.deactivate_scope(scope)
    }

    /// The scopes currently activated through the bridge, sorted.
    pub fn tracked_scopes(&self) -> Vec<ScopeId> {
        self.lock().iter().cloned().collect()
    }

    fn scope_of(&self, scene: &str) -> Option<ScopeId> {
        match self.dispatcher.resolve_scope(scene) {
            Some(scope) if scope.is_global() => {
                log::debug!("Scene '{scene}' maps to the global scope; nothing to do.");
                None
            }
            Some(scope) => Some(scope),
            None if self.warn_unmapped => {
                self.dispatcher
                    .fault_sink()
                    .report(DispatchFault::UnmappedScene {
                        scene: scene.to_string(),
                    });
                None
            }
            None => {
                log::debug!("Scene '{scene}' has no matching scope.");
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<ScopeId>> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SceneObserver for SceneScopeBridge {
    fn on_scene_loaded(&self, scene: &str) {
        self.ensure_scene_scope(scene);
    }

    fn on_scene_unloaded(&self, scene: &str) {
        self.release_scene_scope(scene);
    }
}

impl fmt::Debug for SceneScopeBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneScopeBridge")
            .field("tracked", &self.tracked_scopes())
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_control::{CatalogBuilder, HandlerContext};
    use relay_telemetry::FaultRecorder;

    #[derive(Default)]
    struct FakeScenes {
        observers: Mutex<Vec<Arc<dyn SceneObserver>>>,
    }

    impl FakeScenes {
        fn load(&self, scene: &str) {
            let observers = self.observers.lock().unwrap().clone();
            for observer in observers {
                observer.on_scene_loaded(scene);
            }
        }

        fn unload(&self, scene: &str) {
            let observers = self.observers.lock().unwrap().clone();
            for observer in observers {
                observer.on_scene_unloaded(scene);
            }
        }
    }

    impl SceneNotifier for FakeScenes {
        fn subscribe(&self, observer: Arc<dyn SceneObserver>) {
            self.observers.lock().unwrap().push(observer);
        }
    }

    fn bridge(faults: Arc<FaultRecorder>, warn_unmapped: bool) -> Arc<SceneScopeBridge> {
        let dispatcher = RequestDispatcher::builder()
            .fault_sink(faults)
            .feature(|catalog: &mut CatalogBuilder| {
                catalog
                    .scope("Lobby")
                    .request("lobby.refresh.request", |_ctx: &HandlerContext<'_>| {});
            })
            .build();
        Arc::new(SceneScopeBridge::new(Arc::new(dispatcher), warn_unmapped))
    }

    #[test]
    fn test_attach_subscribes_once() {
        let scenes = FakeScenes::default();
        let bridge = bridge(Arc::new(FaultRecorder::silent()), true);

        assert!(bridge.attach(&scenes));
        assert!(!bridge.attach(&scenes));
        assert_eq!(scenes.observers.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_load_and_unload_drive_scope() {
        let scenes = FakeScenes::default();
        let bridge = bridge(Arc::new(FaultRecorder::silent()), true);
        bridge.attach(&scenes);

        scenes.load("Lobby");
        assert!(bridge.dispatcher.is_routable("lobby.refresh.request"));
        assert_eq!(bridge.tracked_scopes(), vec![ScopeId::from("Lobby")]);

        scenes.unload("Lobby");
        assert!(!bridge.dispatcher.is_routable("lobby.refresh.request"));
        assert!(bridge.tracked_scopes().is_empty());
    }

    #[test]
    fn test_explicit_and_notified_activation_happen_once() {
        let scenes = FakeScenes::default();
        let bridge = bridge(Arc::new(FaultRecorder::silent()), true);
        bridge.attach(&scenes);

        assert!(bridge.ensure_scene_scope("Lobby"));
        scenes.load("Lobby");
        assert!(!bridge.ensure_scene_scope("Lobby"));
        assert_eq!(bridge.tracked_scopes().len(), 1);
    }

    #[test]
    fn test_unmapped_scene_is_a_warning() {
        let faults = Arc::new(FaultRecorder::silent());
        let bridge = bridge(faults.clone(), true);

        assert!(!bridge.ensure_scene_scope("Splash"));
        assert_eq!(faults.kinds(), vec!["unmapped_scene"]);
        assert!(bridge.tracked_scopes().is_empty());
    }

    #[test]
    fn test_unmapped_scene_can_be_quiet() {
        let faults = Arc::new(FaultRecorder::silent());
        let bridge = bridge(faults.clone(), false);

        bridge.ensure_scene_scope("Splash");
        assert!(faults.is_empty());
    }

    #[test]
    fn test_untracked_unload_leaves_scope_alone() {
        let bridge = bridge(Arc::new(FaultRecorder::silent()), true);
        bridge.dispatcher.activate_scope("Lobby");

        assert!(!bridge.release_scene_scope("Lobby"));
        assert!(bridge.dispatcher.is_routable("lobby.refresh.request"));
    }
}

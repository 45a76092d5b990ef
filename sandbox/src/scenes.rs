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

//! A stand-in for the engine's scene manager.

use relay_sdk::scene::{SceneNotifier, SceneObserver};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeSceneManager {
    observers: Mutex<Vec<Arc<dyn SceneObserver>>>,
}

impl FakeSceneManager {
    pub fn load(&self, scene: &str) {
        log::info!("Loading scene '{scene}'.");
        for observer in self.snapshot() {
            observer.on_scene_loaded(scene);
        }
    }

    pub fn unload(&self, scene: &str) {
        log::info!("Unloading scene '{scene}'.");
        for observer in self.snapshot() {
            observer.on_scene_unloaded(scene);
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn SceneObserver>> {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl SceneNotifier for FakeSceneManager {
    fn subscribe(&self, observer: Arc<dyn SceneObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }
}

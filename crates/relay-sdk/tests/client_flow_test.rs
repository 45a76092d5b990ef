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

//! End-to-end client flows with explicitly registered features.

use relay_sdk::prelude::*;
use relay_telemetry::FaultRecorder;
use std::sync::{Arc, Mutex};
use std::thread;

relay_sdk::routing_keys! {
    mod login {
        ECHO_REQUEST = "login.echo.request";
        ECHO_EVENT = "login.echo.event";
        PIN_REQUEST = "login.pin.request";
    }
}

relay_sdk::routing_keys! {
    mod lobby {
        CHAT_REQUEST = "room.chat.request";
        CHAT_EVENT = "room.chat.event";
    }
}

struct LoginFeature;

impl Feature for LoginFeature {
    fn name(&self) -> &str {
        "login"
    }

    fn register(&self, catalog: &mut CatalogBuilder) {
        catalog
            .global()
            .request_with(login::ECHO_REQUEST, |ctx: &HandlerContext<'_>, text: &String| {
                ctx.publish(login::ECHO_EVENT, Payload::new(text.clone()));
            })
            .request_with(
                login::PIN_REQUEST,
                |_ctx: &HandlerContext<'_>, pin: &i32| -> Result<(), String> {
                    Err(format!("pin {pin} rejected"))
                },
            );
    }
}

/// Two scenes answering the same chat key, each tagging the echoed line.
fn rooms(catalog: &mut CatalogBuilder) {
    for room in ["Lobby", "Match"] {
        catalog
            .scope(room)
            .request_with(lobby::CHAT_REQUEST, move |ctx: &HandlerContext<'_>, line: &String| {
                ctx.publish(lobby::CHAT_EVENT, Payload::new(format!("[{room}] {line}")));
            });
    }
}

fn client(faults: &Arc<FaultRecorder>) -> Client {
    Client::builder()
        .config(ClientConfig {
            discover_declarations: false,
            ..ClientConfig::default()
        })
        .fault_sink(faults.clone())
        .feature(LoginFeature)
        .feature(rooms)
        .build()
}

fn collect<T: Clone + Send + Sync + 'static>(client: &Client, key: &'static str) -> Arc<Mutex<Vec<T>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    client.subscribe(key, listener::typed(move |value: &T| sink.lock().unwrap().push(value.clone())));
    seen
}

#[derive(Default)]
struct FakeSceneManager {
    observers: Mutex<Vec<Arc<dyn SceneObserver>>>,
}

impl FakeSceneManager {
    fn load(&self, scene: &str) {
        for observer in self.observers.lock().unwrap().clone() {
            observer.on_scene_loaded(scene);
        }
    }

    fn unload(&self, scene: &str) {
        for observer in self.observers.lock().unwrap().clone() {
            observer.on_scene_unloaded(scene);
        }
    }
}

impl SceneNotifier for FakeSceneManager {
    fn subscribe(&self, observer: Arc<dyn SceneObserver>) {
        self.observers.lock().unwrap().push(observer);
    }
}

#[derive(Default)]
struct ChatPanel {
    lines: Mutex<Vec<String>>,
}

#[relay_sdk::view_listeners]
impl ChatPanel {
    #[listen("room.chat.event")]
    fn on_chat(&self, line: &String) {
        self.lines.lock().unwrap().push(line.clone());
    }

    #[listen("room.clear.event")]
    #[listen("login.logout.event")]
    fn on_clear(&self) {
        self.lines.lock().unwrap().clear();
    }
}

#[test]
fn test_ping_reaches_subscriber_once() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = client(&faults);
    let seen = collect::<i32>(&client, "ping");

    assert_eq!(client.publish("ping", Payload::new(42_i32)), 1);
    assert_eq!(*seen.lock().unwrap(), vec![42]);
}

#[test]
fn test_echo_request_publishes_event() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = client(&faults);
    let seen = collect::<String>(&client, "login.echo.event");

    client.send_request(login::ECHO_REQUEST, Payload::new("hello".to_string()));

    assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    assert!(faults.is_empty());
}

#[test]
fn test_mismatched_payload_is_one_fault() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = client(&faults);
    let keys_before = client.dispatcher().active_keys();

    client.send_request(login::PIN_REQUEST, Payload::new("not-an-int"));

    assert_eq!(faults.kinds(), vec!["payload_mismatch"]);
    assert_eq!(client.dispatcher().active_keys(), keys_before);
}

#[test]
fn test_unknown_key_is_one_fault() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = client(&faults);

    client.send_request("nonexistent.key", Payload::empty());
    assert_eq!(faults.kinds(), vec!["unknown_key"]);
}

#[test]
fn test_scene_bridge_follows_scene_lifecycle() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = client(&faults);
    let scenes = FakeSceneManager::default();
    assert!(client.attach_scenes(&scenes));
    assert!(!client.attach_scenes(&scenes));
    let seen = collect::<String>(&client, "room.chat.event");

    scenes.load("Lobby");
    scenes.load("Match");
    client.send_request(lobby::CHAT_REQUEST, Payload::new("gg".to_string()));

    // Lobby activated first and keeps the key.
    assert_eq!(*seen.lock().unwrap(), vec!["[Lobby] gg".to_string()]);
    assert_eq!(faults.kinds(), vec!["duplicate_key"]);

    scenes.unload("Match");
    assert_eq!(client.dispatcher().owner_of(lobby::CHAT_REQUEST), Some(ScopeId::from("Lobby")));

    scenes.unload("Lobby");
    assert!(!client.dispatcher().is_routable(lobby::CHAT_REQUEST));
    assert!(client.scene_bridge().unwrap().tracked_scopes().is_empty());
}

#[test]
fn test_unmapped_scene_changes_nothing() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = client(&faults);
    let scenes = FakeSceneManager::default();
    client.attach_scenes(&scenes);
    let scopes_before = client.dispatcher().active_scopes();

    scenes.load("SplashScreen");

    assert_eq!(client.dispatcher().active_scopes(), scopes_before);
    assert_eq!(faults.kinds(), vec!["unmapped_scene"]);
}

#[test]
fn test_view_binder_follows_enable_and_disable() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = client(&faults);
    client.enter_scene("Lobby");
    let panel = Arc::new(ChatPanel::default());
    let binder = client.binder_for(&panel);

    assert_eq!(binder.on_enable(), 3);
    client.send_request(lobby::CHAT_REQUEST, Payload::new("hi".to_string()));
    assert_eq!(*panel.lines.lock().unwrap(), vec!["[Lobby] hi".to_string()]);

    client.publish("login.logout.event", Payload::empty());
    assert!(panel.lines.lock().unwrap().is_empty());

    binder.on_disable();
    client.send_request(lobby::CHAT_REQUEST, Payload::new("unseen".to_string()));
    assert!(panel.lines.lock().unwrap().is_empty());

    drop(binder);
    assert_eq!(client.bus().subscriber_count("room.chat.event"), 0);
    assert!(faults.is_empty());
}

#[test]
fn test_listener_mismatch_is_isolated() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = client(&faults);
    let panel = Arc::new(ChatPanel::default());
    let binder = client.binder_for(&panel);
    binder.bind();
    let seen = collect::<u8>(&client, "room.chat.event");

    assert_eq!(client.publish("room.chat.event", Payload::new(5_u8)), 2);

    assert_eq!(*seen.lock().unwrap(), vec![5]);
    assert_eq!(faults.kinds(), vec!["payload_mismatch"]);
}

#[test]
fn test_background_thread_marshals_through_pump() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = client(&faults);
    let seen = collect::<String>(&client, "login.echo.event");
    let handle = client.dispatch_handle();

    let network = thread::spawn(move || {
        handle.request(login::ECHO_REQUEST, Payload::new("first".to_string()));
        handle.publish(login::ECHO_EVENT, Payload::new("second".to_string()));
    });
    network.join().unwrap();

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(client.pump(), 2);
    assert_eq!(*seen.lock().unwrap(), vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn test_disabled_bridge_from_config() {
    let faults = Arc::new(FaultRecorder::silent());
    let config = ClientConfig::from_ron_str("(scene_bridge: false, discover_declarations: false)").unwrap();
    let client = Client::builder()
        .config(config)
        .fault_sink(faults.clone())
        .feature(rooms)
        .build();

    assert!(!client.attach_scenes(&FakeSceneManager::default()));
    assert!(client.enter_scene("Match"));
    assert_eq!(client.dispatcher().owner_of(lobby::CHAT_REQUEST), Some(ScopeId::from("Match")));
}

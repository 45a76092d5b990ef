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

//! Handlers and hooks declared with the attribute markers.
//!
//! Every declaration in this file is linked into the test binary, so each
//! test builds its own client and observes effects through that client's bus.

use relay_sdk::prelude::*;
use relay_telemetry::FaultRecorder;
use std::sync::{Arc, Mutex};

relay_sdk::routing_keys! {
    mod keys {
        ECHO_REQUEST = "login.echo.request";
        ECHO_EVENT = "login.echo.event";
        VERSION_QUERY = "stats.version.query";
        SQUARE_QUERY = "arcade.square.query";
        PROFILE_REQUEST = "arcade.profile.request";
        PROFILE_EVENT = "arcade.profile.event";
        BUY_REQUEST = "shop.buy.request";
        PARK_REQUEST = "garage.park.request";
        GARAGE_EVENT = "garage.state.event";
    }
}

#[request(keys::ECHO_REQUEST)]
fn echo(ctx: &HandlerContext<'_>, text: &String) {
    ctx.publish(keys::ECHO_EVENT, Payload::new(text.clone()));
}

#[query(keys::VERSION_QUERY)]
fn version() -> u32 {
    3
}

#[query(key = keys::SQUARE_QUERY, scope = "Arcade")]
fn square(value: &u32) -> u32 {
    value * value
}

#[request(key = keys::PROFILE_REQUEST, scope = "Arcade")]
fn load_profile(ctx: &HandlerContext<'_>, name: Option<&String>) {
    let name = name.cloned().unwrap_or_else(|| "guest".to_string());
    ctx.publish(keys::PROFILE_EVENT, Payload::new(name));
}

#[request(keys::BUY_REQUEST)]
fn buy(item: &u32) -> Result<(), String> {
    match item {
        0 => Err("no such item".to_string()),
        _ => Ok(()),
    }
}

#[on_scope_enter]
fn client_ready(ctx: &HandlerContext<'_>) {
    ctx.publish("client.ready.event", Payload::empty());
}

#[on_scope_enter("Arcade")]
fn arcade_opened(ctx: &HandlerContext<'_>) {
    ctx.publish("arcade.hook.event", Payload::new("opened"));
}

#[on_scope_exit(scope = "Arcade")]
fn arcade_closed(ctx: &HandlerContext<'_>) {
    ctx.publish("arcade.hook.event", Payload::new("closed"));
}

#[scope_members("Garage")]
mod garage {
    use super::*;

    #[request(keys::PARK_REQUEST)]
    fn park(ctx: &HandlerContext<'_>, slot: &u32) {
        ctx.publish(keys::GARAGE_EVENT, Payload::new(format!("parked {slot}")));
    }

    #[on_scope_enter]
    fn garage_opened(ctx: &HandlerContext<'_>) {
        ctx.publish(keys::GARAGE_EVENT, Payload::new("opened".to_string()));
    }
}

#[derive(Default)]
struct ProfileCard {
    names: Mutex<Vec<String>>,
}

#[view_listeners]
impl ProfileCard {
    #[listen(keys::PROFILE_EVENT)]
    fn on_profile(&self, name: &String) {
        self.names.lock().unwrap().push(name.clone());
    }

    fn clear(&self) {
        self.names.lock().unwrap().clear();
    }
}

fn declared_client(faults: &Arc<FaultRecorder>) -> Client {
    Client::builder().fault_sink(faults.clone()).build()
}

fn collect<T: Clone + Send + Sync + 'static>(client: &Client, key: &'static str) -> Arc<Mutex<Vec<T>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    client.subscribe(key, listener::typed(move |value: &T| sink.lock().unwrap().push(value.clone())));
    seen
}

#[test]
fn test_declarations_are_discovered() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = declared_client(&faults);
    let catalog = client.start();

    assert_eq!(catalog.handler_count(), 6);
    assert_eq!(catalog.hook_count(), 4);
    assert!(catalog.resolve("Arcade").is_some());
    let echoes = catalog.handlers_for(keys::ECHO_REQUEST.as_str());
    assert_eq!(echoes.len(), 1);
    assert!(echoes[0].origin().contains("echo"));
    assert!(faults.is_empty());
}

#[test]
fn test_global_enter_hook_runs_at_discovery() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = declared_client(&faults);
    let ready = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&ready);
    client.subscribe(
        "client.ready.event",
        listener::untyped(move || *counter.lock().unwrap() += 1),
    );

    client.start();
    client.start();
    assert_eq!(*ready.lock().unwrap(), 1);
}

#[test]
fn test_declared_request_and_query() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = declared_client(&faults);
    let echoed = collect::<String>(&client, "login.echo.event");

    client.send_request(keys::ECHO_REQUEST, Payload::new("hello".to_string()));
    assert_eq!(*echoed.lock().unwrap(), vec!["hello".to_string()]);
    assert_eq!(client.send_request_for::<u32>(keys::VERSION_QUERY, Payload::empty()), Some(3));
    assert!(faults.is_empty());
}

#[test]
fn test_scoped_declarations_follow_activation() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = declared_client(&faults);
    let hooks = collect::<&'static str>(&client, "arcade.hook.event");

    assert_eq!(client.send_request_for::<u32>(keys::SQUARE_QUERY, Payload::new(4_u32)), None);
    assert_eq!(faults.kinds(), vec!["unknown_key"]);

    assert!(client.enter_scene("Arcade"));
    assert_eq!(client.send_request_for::<u32>(keys::SQUARE_QUERY, Payload::new(4_u32)), Some(16));
    assert!(client.leave_scene("Arcade"));

    assert_eq!(*hooks.lock().unwrap(), vec!["opened", "closed"]);
}

#[test]
fn test_module_scope_applies_to_its_markers() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = declared_client(&faults);
    let states = collect::<String>(&client, "garage.state.event");

    let catalog = client.start();
    let garage = catalog.resolve("Garage").expect("garage scope");
    let parks = catalog.handlers_for(keys::PARK_REQUEST.as_str());
    assert_eq!(parks[0].scope(), &garage);

    client.send_request(keys::PARK_REQUEST, Payload::new(2_u32));
    assert_eq!(faults.kinds(), vec!["unknown_key"]);

    assert!(client.enter_scene("Garage"));
    client.send_request(keys::PARK_REQUEST, Payload::new(2_u32));
    assert_eq!(*states.lock().unwrap(), vec!["opened".to_string(), "parked 2".to_string()]);
}

#[test]
fn test_optional_payload_and_view_listener() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = declared_client(&faults);
    client.activate_scope("Arcade");
    let card = Arc::new(ProfileCard::default());
    let binder = client.binder_for(&card);
    binder.bind();

    client.send_request(keys::PROFILE_REQUEST, Payload::empty());
    client.send_request(keys::PROFILE_REQUEST, Payload::new("ada".to_string()));
    assert_eq!(*card.names.lock().unwrap(), vec!["guest".to_string(), "ada".to_string()]);

    card.clear();
    client.send_request(keys::PROFILE_REQUEST, Payload::new(7_u8));
    assert!(card.names.lock().unwrap().is_empty());
    assert_eq!(faults.kinds(), vec!["payload_mismatch"]);
}

#[test]
fn test_failing_declared_handler_is_absorbed() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = declared_client(&faults);

    client.send_request(keys::BUY_REQUEST, Payload::new(0_u32));
    client.send_request(keys::BUY_REQUEST, Payload::new(12_u32));

    assert_eq!(faults.kinds(), vec!["handler_failed"]);
    assert!(client.dispatcher().is_routable(keys::BUY_REQUEST));
}

#[test]
fn test_declarations_ignored_when_disabled() {
    let faults = Arc::new(FaultRecorder::silent());
    let client = Client::builder()
        .config(ClientConfig {
            discover_declarations: false,
            ..ClientConfig::default()
        })
        .fault_sink(faults.clone())
        .build();

    assert_eq!(client.start().handler_count(), 0);
    assert!(!client.dispatcher().is_routable(keys::ECHO_REQUEST));
}

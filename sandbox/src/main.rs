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

// Relay Sandbox
// A scripted game client session exercising the dispatch runtime.

mod keys;
mod lobby;
mod login;
mod scenes;
mod views;

use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use relay_sdk::prelude::*;
use relay_telemetry::FaultRecorder;

use crate::keys::{lobby as lobby_keys, login as login_keys, net};
use crate::lobby::LobbyFeature;
use crate::login::Credentials;
use crate::scenes::FakeSceneManager;
use crate::views::{LobbyPanel, LoginLabel};

fn load_config() -> Result<ClientConfig> {
    match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(&path).with_context(|| format!("loading {path}")),
        None => Ok(ClientConfig::default()),
    }
}

fn main() -> Result<()> {
    let config = load_config()?;
    relay_telemetry::init_logging(&config.log_filter);

    let faults = Arc::new(FaultRecorder::new());
    let client = Client::builder()
        .config(config)
        .fault_sink(faults.clone())
        .feature(LobbyFeature::default())
        .build();
    let scenes = FakeSceneManager::default();
    client.attach_scenes(&scenes);
    client.start();

    // Login screen.
    let label = Arc::new(LoginLabel::default());
    let label_binder = client.binder_for(&label);
    label_binder.on_enable();

    client.send_request(login_keys::ECHO_REQUEST, Payload::new("hello".to_string()));
    client.send_request(
        login_keys::SUBMIT_REQUEST,
        Payload::new(Credentials {
            user: "ada".to_string(),
            pin: 1234,
        }),
    );
    client.send_request(
        login_keys::SUBMIT_REQUEST,
        Payload::new(Credentials {
            user: " ".to_string(),
            pin: 0,
        }),
    );
    client.send_request(login_keys::SUBMIT_REQUEST, Payload::new(1234_u32));

    // Lobby scene.
    scenes.load("Splash");
    scenes.load("Lobby");
    let panel = Arc::new(LobbyPanel::default());
    let panel_binder = client.binder_for(&panel);
    panel_binder.on_enable();

    client.send_request(lobby_keys::JOIN_REQUEST, Payload::new("ada".to_string()));
    client.send_request(lobby_keys::JOIN_REQUEST, Payload::new("grace".to_string()));
    let players = client.send_request_for::<usize>(lobby_keys::PLAYERS_QUERY, Payload::empty());
    log::info!("Players in lobby: {players:?}");

    // Network replies come back on another thread and are applied on this one.
    let handle = client.dispatch_handle();
    let network = thread::spawn(move || {
        handle.publish(net::MOTD_EVENT, Payload::new("Season 2 is live".to_string()));
        handle.request(lobby_keys::CHAT_REQUEST, Payload::new("gl hf".to_string()));
    });
    network
        .join()
        .map_err(|_| anyhow!("network thread panicked"))?;
    let applied = client.pump();
    log::info!("Applied {applied} deferred item(s); {} chat line(s) shown.", panel.chat_lines());

    // Leave the lobby: its keys stop being routable.
    panel_binder.on_disable();
    scenes.unload("Lobby");
    client.send_request(lobby_keys::JOIN_REQUEST, Payload::new("late".to_string()));
    label_binder.on_disable();

    log::info!("--- Fault Summary ---");
    for kind in faults.kinds() {
        log::info!("  {kind}");
    }
    log::info!("  total: {}", faults.len());
    Ok(())
}

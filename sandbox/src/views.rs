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

//! Views of the sandbox. They only ever see events.

use crate::keys::{lobby, login, net};
use relay_sdk::prelude::*;
use std::sync::Mutex;

/// The login form's status label.
#[derive(Default)]
pub struct LoginLabel {
    text: Mutex<String>,
}

#[view_listeners]
impl LoginLabel {
    #[listen(login::ECHO_EVENT)]
    fn on_echo(&self, text: &String) {
        self.show(format!("echo: {text}"));
    }

    #[listen(login::ACCEPTED_EVENT)]
    fn on_accepted(&self, user: &String) {
        self.show(format!("welcome, {user}"));
    }

    #[listen(login::REJECTED_EVENT)]
    fn on_rejected(&self, user: &String) {
        self.show(format!("wrong pin for {user}"));
    }

    fn show(&self, text: String) {
        log::info!("[login label] {text}");
        *self.text.lock().unwrap_or_else(|e| e.into_inner()) = text;
    }
}

/// A status line shared by several screens.
#[derive(Default)]
pub struct StatusBar {
    message: Mutex<Option<String>>,
}

#[view_listeners]
impl StatusBar {
    #[listen(net::MOTD_EVENT)]
    fn on_motd(&self, message: Option<&String>) {
        let message = message.cloned();
        log::info!("[status] {}", message.as_deref().unwrap_or("<no message>"));
        *self.message.lock().unwrap_or_else(|e| e.into_inner()) = message;
    }
}

/// The lobby screen: roster, chat and the shared status bar.
#[derive(Default)]
pub struct LobbyPanel {
    status: StatusBar,
    roster: Mutex<Vec<String>>,
    chat: Mutex<Vec<String>>,
}

impl LobbyPanel {
    fn status(&self) -> &StatusBar {
        &self.status
    }

    pub fn chat_lines(&self) -> usize {
        self.chat.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl EventListeners for LobbyPanel {
    fn listeners(set: &mut ListenerSet<Self>) {
        set.include(LobbyPanel::status)
            .on_typed(lobby::ROSTER_EVENT, |panel: &LobbyPanel, roster: &Vec<String>| {
                log::info!("[lobby] players: {}", roster.join(", "));
                *panel.roster.lock().unwrap_or_else(|e| e.into_inner()) = roster.clone();
            })
            .on_typed(lobby::CHAT_EVENT, |panel: &LobbyPanel, line: &String| {
                log::info!("[lobby] chat: {line}");
                panel.chat.lock().unwrap_or_else(|e| e.into_inner()).push(line.clone());
            });
    }
}

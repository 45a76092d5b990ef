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

//! The lobby feature, registered explicitly.

use crate::keys::lobby;
use relay_sdk::prelude::*;
use std::sync::{Arc, Mutex};

pub const LOBBY_SCOPE: &str = "Lobby";

/// Players currently in the lobby.
#[derive(Default)]
pub struct LobbyFeature {
    roster: Arc<Mutex<Vec<String>>>,
}

impl Feature for LobbyFeature {
    fn name(&self) -> &str {
        "lobby"
    }

    fn register(&self, catalog: &mut CatalogBuilder) {
        let join_roster = Arc::clone(&self.roster);
        let query_roster = Arc::clone(&self.roster);
        let reset_roster = Arc::clone(&self.roster);

        catalog
            .scope(LOBBY_SCOPE)
            .request_with(lobby::JOIN_REQUEST, move |ctx: &HandlerContext<'_>, player: &String| {
                let roster = {
                    let mut roster = join_roster.lock().unwrap_or_else(|e| e.into_inner());
                    roster.push(player.clone());
                    roster.clone()
                };
                ctx.publish(lobby::ROSTER_EVENT, Payload::new(roster));
            })
            .request_with(lobby::CHAT_REQUEST, |ctx: &HandlerContext<'_>, line: &String| {
                ctx.publish(lobby::CHAT_EVENT, Payload::new(line.clone()));
            })
            .query(lobby::PLAYERS_QUERY, move |_ctx: &HandlerContext<'_>| {
                query_roster.lock().unwrap_or_else(|e| e.into_inner()).len()
            })
            .on_enter(|ctx: &HandlerContext<'_>| log::info!("Entered {}.", ctx.scope()))
            .on_exit(move |ctx: &HandlerContext<'_>| {
                reset_roster.lock().unwrap_or_else(|e| e.into_inner()).clear();
                log::info!("Left {}; roster cleared.", ctx.scope());
            });
    }
}

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

//! Routing keys of the sandbox features.

relay_sdk::routing_keys! {
    /// Login screen.
    pub mod login {
        SUBMIT_REQUEST = "login.submit.request";
        ECHO_REQUEST = "login.echo.request";
        ECHO_EVENT = "login.echo.event";
        ACCEPTED_EVENT = "login.accepted.event";
        REJECTED_EVENT = "login.rejected.event";
    }
}

relay_sdk::routing_keys! {
    /// Lobby scene.
    pub mod lobby {
        JOIN_REQUEST = "lobby.join.request";
        CHAT_REQUEST = "lobby.chat.request";
        PLAYERS_QUERY = "lobby.players.query";
        ROSTER_EVENT = "lobby.roster.event";
        CHAT_EVENT = "lobby.chat.event";
    }
}

relay_sdk::routing_keys! {
    /// Replies arriving from the network thread.
    pub mod net {
        MOTD_EVENT = "net.motd.event";
    }
}

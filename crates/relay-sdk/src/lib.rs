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

//! # Relay SDK
//!
//! The public face of the dispatch runtime for game clients.
//!
//! Views never call controller logic directly. They send keyed requests
//! through the [`Client`], which routes them to the handlers of the active
//! scopes, and they receive keyed events published on the bus through a
//! [`ViewBinder`](view::ViewBinder). Scopes follow the engine's scenes
//! through the [`SceneScopeBridge`](scene::SceneScopeBridge).
//!
//! ```ignore
//! use relay_sdk::prelude::*;
//!
//! #[request("login.echo.request")]
//! fn echo(ctx: &HandlerContext<'_>, text: &String) {
//!     ctx.publish("login.echo.event", Payload::new(text.clone()));
//! }
//!
//! let client = Client::builder().build();
//! client.send_request("login.echo.request", Payload::new("hello".to_string()));
//! ```

#![warn(missing_docs)]

extern crate self as relay_sdk;

mod client;
pub mod config;
pub mod queue;
pub mod scene;
pub mod view;

pub use relay_control as control;
pub use relay_core as core;

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, ConfigError};
pub use relay_core::routing_keys;
pub use relay_macros::{
    listen, on_scope_enter, on_scope_exit, query, request, scope_members, view_listeners,
};

/// Everything a feature or view module usually needs.
pub mod prelude {
    pub use crate::scene::{SceneNotifier, SceneObserver};
    pub use crate::view::{EventListeners, ListenerSet, ViewBinder};
    pub use crate::{Client, ClientBuilder, ClientConfig};
    pub use relay_control::{CatalogBuilder, Feature, HandlerContext, ScopeBuilder};
    pub use relay_core::event::listener;
    pub use relay_core::{EventHandler, HandlerError, Payload, RoutingKey, ScopeId};
    pub use relay_macros::{
        listen, on_scope_enter, on_scope_exit, query, request, scope_members, view_listeners,
    };
}

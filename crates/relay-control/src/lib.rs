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

//! # Relay Control
//!
//! Request routing for the dispatch runtime.
//!
//! Features declare request handlers and scope hooks, either explicitly
//! through a [`Feature`] or with the attribute markers of `relay-macros`,
//! which submit a [`Declaration`] to the link-time inventory. On first use
//! the [`RequestDispatcher`] discovers every declaration into a
//! [`ScopeCatalog`], activates [`ScopeId::GLOBAL`](relay_core::ScopeId::GLOBAL),
//! and from then on routes requests to the handlers of the active scopes.

#![warn(missing_docs)]

pub mod context;
pub mod declaration;
pub mod registry;
pub mod service;

pub use context::{HandlerContext, ScopeState};
pub use declaration::{CatalogBuilder, Declaration, Feature, ScopeBuilder};
pub use registry::{HandlerDescriptor, HookDescriptor, RequestInvoker, ScopeBindings, ScopeCatalog, ScopeHook};
pub use service::{DispatcherBuilder, RequestDispatcher};

#[doc(hidden)]
pub use inventory;

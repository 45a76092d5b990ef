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

//! # Relay Core
//!
//! Foundational crate containing the vocabulary shared by every layer of the
//! dispatch runtime: routing keys, scope identifiers, type-erased payloads,
//! handler outcomes, the fault taxonomy, and the synchronous [`EventBus`].

#![warn(missing_docs)]

pub mod event;
pub mod fault;
pub mod key;
pub mod outcome;
pub mod payload;

pub use event::{EventBus, EventHandler};
pub use fault::{DispatchFault, FaultSeverity, FaultSink, HookPhase, LogSink};
pub use key::{RoutingKey, ScopeId};
pub use outcome::{run_isolated, HandlerError, HandlerOutcome, HandlerResult};
pub use payload::Payload;

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

//! Context handed to request handlers and scope hooks.

use crate::service::RequestDispatcher;
use relay_core::{EventBus, Payload, RoutingKey, ScopeId};

/// The activation state of one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeState {
    /// The scope's handlers are not routable. Every scope starts here.
    #[default]
    Inactive,
    /// The scope's handlers are in the active invoker table.
    Active,
}

impl ScopeState {
    /// Returns `true` if moving to `next` is a real transition.
    ///
    /// Re-entering the current state is a no-op for the lifecycle manager.
    pub fn can_transition_to(self, next: ScopeState) -> bool {
        self != next
    }

    /// Returns `true` for [`ScopeState::Active`].
    pub fn is_active(self) -> bool {
        self == ScopeState::Active
    }
}

/// What a request handler or scope hook can reach while it runs.
///
/// The context replaces process-wide singletons: the bus and the dispatcher
/// are the ones owned by the application root, borrowed for the duration of
/// the call.
pub struct HandlerContext<'a> {
    dispatcher: &'a RequestDispatcher,
    scope: &'a ScopeId,
    key: Option<&'a RoutingKey>,
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn new(
        dispatcher: &'a RequestDispatcher,
        scope: &'a ScopeId,
        key: Option<&'a RoutingKey>,
    ) -> Self {
        Self {
            dispatcher,
            scope,
            key,
        }
    }

    /// The event bus controllers publish to.
    pub fn bus(&self) -> &'a EventBus {
        self.dispatcher.bus()
    }

    /// The dispatcher running this handler, for nested requests or scope
    /// changes.
    pub fn dispatcher(&self) -> &'a RequestDispatcher {
        self.dispatcher
    }

    /// The scope that owns the running handler or hook.
    pub fn scope(&self) -> &'a ScopeId {
        self.scope
    }

    /// The request key being served. `None` inside scope hooks.
    pub fn key(&self) -> Option<&'a RoutingKey> {
        self.key
    }

    /// Publishes an event on the bus.
    pub fn publish(&self, key: impl AsRef<str>, payload: Payload) -> usize {
        self.bus().publish(key, payload)
    }
}

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

//! Discovered handler metadata grouped by scope.

use crate::context::HandlerContext;
use relay_core::{DispatchFault, HandlerError, HandlerResult, HookPhase, Payload, RoutingKey, ScopeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A compiled, type-erased request handler.
///
/// The invoker checks the payload against the handler's declared parameter
/// type and wraps whatever the handler returns into a [`Payload`]. Procedures
/// return [`Payload::empty`].
pub type RequestInvoker =
    Arc<dyn Fn(&HandlerContext<'_>, &Payload) -> Result<Payload, HandlerError> + Send + Sync>;

/// A compiled scope enter or exit hook.
pub type ScopeHook = Arc<dyn Fn(&HandlerContext<'_>) -> HandlerResult + Send + Sync>;

/// One request handler, created once at discovery and immutable thereafter.
pub struct HandlerDescriptor {
    pub(crate) key: RoutingKey,
    pub(crate) scope: ScopeId,
    pub(crate) origin: String,
    pub(crate) payload_type: Option<&'static str>,
    pub(crate) result_type: Option<&'static str>,
    pub(crate) invoker: RequestInvoker,
}

impl HandlerDescriptor {
    /// The request key this handler answers.
    pub fn key(&self) -> &RoutingKey {
        &self.key
    }

    /// The scope the handler belongs to.
    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    /// Where the handler was declared.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The declared payload type, `None` for zero-parameter handlers.
    pub fn payload_type(&self) -> Option<&'static str> {
        self.payload_type
    }

    /// The declared result type, `None` for procedures.
    pub fn result_type(&self) -> Option<&'static str> {
        self.result_type
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .field("origin", &self.origin)
            .field("payload_type", &self.payload_type)
            .field("result_type", &self.result_type)
            .finish_non_exhaustive()
    }
}

/// One scope enter or exit hook.
pub struct HookDescriptor {
    pub(crate) scope: ScopeId,
    pub(crate) phase: HookPhase,
    pub(crate) origin: String,
    pub(crate) hook: ScopeHook,
}

impl HookDescriptor {
    /// The scope the hook belongs to.
    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    /// The transition the hook runs on.
    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    /// Where the hook was declared.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl fmt::Debug for HookDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDescriptor")
            .field("scope", &self.scope)
            .field("phase", &self.phase)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Everything one scope declares: its handlers and its hooks, in
/// declaration order.
///
/// Bindings outlive deactivation. Only the dispatcher's active table changes
/// when a scope is toggled.
#[derive(Debug, Default)]
pub struct ScopeBindings {
    handlers: Vec<Arc<HandlerDescriptor>>,
    enter_hooks: Vec<Arc<HookDescriptor>>,
    exit_hooks: Vec<Arc<HookDescriptor>>,
}

impl ScopeBindings {
    /// The request handlers, in declaration order.
    pub fn handlers(&self) -> &[Arc<HandlerDescriptor>] {
        &self.handlers
    }

    /// The hooks run on activation, in declaration order.
    pub fn enter_hooks(&self) -> &[Arc<HookDescriptor>] {
        &self.enter_hooks
    }

    /// The hooks run on deactivation, in declaration order.
    pub fn exit_hooks(&self) -> &[Arc<HookDescriptor>] {
        &self.exit_hooks
    }

    /// Returns the hooks for `phase`.
    pub fn hooks(&self, phase: HookPhase) -> &[Arc<HookDescriptor>] {
        match phase {
            HookPhase::Enter => &self.enter_hooks,
            HookPhase::Exit => &self.exit_hooks,
        }
    }

    /// Returns `true` if the scope declares nothing at all.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.enter_hooks.is_empty() && self.exit_hooks.is_empty()
    }

    /// Adds a handler, rejecting a key this scope already declares.
    ///
    /// The first declaration of a key within a scope wins.
    pub(crate) fn push_handler(
        &mut self,
        descriptor: Arc<HandlerDescriptor>,
    ) -> Result<(), DispatchFault> {
        if let Some(existing) = self.handlers.iter().find(|h| h.key == descriptor.key) {
            return Err(DispatchFault::MalformedDeclaration {
                origin: descriptor.origin.clone(),
                reason: format!(
                    "request key '{}' is already declared in scope {} by `{}`",
                    descriptor.key, descriptor.scope, existing.origin
                ),
            });
        }
        self.handlers.push(descriptor);
        Ok(())
    }

    pub(crate) fn push_hook(&mut self, hook: Arc<HookDescriptor>) {
        match hook.phase {
            HookPhase::Enter => self.enter_hooks.push(hook),
            HookPhase::Exit => self.exit_hooks.push(hook),
        }
    }
}

/// The outcome of handler discovery: bindings for every declared scope.
///
/// Built once per dispatcher and never mutated afterwards.
#[derive(Debug, Default)]
pub struct ScopeCatalog {
    scopes: HashMap<ScopeId, ScopeBindings>,
}

impl ScopeCatalog {
    pub(crate) fn from_scopes(mut scopes: HashMap<ScopeId, ScopeBindings>) -> Self {
        scopes.entry(ScopeId::GLOBAL).or_default();
        Self { scopes }
    }

    /// Returns the bindings of `scope`, if it was declared.
    pub fn bindings(&self, scope: &str) -> Option<&ScopeBindings> {
        self.scopes.get(scope)
    }

    /// Maps a name (typically a scene name) to a declared scope.
    ///
    /// Matching is exact and case-sensitive.
    pub fn resolve(&self, name: &str) -> Option<ScopeId> {
        self.scopes.get_key_value(name).map(|(id, _)| id.clone())
    }

    /// Every declared scope, sorted by name. Always contains
    /// [`ScopeId::GLOBAL`].
    pub fn scope_ids(&self) -> Vec<ScopeId> {
        let mut ids: Vec<ScopeId> = self.scopes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Total number of request handlers across every scope.
    pub fn handler_count(&self) -> usize {
        self.scopes.values().map(|b| b.handlers.len()).sum()
    }

    /// Total number of hooks across every scope.
    pub fn hook_count(&self) -> usize {
        self.scopes
            .values()
            .map(|b| b.enter_hooks.len() + b.exit_hooks.len())
            .sum()
    }

    /// Returns every descriptor declaring `key`, whatever its scope.
    pub fn handlers_for(&self, key: &str) -> Vec<&Arc<HandlerDescriptor>> {
        let mut found: Vec<&Arc<HandlerDescriptor>> = self
            .scopes
            .values()
            .flat_map(|b| b.handlers.iter())
            .filter(|h| h.key.as_str() == key)
            .collect();
        found.sort_by(|a, b| a.scope.cmp(&b.scope));
        found
    }
}

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

//! Declaring request handlers and scope hooks.
//!
//! Every declaration path ends in a [`CatalogBuilder`]:
//!
//! * a [`Feature`] registers its handlers explicitly from
//!   [`Feature::register`];
//! * the attribute markers of `relay-macros` submit a [`Declaration`] whose
//!   `install` function performs the same calls.

use crate::context::HandlerContext;
use crate::registry::{HandlerDescriptor, HookDescriptor, RequestInvoker, ScopeBindings, ScopeCatalog};
use relay_core::{
    DispatchFault, FaultSink, HandlerError, HandlerOutcome, HookPhase, Payload, RoutingKey, ScopeId,
};
use std::any::{self, Any};
use std::collections::HashMap;
use std::sync::Arc;

/// A unit of game logic that contributes request handlers and hooks.
///
/// Closures taking a `&mut CatalogBuilder` are features too.
pub trait Feature: Send + Sync {
    /// A human-readable name used in diagnostics.
    fn name(&self) -> &str;

    /// Declares the feature's handlers and hooks.
    fn register(&self, catalog: &mut CatalogBuilder);
}

impl<F> Feature for F
where
    F: Fn(&mut CatalogBuilder) + Send + Sync,
{
    fn name(&self) -> &str {
        any::type_name::<F>()
    }

    fn register(&self, catalog: &mut CatalogBuilder) {
        self(catalog)
    }
}

/// A link-time declaration emitted by the attribute markers.
///
/// Declarations are only discovered by dispatchers built with
/// [`DispatcherBuilder::include_declarations`](crate::DispatcherBuilder::include_declarations).
pub struct Declaration {
    /// The path of the declared item.
    pub origin: &'static str,
    /// Registers the declared item into the catalog.
    pub install: fn(&mut CatalogBuilder),
}

inventory::collect!(Declaration);

/// Accumulates declarations into per-scope bindings.
///
/// Malformed declarations are reported to the fault sink and left out; they
/// never abort discovery.
pub struct CatalogBuilder {
    scopes: HashMap<ScopeId, ScopeBindings>,
    origin: String,
    faults: Arc<dyn FaultSink>,
}

impl CatalogBuilder {
    pub(crate) fn new(faults: Arc<dyn FaultSink>) -> Self {
        Self {
            scopes: HashMap::new(),
            origin: String::new(),
            faults,
        }
    }

    /// Starts declaring into `scope`, declaring the scope itself if needed.
    ///
    /// A declared scope can be activated even if nothing is registered in it.
    ///
    /// ## Arguments
    /// * `scope` - The scope id or name.
    /// ## Returns
    /// * A [`ScopeBuilder`] borrowing this catalog.
    pub fn scope(&mut self, scope: impl Into<ScopeId>) -> ScopeBuilder<'_> {
        let scope = scope.into();
        self.scopes.entry(scope.clone()).or_default();
        ScopeBuilder {
            catalog: self,
            scope,
        }
    }

    /// Starts declaring into [`ScopeId::GLOBAL`].
    pub fn global(&mut self) -> ScopeBuilder<'_> {
        self.scope(ScopeId::GLOBAL)
    }

    /// The origin new declarations are attributed to.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub(crate) fn set_origin(&mut self, origin: &str) {
        origin.clone_into(&mut self.origin);
    }

    /// Moves everything `other` declared into this builder, re-checking
    /// duplicate keys.
    pub(crate) fn absorb(&mut self, other: CatalogBuilder) {
        for (scope, bindings) in other.scopes {
            let target = self.scopes.entry(scope).or_default();
            for handler in bindings.handlers() {
                if let Err(fault) = target.push_handler(Arc::clone(handler)) {
                    self.faults.report(fault);
                }
            }
            for hook in bindings.enter_hooks().iter().chain(bindings.exit_hooks()) {
                target.push_hook(Arc::clone(hook));
            }
        }
    }

    pub(crate) fn finish(self) -> ScopeCatalog {
        ScopeCatalog::from_scopes(self.scopes)
    }

    fn malformed(&self, reason: String) {
        self.faults.report(DispatchFault::MalformedDeclaration {
            origin: self.origin.clone(),
            reason,
        });
    }
}

/// Declares handlers and hooks into one scope.
///
/// Every method returns `&mut Self` so declarations can be chained.
pub struct ScopeBuilder<'a> {
    catalog: &'a mut CatalogBuilder,
    scope: ScopeId,
}

impl ScopeBuilder<'_> {
    /// The scope being declared into.
    pub fn id(&self) -> &ScopeId {
        &self.scope
    }

    /// Declares a zero-parameter handler. The payload is ignored.
    ///
    /// ## Arguments
    /// * `key` - The routing key the handler answers.
    /// * `handler` - Called with the handler context; returns `()` or a `Result`.
    pub fn request<F, O>(&mut self, key: impl Into<RoutingKey>, handler: F) -> &mut Self
    where
        F: Fn(&HandlerContext<'_>) -> O + Send + Sync + 'static,
        O: HandlerOutcome,
    {
        let invoker: RequestInvoker = Arc::new(
            move |ctx: &HandlerContext<'_>, _: &Payload| -> Result<Payload, HandlerError> {
                handler(ctx).into_handler_result()?;
                Ok(Payload::empty())
            },
        );
        self.push(key.into(), any::type_name::<F>(), None, None, invoker)
    }

    /// Declares a handler taking a non-nullable `T` payload.
    ///
    /// An empty payload, or one of another type, is a payload mismatch and
    /// the handler is skipped.
    ///
    /// ## Arguments
    /// * `key` - The routing key the handler answers.
    /// * `handler` - Called with the handler context and the payload.
    pub fn request_with<T, F, O>(&mut self, key: impl Into<RoutingKey>, handler: F) -> &mut Self
    where
        T: Any,
        F: Fn(&HandlerContext<'_>, &T) -> O + Send + Sync + 'static,
        O: HandlerOutcome,
    {
        let invoker: RequestInvoker = Arc::new(
            move |ctx: &HandlerContext<'_>, payload: &Payload| -> Result<Payload, HandlerError> {
                handler(ctx, payload.expect_ref::<T>()?).into_handler_result()?;
                Ok(Payload::empty())
            },
        );
        let payload_type = Some(any::type_name::<T>());
        self.push(key.into(), any::type_name::<F>(), payload_type, None, invoker)
    }

    /// Declares a handler taking a nullable `T` payload. An empty payload
    /// runs the handler with `None`.
    pub fn request_optional<T, F, O>(&mut self, key: impl Into<RoutingKey>, handler: F) -> &mut Self
    where
        T: Any,
        F: Fn(&HandlerContext<'_>, Option<&T>) -> O + Send + Sync + 'static,
        O: HandlerOutcome,
    {
        let invoker: RequestInvoker = Arc::new(
            move |ctx: &HandlerContext<'_>, payload: &Payload| -> Result<Payload, HandlerError> {
                handler(ctx, payload.optional_ref::<T>()?).into_handler_result()?;
                Ok(Payload::empty())
            },
        );
        let payload_type = Some(any::type_name::<Option<T>>());
        self.push(key.into(), any::type_name::<F>(), payload_type, None, invoker)
    }

    /// Declares a zero-parameter handler producing an `R`.
    ///
    /// ## Arguments
    /// * `key` - The routing key the handler answers.
    /// * `handler` - Produces the value handed back to the requester.
    pub fn query<R, F>(&mut self, key: impl Into<RoutingKey>, handler: F) -> &mut Self
    where
        R: Any + Send + Sync,
        F: Fn(&HandlerContext<'_>) -> R + Send + Sync + 'static,
    {
        let invoker: RequestInvoker = Arc::new(
            move |ctx: &HandlerContext<'_>, _: &Payload| -> Result<Payload, HandlerError> {
                Ok(Payload::new(handler(ctx)))
            },
        );
        let result_type = Some(any::type_name::<R>());
        self.push(key.into(), any::type_name::<F>(), None, result_type, invoker)
    }

    /// Declares a handler taking a non-nullable `T` payload and producing
    /// an `R`.
    pub fn query_with<T, R, F>(&mut self, key: impl Into<RoutingKey>, handler: F) -> &mut Self
    where
        T: Any,
        R: Any + Send + Sync,
        F: Fn(&HandlerContext<'_>, &T) -> R + Send + Sync + 'static,
    {
        let invoker: RequestInvoker = Arc::new(
            move |ctx: &HandlerContext<'_>, payload: &Payload| -> Result<Payload, HandlerError> {
                Ok(Payload::new(handler(ctx, payload.expect_ref::<T>()?)))
            },
        );
        let payload_type = Some(any::type_name::<T>());
        let result_type = Some(any::type_name::<R>());
        self.push(key.into(), any::type_name::<F>(), payload_type, result_type, invoker)
    }

    /// Declares a hook run each time the scope becomes active.
    ///
    /// ## Arguments
    /// * `hook` - Called with a context naming this scope.
    pub fn on_enter<F, O>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&HandlerContext<'_>) -> O + Send + Sync + 'static,
        O: HandlerOutcome,
    {
        self.push_hook(HookPhase::Enter, any::type_name::<F>(), hook)
    }

    /// Declares a hook run each time the scope is deactivated.
    pub fn on_exit<F, O>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&HandlerContext<'_>) -> O + Send + Sync + 'static,
        O: HandlerOutcome,
    {
        self.push_hook(HookPhase::Exit, any::type_name::<F>(), hook)
    }

    fn push(
        &mut self,
        key: RoutingKey,
        handler_name: &str,
        payload_type: Option<&'static str>,
        result_type: Option<&'static str>,
        invoker: RequestInvoker,
    ) -> &mut Self {
        if key.is_blank() {
            self.catalog.malformed(format!(
                "handler `{handler_name}` in scope {} has an empty request key",
                self.scope
            ));
            return self;
        }

        let descriptor = Arc::new(HandlerDescriptor {
            key,
            scope: self.scope.clone(),
            origin: self.origin_for(handler_name),
            payload_type,
            result_type,
            invoker,
        });
        log::trace!(
            "Declared request '{}' in scope {} ({})",
            descriptor.key,
            descriptor.scope,
            descriptor.origin
        );

        let bindings = self.catalog.scopes.entry(self.scope.clone()).or_default();
        if let Err(fault) = bindings.push_handler(descriptor) {
            self.catalog.faults.report(fault);
        }
        self
    }

    fn push_hook<F, O>(&mut self, phase: HookPhase, hook_name: &str, hook: F) -> &mut Self
    where
        F: Fn(&HandlerContext<'_>) -> O + Send + Sync + 'static,
        O: HandlerOutcome,
    {
        let descriptor = Arc::new(HookDescriptor {
            scope: self.scope.clone(),
            phase,
            origin: self.origin_for(hook_name),
            hook: Arc::new(move |ctx: &HandlerContext<'_>| hook(ctx).into_handler_result()),
        });
        self.catalog
            .scopes
            .entry(self.scope.clone())
            .or_default()
            .push_hook(descriptor);
        self
    }

    /// Declarations from the attribute markers already carry the item path as
    /// their origin; explicit features get the closure's type name appended.
    fn origin_for(&self, item: &str) -> String {
        let origin = self.catalog.origin();
        if origin.is_empty() {
            item.to_string()
        } else if item.starts_with(origin) {
            origin.to_string()
        } else {
            format!("{origin} ({item})")
        }
    }
}

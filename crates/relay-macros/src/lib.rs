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

//! Procedural markers for the relay dispatch runtime.
//!
//! The markers expand to ordinary registration calls on a
//! `relay_sdk::control::CatalogBuilder`, submitted as link-time
//! declarations. They are only discovered by dispatchers built with
//! `include_declarations(true)`; the same handlers can always be
//! registered explicitly through a `Feature` instead.
//!
//! Shape rules are checked here, at compile time: handlers are free,
//! non-generic, synchronous functions taking an optional
//! `&HandlerContext` followed by at most one payload parameter of the form
//! `&T` or `Option<&T>`.

mod args;
mod expand;
mod signature;

use args::{HookArgs, RequestArgs};
use expand::{HookKind, RequestKind};
use proc_macro::TokenStream;
use syn::{parse_macro_input, Expr, ItemFn, ItemImpl, ItemMod};

/// Declares a request handler.
///
/// ```ignore
/// #[request("login.submit.request", scope = "Login")]
/// fn submit(ctx: &HandlerContext<'_>, form: &LoginForm) -> Result<(), LoginError> { .. }
/// ```
///
/// Without a `scope` the handler lives in `Global`.
#[proc_macro_attribute]
pub fn request(attr: TokenStream, item: TokenStream) -> TokenStream {
    let RequestArgs(args) = parse_macro_input!(attr as RequestArgs);
    let function = parse_macro_input!(item as ItemFn);
    expand::request(RequestKind::Request, args, function)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Declares a request handler whose return value is handed back to
/// `send_request_for` callers.
#[proc_macro_attribute]
pub fn query(attr: TokenStream, item: TokenStream) -> TokenStream {
    let RequestArgs(args) = parse_macro_input!(attr as RequestArgs);
    let function = parse_macro_input!(item as ItemFn);
    expand::request(RequestKind::Query, args, function)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Declares a hook run each time a scope becomes active. The scope defaults
/// to `Global`.
#[proc_macro_attribute]
pub fn on_scope_enter(attr: TokenStream, item: TokenStream) -> TokenStream {
    let HookArgs(args) = parse_macro_input!(attr as HookArgs);
    let function = parse_macro_input!(item as ItemFn);
    expand::hook(HookKind::Enter, args, function)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Declares a hook run each time a scope is deactivated.
#[proc_macro_attribute]
pub fn on_scope_exit(attr: TokenStream, item: TokenStream) -> TokenStream {
    let HookArgs(args) = parse_macro_input!(attr as HookArgs);
    let function = parse_macro_input!(item as ItemFn);
    expand::hook(HookKind::Exit, args, function)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Places every handler and hook marker of an inline module that names no
/// scope of its own in the given scope.
///
/// ```ignore
/// #[scope_members("Login")]
/// mod login {
///     #[request("login.submit.request")]
///     fn submit(form: &LoginForm) { .. }
///
///     #[on_scope_enter]
///     fn opened() { .. }
/// }
/// ```
///
/// The scope expression is evaluated inside the module, so it should be a
/// literal or an absolute path.
#[proc_macro_attribute]
pub fn scope_members(attr: TokenStream, item: TokenStream) -> TokenStream {
    let scope = parse_macro_input!(attr as Expr);
    let module = parse_macro_input!(item as ItemMod);
    expand::scope_members(scope, module)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Implements `EventListeners` for the type of an inherent impl block from
/// its `#[listen("key")]` methods.
///
/// A method may carry several `#[listen]` attributes to receive more than
/// one event.
#[proc_macro_attribute]
pub fn view_listeners(attr: TokenStream, item: TokenStream) -> TokenStream {
    let block = parse_macro_input!(item as ItemImpl);
    expand::view_listeners(attr.into(), block)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Marks a view method as an event listener. Only meaningful inside a
/// `#[view_listeners]` impl block, which consumes it.
#[proc_macro_attribute]
pub fn listen(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut output: TokenStream = syn::Error::new(
        proc_macro2::Span::call_site(),
        "`#[listen]` must be used inside a `#[view_listeners]` impl block",
    )
    .into_compile_error()
    .into();
    output.extend(item);
    output
}

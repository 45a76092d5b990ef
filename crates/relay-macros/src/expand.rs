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

//! Code generation for the markers.

use crate::args::{HookArgs, MarkerArgs, RequestArgs};
use crate::signature::{handler_shape, listener_shape, PayloadParam};
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{parse_quote, Attribute, Expr, Ident, ImplItem, Item, ItemFn, ItemImpl, ItemMod, Meta};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Request,
    Query,
}

#[derive(Clone, Copy)]
pub enum HookKind {
    Enter,
    Exit,
}

pub fn request(kind: RequestKind, args: MarkerArgs, function: ItemFn) -> syn::Result<TokenStream> {
    let shape = handler_shape(&function.sig)?;
    let Some(key) = args.key else {
        return Err(syn::Error::new(
            Span::call_site(),
            "missing routing key, e.g. `#[request(\"login.submit.request\")]`",
        ));
    };

    let name = &function.sig.ident;
    let ctx = context_binding(shape.takes_context);
    let ctx_ty = context_type();
    let call_ctx = shape.takes_context.then(|| quote!(#ctx,));

    let registration = match (kind, shape.payload) {
        (RequestKind::Request, PayloadParam::None) => quote! {
            .request(#key, |#ctx: &#ctx_ty| #name(#call_ctx))
        },
        (RequestKind::Request, PayloadParam::Required(ty)) => quote! {
            .request_with::<#ty, _, _>(#key, |#ctx: &#ctx_ty, payload: &#ty| #name(#call_ctx payload))
        },
        (RequestKind::Request, PayloadParam::Optional(ty)) => quote! {
            .request_optional::<#ty, _, _>(
                #key,
                |#ctx: &#ctx_ty, payload: ::core::option::Option<&#ty>| #name(#call_ctx payload),
            )
        },
        (RequestKind::Query, PayloadParam::None) => quote! {
            .query(#key, |#ctx: &#ctx_ty| #name(#call_ctx))
        },
        (RequestKind::Query, PayloadParam::Required(ty)) => quote! {
            .query_with::<#ty, _, _>(#key, |#ctx: &#ctx_ty, payload: &#ty| #name(#call_ctx payload))
        },
        (RequestKind::Query, PayloadParam::Optional(_)) => {
            return Err(syn::Error::new_spanned(
                &function.sig,
                "queries take a non-nullable `&T` payload",
            ))
        }
    };

    Ok(declare(&function, scope_or_global(args.scope), registration))
}

pub fn hook(kind: HookKind, args: MarkerArgs, function: ItemFn) -> syn::Result<TokenStream> {
    let shape = handler_shape(&function.sig)?;
    if !matches!(shape.payload, PayloadParam::None) {
        return Err(syn::Error::new_spanned(
            &function.sig.inputs,
            "scope hooks take no payload, only an optional `&HandlerContext`",
        ));
    }

    let name = &function.sig.ident;
    let ctx = context_binding(shape.takes_context);
    let ctx_ty = context_type();
    let call_ctx = shape.takes_context.then(|| quote!(#ctx));
    let method = match kind {
        HookKind::Enter => quote!(on_enter),
        HookKind::Exit => quote!(on_exit),
    };
    let registration = quote! {
        .#method(|#ctx: &#ctx_ty| #name(#call_ctx))
    };

    Ok(declare(&function, scope_or_global(args.scope), registration))
}

pub fn view_listeners(attr: TokenStream, mut block: ItemImpl) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(attr, "`#[view_listeners]` takes no arguments"));
    }
    if let Some((_, path, _)) = &block.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "`#[view_listeners]` must be placed on an inherent impl block",
        ));
    }

    let mut registrations = Vec::new();
    let mut errors: Option<syn::Error> = None;
    for item in &mut block.items {
        let ImplItem::Fn(method) = item else { continue };
        let (listen, kept): (Vec<_>, Vec<_>) = method
            .attrs
            .drain(..)
            .partition(|attr| attr.path().is_ident("listen"));
        method.attrs = kept;
        if listen.is_empty() {
            continue;
        }

        let payload = match listener_shape(&method.sig) {
            Ok(payload) => payload,
            Err(error) => {
                combine(&mut errors, error);
                continue;
            }
        };
        let name = &method.sig.ident;
        for attr in listen {
            match attr.parse_args::<Expr>() {
                Ok(key) => registrations.push(listener_registration(name, &key, &payload)),
                Err(error) => combine(&mut errors, error),
            }
        }
    }
    if let Some(errors) = errors {
        return Err(errors);
    }

    let self_ty = &block.self_ty;
    let (impl_generics, _, where_clause) = block.generics.split_for_impl();
    Ok(quote! {
        #block

        impl #impl_generics ::relay_sdk::view::EventListeners for #self_ty #where_clause {
            fn listeners(set: &mut ::relay_sdk::view::ListenerSet<Self>) {
                #(#registrations)*
            }
        }
    })
}

pub fn scope_members(scope: Expr, mut module: ItemMod) -> syn::Result<TokenStream> {
    if module.content.is_none() {
        return Err(syn::Error::new_spanned(
            &module,
            "`#[scope_members]` needs an inline module body",
        ));
    }
    assign_default_scope(&mut module, &scope);
    Ok(quote!(#module))
}

/// Adds `scope = <scope>` to every handler and hook marker of `module` that
/// names no scope. Nested modules with their own `#[scope_members]` keep it.
fn assign_default_scope(module: &mut ItemMod, scope: &Expr) {
    let Some((_, items)) = &mut module.content else { return };
    for item in items {
        match item {
            Item::Fn(function) => {
                for attr in &mut function.attrs {
                    scope_marker(attr, scope);
                }
            }
            Item::Mod(nested) if !has_marker(&nested.attrs, "scope_members") => {
                assign_default_scope(nested, scope);
            }
            _ => {}
        }
    }
}

fn scope_marker(attr: &mut Attribute, scope: &Expr) {
    let Some(marker) = attr.path().segments.last().map(|segment| segment.ident.to_string()) else {
        return;
    };
    let is_hook = match marker.as_str() {
        "request" | "query" => false,
        "on_scope_enter" | "on_scope_exit" => true,
        _ => return,
    };

    // Markers that fail to parse are left for their own expansion to report.
    let key = match &attr.meta {
        Meta::Path(_) => None,
        Meta::List(list) if is_hook => match list.parse_args::<HookArgs>() {
            Ok(HookArgs(MarkerArgs { scope: None, .. })) => None,
            _ => return,
        },
        Meta::List(list) => match list.parse_args::<RequestArgs>() {
            Ok(RequestArgs(MarkerArgs { key, scope: None })) => key,
            _ => return,
        },
        Meta::NameValue(_) => return,
    };

    let path = attr.path().clone();
    *attr = match key {
        Some(key) => parse_quote!(#[#path(key = #key, scope = #scope)]),
        None => parse_quote!(#[#path(scope = #scope)]),
    };
}

fn has_marker(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| {
        attr.path()
            .segments
            .last()
            .is_some_and(|segment| segment.ident == name)
    })
}

fn listener_registration(name: &Ident, key: &Expr, payload: &PayloadParam) -> TokenStream {
    match payload {
        PayloadParam::None => quote! {
            set.on(#key, |view: &Self| view.#name());
        },
        PayloadParam::Required(ty) => quote! {
            set.on_typed::<#ty, _, _>(#key, |view: &Self, payload: &#ty| view.#name(payload));
        },
        PayloadParam::Optional(ty) => quote! {
            set.on_optional::<#ty, _, _>(
                #key,
                |view: &Self, payload: ::core::option::Option<&#ty>| view.#name(payload),
            );
        },
    }
}

/// Emits the marked function unchanged, an install function performing
/// `registration` on the target scope, and the link-time declaration.
fn declare(function: &ItemFn, scope: TokenStream, registration: TokenStream) -> TokenStream {
    let name = &function.sig.ident;
    let install = format_ident!("__relay_install_{}", name);
    quote! {
        #function

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #install(catalog: &mut ::relay_sdk::control::CatalogBuilder) {
            catalog.scope(#scope) #registration;
        }

        ::relay_sdk::control::inventory::submit! {
            ::relay_sdk::control::Declaration {
                origin: ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#name)),
                install: #install,
            }
        }
    }
}

fn scope_or_global(scope: Option<Expr>) -> TokenStream {
    match scope {
        Some(scope) => quote!(#scope),
        None => quote!(::relay_sdk::core::ScopeId::GLOBAL),
    }
}

fn context_binding(used: bool) -> Ident {
    if used {
        Ident::new("ctx", Span::call_site())
    } else {
        Ident::new("_ctx", Span::call_site())
    }
}

fn context_type() -> TokenStream {
    quote!(::relay_sdk::control::HandlerContext<'_>)
}

fn combine(errors: &mut Option<syn::Error>, error: syn::Error) {
    match errors {
        Some(existing) => existing.combine(error),
        None => *errors = Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker_of(module: &ItemMod, index: usize) -> String {
        let (_, items) = module.content.as_ref().unwrap();
        let Item::Fn(function) = &items[index] else { panic!("expected a fn") };
        let attr = &function.attrs[0];
        quote!(#attr).to_string()
    }

    #[test]
    fn test_markers_without_scope_take_the_module_scope() {
        let mut module: ItemMod = parse_quote! {
            mod login {
                #[request("login.submit.request")]
                fn submit() {}
                #[on_scope_enter]
                fn entered() {}
                #[relay_sdk::query(key = "login.state.request")]
                fn state() -> u8 { 0 }
            }
        };
        assign_default_scope(&mut module, &parse_quote!("Login"));

        assert_eq!(
            marker_of(&module, 0),
            quote!(#[request(key = "login.submit.request", scope = "Login")]).to_string()
        );
        assert_eq!(
            marker_of(&module, 1),
            quote!(#[on_scope_enter(scope = "Login")]).to_string()
        );
        assert_eq!(
            marker_of(&module, 2),
            quote!(#[relay_sdk::query(key = "login.state.request", scope = "Login")]).to_string()
        );
    }

    #[test]
    fn test_explicit_scope_and_other_attributes_are_kept() {
        let mut module: ItemMod = parse_quote! {
            mod mixed {
                #[request("lobby.join.request", scope = "Lobby")]
                fn join() {}
                #[on_scope_exit(Global)]
                fn left() {}
                #[inline]
                fn helper() {}
            }
        };
        let before: Vec<String> = (0..3).map(|index| marker_of(&module, index)).collect();
        assign_default_scope(&mut module, &parse_quote!("Login"));
        let after: Vec<String> = (0..3).map(|index| marker_of(&module, index)).collect();

        assert_eq!(before, after);
    }

    #[test]
    fn test_nested_scope_members_module_is_left_alone() {
        let mut module: ItemMod = parse_quote! {
            mod outer {
                #[scope_members("Shop")]
                mod shop {
                    #[request("shop.buy.request")]
                    fn buy() {}
                }
            }
        };
        assign_default_scope(&mut module, &parse_quote!("Login"));

        let (_, items) = module.content.as_ref().unwrap();
        let Item::Mod(shop) = &items[0] else { panic!("expected a mod") };
        assert_eq!(
            marker_of(shop, 0),
            quote!(#[request("shop.buy.request")]).to_string()
        );
    }

    #[test]
    fn test_module_without_body_is_rejected() {
        let module: ItemMod = parse_quote!(mod elsewhere;);
        assert!(scope_members(parse_quote!("Login"), module).is_err());
    }
}

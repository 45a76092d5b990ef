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

//! Attribute markers parsed by the macros.

use syn::parse::{Parse, ParseStream};
use syn::{Expr, Ident, Token};

/// Which argument a bare, unnamed value stands for.
#[derive(Clone, Copy)]
enum Positional {
    Key,
    Scope,
}

/// `key` and `scope` arguments shared by every marker.
#[derive(Default)]
pub struct MarkerArgs {
    pub key: Option<Expr>,
    pub scope: Option<Expr>,
}

/// Arguments of `#[request]` and `#[query]`: `"key"` or
/// `key = ..., scope = ...`.
pub struct RequestArgs(pub MarkerArgs);

/// Arguments of `#[on_scope_enter]` and `#[on_scope_exit]`: an optional
/// scope, bare or as `scope = ...`.
pub struct HookArgs(pub MarkerArgs);

impl Parse for RequestArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        parse_marker(input, Positional::Key).map(Self)
    }
}

impl Parse for HookArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let args = parse_marker(input, Positional::Scope)?;
        if let Some(key) = &args.key {
            return Err(syn::Error::new_spanned(key, "scope hooks do not take a routing key"));
        }
        Ok(Self(args))
    }
}

fn parse_marker(input: ParseStream, positional: Positional) -> syn::Result<MarkerArgs> {
    let mut args = MarkerArgs::default();
    while !input.is_empty() {
        if input.peek(Ident) && input.peek2(Token![=]) {
            let name: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: Expr = input.parse()?;
            match name.to_string().as_str() {
                "key" => assign(&mut args.key, value, "key")?,
                "scope" => assign(&mut args.scope, value, "scope")?,
                _ => {
                    return Err(syn::Error::new(
                        name.span(),
                        "unknown argument, expected `key` or `scope`",
                    ))
                }
            }
        } else {
            let value: Expr = input.parse()?;
            match positional {
                Positional::Key => assign(&mut args.key, value, "key")?,
                Positional::Scope => assign(&mut args.scope, value, "scope")?,
            }
        }
        if !input.is_empty() {
            input.parse::<Token![,]>()?;
        }
    }
    Ok(args)
}

fn assign(slot: &mut Option<Expr>, value: Expr, name: &str) -> syn::Result<()> {
    if slot.is_some() {
        return Err(syn::Error::new_spanned(
            value,
            format!("`{name}` is given more than once"),
        ));
    }
    *slot = Some(value);
    Ok(())
}

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

//! Shape rules for marked functions and methods.

use syn::spanned::Spanned;
use syn::{FnArg, GenericArgument, PathArguments, Signature, Type, TypeReference};

/// How a handler receives its payload.
pub enum PayloadParam {
    /// No payload parameter.
    None,
    /// `&T`: the payload must be a `T`.
    Required(Type),
    /// `Option<&T>`: an empty payload is passed as `None`.
    Optional(Type),
}

/// The accepted shape of a marked free function.
pub struct HandlerShape {
    pub takes_context: bool,
    pub payload: PayloadParam,
}

/// Validates a free-function handler or hook: not generic, not async, no
/// receiver, an optional leading `&HandlerContext`, then at most one
/// payload parameter.
pub fn handler_shape(sig: &Signature) -> syn::Result<HandlerShape> {
    reject_common(sig)?;

    let mut params = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new(
                    receiver.span(),
                    "handlers must be free functions, not methods",
                ))
            }
            FnArg::Typed(typed) => params.push(typed.ty.as_ref()),
        }
    }

    let takes_context = params.first().is_some_and(|ty| is_context(ty));
    if takes_context {
        params.remove(0);
    }
    Ok(HandlerShape {
        takes_context,
        payload: payload_param(sig, &params)?,
    })
}

/// Validates a view listener method: `&self`, not generic, not async, then
/// at most one payload parameter.
pub fn listener_shape(sig: &Signature) -> syn::Result<PayloadParam> {
    reject_common(sig)?;

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new(
                sig.span(),
                "listeners must be instance methods taking `&self`",
            ))
        }
    }

    let params: Vec<&Type> = inputs
        .filter_map(|input| match input {
            FnArg::Typed(typed) => Some(typed.ty.as_ref()),
            FnArg::Receiver(_) => None,
        })
        .collect();
    payload_param(sig, &params)
}

fn reject_common(sig: &Signature) -> syn::Result<()> {
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            sig.generics.span(),
            "marked functions must not be generic",
        ));
    }
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new(
            asyncness.span(),
            "marked functions must not be async; dispatch is synchronous",
        ));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new(
            variadic.span(),
            "marked functions must not be variadic",
        ));
    }
    Ok(())
}

fn payload_param(sig: &Signature, params: &[&Type]) -> syn::Result<PayloadParam> {
    match params {
        [] => Ok(PayloadParam::None),
        [ty] => classify_payload(ty),
        [_, extra, ..] => Err(syn::Error::new(
            extra.span(),
            format!(
                "`{}` takes more than one payload parameter; at most one is allowed",
                sig.ident
            ),
        )),
    }
}

fn classify_payload(ty: &Type) -> syn::Result<PayloadParam> {
    if let Type::Reference(reference) = ty {
        return shared_ref(reference).map(PayloadParam::Required);
    }
    if let Some(inner) = option_argument(ty) {
        if let Type::Reference(reference) = inner {
            return shared_ref(reference).map(PayloadParam::Optional);
        }
    }
    Err(syn::Error::new(
        ty.span(),
        "payload parameters must be `&T` or `Option<&T>`",
    ))
}

fn shared_ref(reference: &TypeReference) -> syn::Result<Type> {
    if let Some(mutability) = &reference.mutability {
        return Err(syn::Error::new(
            mutability.span(),
            "payload parameters must not be taken by mutable reference",
        ));
    }
    Ok((*reference.elem).clone())
}

fn option_argument(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else { return None };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    match arguments.args.first()? {
        GenericArgument::Type(inner) if arguments.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn is_context(ty: &Type) -> bool {
    let Type::Reference(reference) = ty else {
        return false;
    };
    if reference.mutability.is_some() {
        return false;
    }
    let Type::Path(path) = reference.elem.as_ref() else {
        return false;
    };
    path.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "HandlerContext")
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn shape(sig: Signature) -> syn::Result<HandlerShape> {
        handler_shape(&sig)
    }

    #[test]
    fn test_context_and_required_payload() {
        let shape = shape(parse_quote! { fn echo(ctx: &HandlerContext<'_>, text: &String) }).unwrap();
        assert!(shape.takes_context);
        assert!(matches!(shape.payload, PayloadParam::Required(_)));
    }

    #[test]
    fn test_optional_payload_without_context() {
        let shape = shape(parse_quote! { fn load(user: Option<&UserId>) }).unwrap();
        assert!(!shape.takes_context);
        assert!(matches!(shape.payload, PayloadParam::Optional(_)));
    }

    #[test]
    fn test_rejections() {
        assert!(shape(parse_quote! { fn by_value(n: i32) }).is_err());
        assert!(shape(parse_quote! { fn by_mut(n: &mut i32) }).is_err());
        assert!(shape(parse_quote! { fn two(a: &i32, b: &i32) }).is_err());
        assert!(shape(parse_quote! { fn generic<T>(a: &T) }).is_err());
        assert!(shape(parse_quote! { async fn later() }).is_err());
        assert!(shape(parse_quote! { fn method(&self) }).is_err());
    }

    #[test]
    fn test_listener_receiver_rules() {
        assert!(listener_shape(&parse_quote! { fn on_score(&self, score: &u32) }).is_ok());
        assert!(listener_shape(&parse_quote! { fn on_reset(&self) }).is_ok());
        assert!(listener_shape(&parse_quote! { fn on_mut(&mut self) }).is_err());
        assert!(listener_shape(&parse_quote! { fn on_static(score: &u32) }).is_err());
    }
}

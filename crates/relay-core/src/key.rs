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

//! Routing keys and scope identifiers.
//!
//! Both are thin wrappers over `Cow<'static, str>` so that feature modules can
//! declare them as `const` items while still allowing keys built at runtime.

use std::borrow::{Borrow, Cow};
use std::fmt;

/// An opaque string identifying one request or one event.
///
/// Keys compare, hash and order exactly like their string form, which lets
/// lookup tables be queried with a plain `&str`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutingKey(Cow<'static, str>);

impl RoutingKey {
    /// Creates a key from a string literal. Usable in `const` items.
    pub const fn from_static(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the key is empty or consists only of whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&'static str> for RoutingKey {
    fn from(key: &'static str) -> Self {
        Self::from_static(key)
    }
}

impl From<String> for RoutingKey {
    fn from(key: String) -> Self {
        Self(Cow::Owned(key))
    }
}

impl From<&RoutingKey> for RoutingKey {
    fn from(key: &RoutingKey) -> Self {
        key.clone()
    }
}

impl AsRef<str> for RoutingKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RoutingKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoutingKey({:?})", self.0)
    }
}

/// Identifies a named activation domain, typically one per game scene.
///
/// [`ScopeId::GLOBAL`] is the default scope. It is activated automatically at
/// the end of handler discovery and stays active for the process lifetime.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(Cow<'static, str>);

impl ScopeId {
    /// The default scope that every undeclared handler belongs to.
    pub const GLOBAL: ScopeId = ScopeId::from_static("Global");

    /// Creates a scope identifier from a string literal.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Returns the scope name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for [`ScopeId::GLOBAL`].
    pub fn is_global(&self) -> bool {
        *self == Self::GLOBAL
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::GLOBAL
    }
}

impl From<&'static str> for ScopeId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for ScopeId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&ScopeId> for ScopeId {
    fn from(scope: &ScopeId) -> Self {
        scope.clone()
    }
}

impl AsRef<str> for ScopeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ScopeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({})", self.0)
    }
}

/// Declares a module of routing key constants for one feature.
///
/// Besides one `const` per key, the generated module exposes `ALL`, a slice
/// of every key it declares.
///
/// # Example
///
/// ```rust
/// relay_core::routing_keys! {
///     /// Keys owned by the login feature.
///     pub mod login {
///         ECHO_REQUEST = "login.echo.request";
///         ECHO_EVENT = "login.echo.event";
///     }
/// }
///
/// assert_eq!(login::ECHO_REQUEST.as_str(), "login.echo.request");
/// assert_eq!(login::ALL.len(), 2);
/// ```
#[macro_export]
macro_rules! routing_keys {
    (
        $(#[$meta:meta])*
        $vis:vis mod $feature:ident {
            $( $(#[$key_meta:meta])* $name:ident = $value:literal; )*
        }
    ) => {
        $(#[$meta])*
        $vis mod $feature {
            $(
                $(#[$key_meta])*
                pub const $name: $crate::RoutingKey = $crate::RoutingKey::from_static($value);
            )*

            /// Every key declared by this feature.
            pub const ALL: &[$crate::RoutingKey] = &[$($name),*];
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_routing_key_lookup_by_str() {
        let mut table = HashMap::new();
        table.insert(RoutingKey::from_static("lobby.join.request"), 1);
        table.insert(RoutingKey::from(String::from("lobby.leave.request")), 2);

        assert_eq!(table.get("lobby.join.request"), Some(&1));
        assert_eq!(table.get("lobby.leave.request"), Some(&2));
        assert!(table.get("lobby.kick.request").is_none());
    }

    #[test]
    fn test_blank_keys() {
        assert!(RoutingKey::from_static("").is_blank());
        assert!(RoutingKey::from_static("  ").is_blank());
        assert!(!RoutingKey::from_static("a").is_blank());
    }

    #[test]
    fn test_global_scope_is_default() {
        assert_eq!(ScopeId::default(), ScopeId::GLOBAL);
        assert!(ScopeId::GLOBAL.is_global());
        assert!(!ScopeId::from_static("Lobby").is_global());
        assert_eq!(ScopeId::GLOBAL.to_string(), "Global");
    }

    crate::routing_keys! {
        mod shop {
            BUY = "shop.buy.request";
            BOUGHT = "shop.bought.event";
        }
    }

    #[test]
    fn test_routing_keys_macro() {
        assert_eq!(shop::BUY.as_str(), "shop.buy.request");
        assert_eq!(shop::ALL, &[shop::BUY, shop::BOUGHT]);
    }
}

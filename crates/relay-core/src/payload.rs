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

//! The type-erased value carried by requests and events.

use crate::outcome::HandlerError;
use std::any::{self, Any};
use std::fmt;

/// Type name reported for an empty payload.
pub const EMPTY_PAYLOAD: &str = "<empty>";

/// A type-erased, optionally empty value passed to request handlers and
/// event listeners.
///
/// Typed handlers resolve the payload through [`Payload::expect_ref`]
/// (non-nullable parameter) or [`Payload::optional_ref`] (nullable
/// parameter). Both report a [`HandlerError::PayloadMismatch`] instead of
/// panicking when the runtime type differs from the declared one.
pub struct Payload {
    value: Option<Box<dyn Any + Send + Sync>>,
    type_name: &'static str,
}

impl Payload {
    /// Creates a payload holding no value.
    pub const fn empty() -> Self {
        Self {
            value: None,
            type_name: EMPTY_PAYLOAD,
        }
    }

    /// Wraps a value into a payload.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Box::new(value)),
            type_name: any::type_name::<T>(),
        }
    }

    /// Returns `true` if the payload holds no value.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the Rust type name of the carried value, or `"<empty>"`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the payload holds a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Borrows the carried value as a `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value
            .as_deref()
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Takes the carried value out as a `T`, handing the payload back on
    /// mismatch.
    pub fn into_inner<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        match self.value {
            Some(value) => value
                .downcast::<T>()
                .map(|boxed| *boxed)
                .map_err(|value| Self {
                    value: Some(value),
                    type_name,
                }),
            None => Err(self),
        }
    }

    /// Resolves the payload for a handler declaring a non-nullable `T`
    /// parameter. An empty payload is a mismatch.
    pub fn expect_ref<T: Any>(&self) -> Result<&T, HandlerError> {
        self.downcast_ref::<T>().ok_or_else(|| self.mismatch::<T>())
    }

    /// Resolves the payload for a handler declaring a nullable `T`
    /// parameter. An empty payload yields `None`.
    pub fn optional_ref<T: Any>(&self) -> Result<Option<&T>, HandlerError> {
        if self.is_empty() {
            return Ok(None);
        }
        self.expect_ref::<T>().map(Some)
    }

    fn mismatch<T: Any>(&self) -> HandlerError {
        HandlerError::PayloadMismatch {
            expected: any::type_name::<T>(),
            found: self.type_name,
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload").field(&self.type_name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload() {
        let payload = Payload::empty();
        assert!(payload.is_empty());
        assert_eq!(payload.type_name(), EMPTY_PAYLOAD);
        assert!(payload.downcast_ref::<i32>().is_none());
    }

    #[test]
    fn test_expect_ref_matches_declared_type() {
        let payload = Payload::new(42_i32);
        assert_eq!(payload.expect_ref::<i32>().ok(), Some(&42));
        assert!(payload.is::<i32>());
    }

    #[test]
    fn test_expect_ref_rejects_other_type() {
        let payload = Payload::new(String::from("not-an-int"));
        match payload.expect_ref::<i32>() {
            Err(HandlerError::PayloadMismatch { expected, found }) => {
                assert_eq!(expected, "i32");
                assert!(found.ends_with("String"));
            }
            other => panic!("expected a payload mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_expect_ref_rejects_empty_payload() {
        let payload = Payload::empty();
        assert!(matches!(
            payload.expect_ref::<i32>(),
            Err(HandlerError::PayloadMismatch { found: EMPTY_PAYLOAD, .. })
        ));
    }

    #[test]
    fn test_optional_ref_accepts_empty_payload() {
        let payload = Payload::empty();
        assert_eq!(payload.optional_ref::<String>().ok(), Some(None));

        let payload = Payload::new(7_u8);
        assert!(payload.optional_ref::<String>().is_err());
    }

    #[test]
    fn test_into_inner_round_trip_and_mismatch() {
        let payload = Payload::new(vec![1, 2, 3]);
        let payload = payload.into_inner::<String>().unwrap_err();
        assert_eq!(payload.into_inner::<Vec<i32>>().unwrap(), vec![1, 2, 3]);
    }
}

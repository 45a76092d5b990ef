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

//! Builders turning typed closures into [`EventHandler`]s.
//!
//! The payload rules match the request side: a `&T` parameter is
//! non-nullable, an `Option<&T>` parameter accepts an empty payload, and a
//! payload of any other type is reported as a mismatch without running the
//! closure.

use super::EventHandler;
use crate::outcome::{HandlerOutcome, HandlerResult};
use crate::payload::Payload;
use std::any::Any;
use std::sync::Arc;

/// Builds a listener that ignores the payload.
pub fn untyped<F, O>(listener: F) -> EventHandler
where
    F: Fn() -> O + Send + Sync + 'static,
    O: HandlerOutcome,
{
    Arc::new(move |_: &Payload| listener().into_handler_result())
}

/// Builds a listener for a non-nullable `T` payload.
pub fn typed<T, F, O>(listener: F) -> EventHandler
where
    T: Any,
    F: Fn(&T) -> O + Send + Sync + 'static,
    O: HandlerOutcome,
{
    Arc::new(move |payload: &Payload| -> HandlerResult {
        listener(payload.expect_ref::<T>()?).into_handler_result()
    })
}

/// Builds a listener for a nullable `T` payload.
pub fn optional<T, F, O>(listener: F) -> EventHandler
where
    T: Any,
    F: Fn(Option<&T>) -> O + Send + Sync + 'static,
    O: HandlerOutcome,
{
    Arc::new(move |payload: &Payload| -> HandlerResult {
        listener(payload.optional_ref::<T>()?).into_handler_result()
    })
}

/// Builds a listener that inspects the raw payload itself.
pub fn raw<F, O>(listener: F) -> EventHandler
where
    F: Fn(&Payload) -> O + Send + Sync + 'static,
    O: HandlerOutcome,
{
    Arc::new(move |payload: &Payload| listener(payload).into_handler_result())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::HandlerError;
    use std::sync::Mutex;

    #[test]
    fn test_optional_listener_runs_with_none() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = optional(move |name: Option<&String>| {
            sink.lock().unwrap().push(name.cloned());
        });

        assert!(handler(&Payload::empty()).is_ok());
        assert!(handler(&Payload::new(String::from("ada"))).is_ok());
        assert!(matches!(
            handler(&Payload::new(3_i64)),
            Err(HandlerError::PayloadMismatch { .. })
        ));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some(String::from("ada"))]
        );
    }

    #[test]
    fn test_raw_listener_sees_payload() {
        let handler = raw(|payload: &Payload| -> Result<(), String> {
            if payload.is_empty() {
                Err("empty".to_string())
            } else {
                Ok(())
            }
        });
        assert!(handler(&Payload::new(1_u8)).is_ok());
        assert_eq!(
            handler(&Payload::empty()),
            Err(HandlerError::Failed("empty".to_string()))
        );
    }
}

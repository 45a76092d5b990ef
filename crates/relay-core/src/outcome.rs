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

//! Handler outcomes and the isolation boundary around handler bodies.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// A failure raised by, or on behalf of, a single handler invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The runtime payload did not match the handler's declared parameter.
    #[error("payload type mismatch: expected `{expected}`, received `{found}`")]
    PayloadMismatch {
        /// The declared parameter type.
        expected: &'static str,
        /// The type actually carried by the payload.
        found: &'static str,
    },
    /// The handler body returned an error.
    #[error("{0}")]
    Failed(String),
    /// The handler body panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// The result every type-erased handler produces.
pub type HandlerResult = Result<(), HandlerError>;

/// Conversion from a handler's declared return type into a [`HandlerResult`].
///
/// Implemented for `()` and for `Result<(), E>` with any displayable `E`, so
/// handlers may be written either as plain procedures or as fallible ones.
pub trait HandlerOutcome {
    /// Converts the outcome.
    fn into_handler_result(self) -> HandlerResult;
}

impl HandlerOutcome for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E: fmt::Display> HandlerOutcome for Result<(), E> {
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(|e| HandlerError::Failed(e.to_string()))
    }
}

/// Runs `body`, converting a panic into [`HandlerError::Panicked`].
///
/// This is the dispatch boundary: nothing a handler does may unwind past it.
pub fn run_isolated<R>(body: impl FnOnce() -> Result<R, HandlerError>) -> Result<R, HandlerError> {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(panic) => Err(HandlerError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_outcome_is_ok() {
        assert_eq!(().into_handler_result(), Ok(()));
    }

    #[test]
    fn test_error_outcome_is_stringified() {
        let outcome: Result<(), String> = Err("session expired".to_string());
        assert_eq!(
            outcome.into_handler_result(),
            Err(HandlerError::Failed("session expired".to_string()))
        );
    }

    #[test]
    fn test_run_isolated_catches_panics() {
        let result: Result<(), _> = run_isolated(|| panic!("boom"));
        assert_eq!(result, Err(HandlerError::Panicked("boom".to_string())));

        let result = run_isolated(|| -> Result<u8, HandlerError> { panic!("code {}", 7) });
        assert_eq!(result, Err(HandlerError::Panicked("code 7".to_string())));
    }

    #[test]
    fn test_run_isolated_passes_values_through() {
        assert_eq!(run_isolated(|| Ok(5)), Ok(5));
    }
}

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

//! The fault taxonomy and the sink every absorbed fault is reported to.
//!
//! Nothing in the dispatch runtime propagates a failure to its caller.
//! Malformed declarations, unknown keys, payload mismatches, duplicate keys
//! and failing handlers are all turned into a [`DispatchFault`] and handed to
//! a [`FaultSink`]. The default [`LogSink`] writes them to the `log` facade.

use crate::key::{RoutingKey, ScopeId};
use crate::outcome::HandlerError;
use std::fmt;

/// The two scope lifecycle transitions that run hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Runs after the scope's handlers became routable.
    Enter,
    /// Runs before the scope's handlers stop being routable.
    Exit,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Enter => f.write_str("enter"),
            HookPhase::Exit => f.write_str("exit"),
        }
    }
}

/// How loudly a fault is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FaultSeverity {
    /// Suspicious but expected in normal operation.
    Warning,
    /// A feature is misconfigured or misbehaving.
    Error,
}

/// A failure absorbed by the dispatch runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchFault {
    /// A declaration violated a shape rule and was excluded.
    #[error("malformed declaration `{origin}`: {reason}")]
    MalformedDeclaration {
        /// Where the declaration came from (feature or item path).
        origin: String,
        /// The violated rule.
        reason: String,
    },
    /// An operation was given an empty or blank key.
    #[error("{operation} called with an empty routing key")]
    EmptyKey {
        /// The rejected operation.
        operation: &'static str,
    },
    /// No active scope routes this key.
    #[error("unknown routing key '{key}'")]
    UnknownKey {
        /// The requested key.
        key: RoutingKey,
    },
    /// A payload did not match the handler's declared parameter type.
    #[error("payload mismatch on '{key}': expected `{expected}`, received `{found}`")]
    PayloadMismatch {
        /// The request or event key.
        key: RoutingKey,
        /// The declared parameter type.
        expected: &'static str,
        /// The type actually received.
        found: &'static str,
    },
    /// A typed request produced a value of another type than asked for.
    #[error("result mismatch on '{key}': expected `{expected}`, handler produced `{found}`")]
    ResultMismatch {
        /// The request key.
        key: RoutingKey,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type the handler produced.
        found: &'static str,
    },
    /// Two simultaneously active scopes declare the same request key.
    #[error("duplicate routing key '{key}': kept the handler of scope {kept}, dropped the one of scope {dropped}")]
    DuplicateKey {
        /// The contested key.
        key: RoutingKey,
        /// The scope whose registration stays routable.
        kept: ScopeId,
        /// The scope whose registration was dropped.
        dropped: ScopeId,
    },
    /// A request handler or event listener failed or panicked.
    #[error("handler for '{key}' failed: {message}")]
    HandlerFailed {
        /// The request or event key.
        key: RoutingKey,
        /// The failure description.
        message: String,
    },
    /// A scope enter/exit hook failed or panicked.
    #[error("{phase} hook `{hook}` of scope {scope} failed: {message}")]
    HookFailed {
        /// The scope being transitioned.
        scope: ScopeId,
        /// The transition.
        phase: HookPhase,
        /// The hook's origin name.
        hook: String,
        /// The failure description.
        message: String,
    },
    /// A scope with no handlers and no hooks was activated.
    #[error("scope {scope} was activated but declares no handlers or hooks")]
    EmptyScope {
        /// The activated scope.
        scope: ScopeId,
    },
    /// A scene name does not name any known scope.
    #[error("scene '{scene}' does not map to a known scope")]
    UnmappedScene {
        /// The scene name.
        scene: String,
    },
}

impl DispatchFault {
    /// Builds the fault describing a [`HandlerError`] raised for `key`.
    pub fn from_handler(key: &RoutingKey, error: HandlerError) -> Self {
        match error {
            HandlerError::PayloadMismatch { expected, found } => DispatchFault::PayloadMismatch {
                key: key.clone(),
                expected,
                found,
            },
            other => DispatchFault::HandlerFailed {
                key: key.clone(),
                message: other.to_string(),
            },
        }
    }

    /// Returns how loudly this fault should be reported.
    pub fn severity(&self) -> FaultSeverity {
        match self {
            DispatchFault::EmptyScope { .. } | DispatchFault::UnmappedScene { .. } => {
                FaultSeverity::Warning
            }
            _ => FaultSeverity::Error,
        }
    }

    /// A short stable name for the fault category.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchFault::MalformedDeclaration { .. } => "malformed_declaration",
            DispatchFault::EmptyKey { .. } => "empty_key",
            DispatchFault::UnknownKey { .. } => "unknown_key",
            DispatchFault::PayloadMismatch { .. } => "payload_mismatch",
            DispatchFault::ResultMismatch { .. } => "result_mismatch",
            DispatchFault::DuplicateKey { .. } => "duplicate_key",
            DispatchFault::HandlerFailed { .. } => "handler_failed",
            DispatchFault::HookFailed { .. } => "hook_failed",
            DispatchFault::EmptyScope { .. } => "empty_scope",
            DispatchFault::UnmappedScene { .. } => "unmapped_scene",
        }
    }
}

/// Receives every fault the runtime absorbs.
///
/// Implementations must not panic and must not call back into the component
/// that reported the fault while holding their own locks.
pub trait FaultSink: Send + Sync {
    /// Reports one absorbed fault.
    fn report(&self, fault: DispatchFault);
}

/// The default sink: writes faults to the `log` facade at their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FaultSink for LogSink {
    fn report(&self, fault: DispatchFault) {
        match fault.severity() {
            FaultSeverity::Warning => log::warn!("{fault}"),
            FaultSeverity::Error => log::error!("{fault}"),
        }
    }
}

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

//! A fault sink that keeps what it receives.

use relay_core::{DispatchFault, FaultSeverity, FaultSink, LogSink};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A thread-safe [`FaultSink`] recording every fault in arrival order.
///
/// By default each fault is also forwarded to the [`LogSink`], so installing
/// a recorder never silences the log. Useful for diagnostics overlays and for
/// asserting on absorbed failures in tests.
#[derive(Debug)]
pub struct FaultRecorder {
    faults: Mutex<Vec<DispatchFault>>,
    forward_to_log: bool,
}

impl FaultRecorder {
    /// Creates a recorder that also logs.
    pub fn new() -> Self {
        Self {
            faults: Mutex::new(Vec::new()),
            forward_to_log: true,
        }
    }

    /// Creates a recorder that does not log.
    pub fn silent() -> Self {
        Self {
            faults: Mutex::new(Vec::new()),
            forward_to_log: false,
        }
    }

    /// Returns a copy of every recorded fault.
    pub fn faults(&self) -> Vec<DispatchFault> {
        self.lock().clone()
    }

    /// Returns the kind of every recorded fault, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.lock().iter().map(DispatchFault::kind).collect()
    }

    /// Counts the recorded faults of `kind`.
    pub fn count(&self, kind: &str) -> usize {
        self.lock().iter().filter(|f| f.kind() == kind).count()
    }

    /// Counts the recorded faults of `severity`.
    pub fn count_severity(&self, severity: FaultSeverity) -> usize {
        self.lock()
            .iter()
            .filter(|f| f.severity() == severity)
            .count()
    }

    /// Number of recorded faults.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forgets every recorded fault.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DispatchFault>> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FaultRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultSink for FaultRecorder {
    fn report(&self, fault: DispatchFault) {
        if self.forward_to_log {
            LogSink.report(fault.clone());
        }
        self.lock().push(fault);
    }
}

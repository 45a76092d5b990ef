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

//! Marshalling work from background threads onto the engine thread.

use flume::{Receiver, Sender, TrySendError};
use relay_core::{Payload, RoutingKey};
use std::fmt;

/// Work posted for the engine thread.
#[derive(Debug)]
pub enum Deferred {
    /// Publish an event.
    Publish {
        /// The event key.
        key: RoutingKey,
        /// The event payload.
        payload: Payload,
    },
    /// Send a request, discarding any result.
    Request {
        /// The request key.
        key: RoutingKey,
        /// The request payload.
        payload: Payload,
    },
}

impl Deferred {
    /// The key the work is addressed to.
    pub fn key(&self) -> &RoutingKey {
        match self {
            Self::Publish { key, .. } | Self::Request { key, .. } => key,
        }
    }
}

/// A FIFO of [`Deferred`] work, drained by the thread that owns it.
pub struct DispatchQueue {
    sender: Sender<Deferred>,
    receiver: Receiver<Deferred>,
}

impl DispatchQueue {
    /// Creates a queue holding at most `capacity` items, or any number when
    /// `None`.
    ///
    /// ## Arguments
    /// * `capacity` - The bound. `Some(0)` is raised to 1, as posting never
    ///   waits for the pumping thread.
    pub fn new(capacity: Option<usize>) -> Self {
        let (sender, receiver) = match capacity {
            Some(0) => {
                log::warn!("Dispatch queue capacity 0 raised to 1.");
                flume::bounded(1)
            }
            Some(capacity) => flume::bounded(capacity),
            None => flume::unbounded(),
        };
        Self { sender, receiver }
    }

    /// A cloneable handle other threads post through.
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            sender: self.sender.clone(),
        }
    }

    /// Takes the items queued when the call starts, oldest first.
    ///
    /// Items posted while the batch is being applied wait for the next call.
    pub fn take_batch(&self) -> Vec<Deferred> {
        let pending = self.receiver.len();
        self.receiver.try_iter().take(pending).collect()
    }

    /// The number of items waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("pending", &self.len())
            .field("capacity", &self.sender.capacity())
            .finish()
    }
}

/// Posts work to a [`DispatchQueue`] from any thread.
#[derive(Clone)]
pub struct DispatchHandle {
    sender: Sender<Deferred>,
}

impl DispatchHandle {
    /// Posts `work`.
    ///
    /// ## Returns
    ///
    /// `false`, with a warning logged, if the queue is full or gone.
    pub fn post(&self, work: Deferred) -> bool {
        match self.sender.try_send(work) {
            Ok(()) => true,
            Err(TrySendError::Full(work)) => {
                log::warn!("Dispatch queue full; dropped work for '{}'.", work.key());
                false
            }
            Err(TrySendError::Disconnected(work)) => {
                log::warn!("Dispatch queue closed; dropped work for '{}'.", work.key());
                false
            }
        }
    }

    /// Posts an event publication.
    pub fn publish(&self, key: impl Into<RoutingKey>, payload: Payload) -> bool {
        self.post(Deferred::Publish {
            key: key.into(),
            payload,
        })
    }

    /// Posts a request.
    pub fn request(&self, key: impl Into<RoutingKey>, payload: Payload) -> bool {
        self.post(Deferred::Request {
            key: key.into(),
            payload,
        })
    }
}

impl fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHandle").finish_non_exhaustive()
    }
}

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

//! Provides the synchronous, keyed publish/subscribe bus.
//!
//! Controllers publish events by [`RoutingKey`](crate::RoutingKey); views
//! subscribe [`EventHandler`]s to the keys they care about. Delivery happens
//! on the publishing thread, in subscription order, before `publish` returns.
//!
//! The [`listener`] module builds handlers from typed closures, applying the
//! same payload rules request handlers follow.

mod bus;
pub mod listener;

pub use self::bus::{EventBus, EventHandler};

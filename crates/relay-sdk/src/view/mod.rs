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

//! View-side event listening.
//!
//! A view type declares its listeners once through [`EventListeners`]; the
//! [`DescriptorCache`] turns that declaration into shared
//! [`ViewEventDescriptor`]s, and a [`ViewBinder`] per instance subscribes
//! them to the bus on enable and removes them on disable.

mod binder;
mod cache;
mod listeners;

pub use self::binder::ViewBinder;
pub use self::cache::DescriptorCache;
pub use self::listeners::{EventListeners, ListenerInvoker, ListenerSet, ViewEventDescriptor};

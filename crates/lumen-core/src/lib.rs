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

//! # Lumen Core
//!
//! Foundational crate containing the identifier packing, the frame-phase
//! protocol, and the shape contracts that every storage and scheduling crate
//! of the testbed agrees on.

#![warn(missing_docs)]

// Lets the derive macros refer to `::lumen_core` from inside this crate too.
extern crate self as lumen_core;

pub mod ecs;
pub mod phase;

pub use ecs::egid::{EntityIndex, Egid, GroupId, INVALID_GROUP};
pub use ecs::shape::{EntityView, Implementer};
pub use phase::{Condition, Phase};

/// Derive macros for the storage shape contracts.
pub use lumen_macros::{EntityView, Implementer};

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

//! Implements the testbed's **EntityDatabase**.
//!
//! Two storages sit behind one facade:
//!
//! - [`ImplementerStore`] holds the concrete aggregates that physically own
//!   component data. It is append-only bucket storage: once reserved, an
//!   implementer never moves until the database is torn down.
//! - [`ViewRegistry`] holds lightweight views, one contiguous buffer per
//!   `(view type, group)`, for cheap bulk iteration by systems.
//!
//! The primary entry point is [`EntityDatabase`].

mod buckets;
mod database;
mod error;
mod implementers;
mod views;

pub use buckets::{ImplementerBuckets, ImplementerRef, FIXED_BUCKET_BYTES};
pub use database::{DatabaseStats, EntityDatabase};
pub use error::DatabaseError;
pub use implementers::ImplementerStore;
pub use views::ViewRegistry;

#[cfg(test)]
mod tests;

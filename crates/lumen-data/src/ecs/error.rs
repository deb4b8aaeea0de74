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

//! Error type of the entity database.

use lumen_core::{Egid, GroupId};
use thiserror::Error;

/// A precondition violation reported by the entity database.
///
/// Every variant indicates a wiring bug in the calling code rather than a
/// transient condition; hosts are expected to abort the tick on any of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    /// A view was reserved or queried against the invalid group `0`.
    #[error("view `{view}` used with the invalid group 0")]
    InvalidGroup {
        /// Type name of the view.
        view: &'static str,
    },
    /// An entity id was requested for the invalid group `0`.
    #[error("entity id requested for the invalid group 0")]
    InvalidEgidGroup,
    /// A view was reserved for the invalid entity id `0`.
    #[error("view `{view}` reserved for invalid entity in {egid}")]
    InvalidEntity {
        /// Type name of the view.
        view: &'static str,
        /// The rejected identifier.
        egid: Egid,
    },
    /// No view of this type was ever reserved.
    #[error("view type `{view}` was never reserved")]
    UnknownViewType {
        /// Type name of the view.
        view: &'static str,
    },
    /// Views of this type exist, but none in the requested group.
    #[error("view type `{view}` has no storage for group {group}")]
    UnknownGroup {
        /// Type name of the view.
        view: &'static str,
        /// The requested group.
        group: GroupId,
    },
    /// The group exists for this view type, but the entity was never reserved in it.
    #[error("view `{view}` was never reserved for {egid}")]
    UnknownEntity {
        /// Type name of the view.
        view: &'static str,
        /// The requested identifier.
        egid: Egid,
    },
    /// The entity already owns a view of this type in this group.
    #[error("view `{view}` already reserved for {egid}")]
    DuplicateView {
        /// Type name of the view.
        view: &'static str,
        /// The identifier reserved twice.
        egid: Egid,
    },
    /// No implementer of this type was ever reserved.
    #[error("implementer type `{implementer}` was never reserved")]
    UnknownImplementerType {
        /// Type name of the implementer.
        implementer: &'static str,
    },
    /// The handle does not point at a reserved implementer: it was never
    /// reserved, was issued by another store, or predates a clear.
    #[error(
        "dangling handle to implementer `{implementer}` \
         (epoch {epoch}, bucket {bucket}, slot {slot})"
    )]
    DanglingImplementer {
        /// Type name of the implementer.
        implementer: &'static str,
        /// Storage epoch carried by the handle.
        epoch: u32,
        /// Bucket index carried by the handle.
        bucket: u32,
        /// Slot index carried by the handle.
        slot: u32,
    },
    /// The 32-bit entity id space is used up.
    #[error("entity id space exhausted after {reserved} reservations")]
    EntityIdsExhausted {
        /// Number of ids handed out so far.
        reserved: u32,
    },
}

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

//! Defines the packed entity + group identifier used by every storage in the
//! entity database.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The per-database entity counter value carried in the low half of an [`Egid`].
pub type EntityIndex = u32;

/// A logical partition (e.g. active / inactive) that entities and their views
/// are filed under for bulk queries.
pub type GroupId = u32;

/// The reserved group id. Reservations and queries against it are rejected.
pub const INVALID_GROUP: GroupId = 0;

/// A packed Entity + Group IDentifier.
///
/// The group id lives in the high 32 bits and the entity id in the low 32 bits,
/// so comparing two identifiers compares the packed value directly and the
/// ordering is group-major. The packed value `0` is the sole invalid sentinel.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Egid(u64);

impl Egid {
    /// The invalid identifier.
    pub const INVALID: Egid = Egid(0);

    /// Packs an entity id and a group id.
    #[inline]
    #[must_use]
    pub const fn new(entity_id: EntityIndex, group_id: GroupId) -> Self {
        Self(((group_id as u64) << 32) | entity_id as u64)
    }

    /// Rebuilds an identifier from its packed representation.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the packed representation.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns the entity id stored in the low 32 bits.
    #[inline]
    #[must_use]
    pub const fn entity_id(self) -> EntityIndex {
        self.0 as u32
    }

    /// Returns the group id stored in the high 32 bits.
    #[inline]
    #[must_use]
    pub const fn group_id(self) -> GroupId {
        (self.0 >> 32) as u32
    }

    /// Returns `true` iff the packed value is non-zero.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }

    /// Returns the same entity filed under another group.
    #[inline]
    #[must_use]
    pub const fn with_group(self, group_id: GroupId) -> Self {
        Self::new(self.entity_id(), group_id)
    }
}

impl fmt::Display for Egid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}@g{}", self.entity_id(), self.group_id())
    }
}

impl From<Egid> for u64 {
    fn from(egid: Egid) -> Self {
        egid.raw()
    }
}

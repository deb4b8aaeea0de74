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

//! The `EntityDatabase` facade.

use std::fmt;

use lumen_core::{EntityIndex, EntityView, Egid, GroupId, Implementer, INVALID_GROUP};

use crate::ecs::{DatabaseError, ImplementerBuckets, ImplementerRef, ImplementerStore, ViewRegistry};

/// A snapshot of how much the database holds, for frame logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Entity ids handed out so far.
    pub entities: u32,
    /// Distinct implementer types.
    pub implementer_kinds: usize,
    /// Implementers across all types.
    pub implementers: usize,
    /// Buckets across all implementer types.
    pub implementer_buckets: usize,
    /// Distinct view types.
    pub view_kinds: usize,
    /// `(view type, group)` buffers.
    pub view_keys: usize,
    /// Views across all buffers.
    pub views: usize,
}

impl fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities, {} implementers in {} buckets ({} kinds), {} views in {} buffers ({} kinds)",
            self.entities,
            self.implementers,
            self.implementer_buckets,
            self.implementer_kinds,
            self.views,
            self.view_keys,
            self.view_kinds
        )
    }
}

/// The entity database: id allocation, implementer storage and view storage.
///
/// The host creates one database at startup and hands it to every engine
/// through the sequencer's dispatch context. Every accessor is generic over
/// the caller's concrete type, so new implementer and view shapes need no
/// change to the database itself.
///
/// Entities are never destroyed individually. [`clear`](Self::clear) (or
/// dropping the database) tears everything down at once.
///
/// # Example
///
/// ```rust
/// use lumen_core::{EntityView, Egid, Implementer};
/// use lumen_data::{EntityDatabase, ImplementerRef};
///
/// #[derive(Implementer)]
/// struct Mesh { visible: bool }
///
/// #[derive(EntityView, Default)]
/// struct MeshView { egid: Egid, mesh: ImplementerRef<Mesh> }
///
/// const ACTIVE: u32 = 1;
///
/// let mut db = EntityDatabase::new();
/// let egid = db.reserve_egid(ACTIVE).unwrap();
/// let mesh = db.reserve_implementer(Mesh { visible: false });
/// db.reserve_view::<MeshView>(egid).unwrap().mesh = mesh;
///
/// let (implementers, views) = db.split_mut();
/// for view in views.query::<MeshView>(ACTIVE).unwrap() {
///     implementers.get_mut(view.mesh).unwrap().visible = true;
/// }
/// assert!(db.implementer(mesh).unwrap().visible);
/// ```
#[derive(Default)]
pub struct EntityDatabase {
    last_entity_id: EntityIndex,
    implementers: ImplementerStore,
    views: ViewRegistry,
}

impl EntityDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Entity ids ---

    /// Hands out the next entity id.
    ///
    /// Ids start at `1`, strictly increase and are never reused for the
    /// lifetime of the database.
    pub fn reserve_entity_id(&mut self) -> Result<EntityIndex, DatabaseError> {
        self.last_entity_id = self
            .last_entity_id
            .checked_add(1)
            .ok_or(DatabaseError::EntityIdsExhausted {
                reserved: self.last_entity_id,
            })?;
        Ok(self.last_entity_id)
    }

    /// Hands out the next entity id, packed with `group`.
    pub fn reserve_egid(&mut self, group: GroupId) -> Result<Egid, DatabaseError> {
        if group == INVALID_GROUP {
            return Err(DatabaseError::InvalidEgidGroup);
        }
        Ok(Egid::new(self.reserve_entity_id()?, group))
    }

    /// Number of entity ids handed out so far.
    pub fn entities_reserved(&self) -> u32 {
        self.last_entity_id
    }

    // --- Implementers ---

    /// Stores an implementer and returns its pointer-stable handle.
    pub fn reserve_implementer<T: Implementer>(&mut self, value: T) -> ImplementerRef<T> {
        self.implementers.reserve(value)
    }

    /// Resolves an implementer handle.
    pub fn implementer<T: Implementer>(
        &self,
        handle: ImplementerRef<T>,
    ) -> Result<&T, DatabaseError> {
        self.implementers.get(handle)
    }

    /// Resolves an implementer handle mutably.
    pub fn implementer_mut<T: Implementer>(
        &mut self,
        handle: ImplementerRef<T>,
    ) -> Result<&mut T, DatabaseError> {
        self.implementers.get_mut(handle)
    }

    /// Returns the whole bucket list of `T` for bulk iteration.
    pub fn implementers_of<T: Implementer>(&self) -> Result<&ImplementerBuckets<T>, DatabaseError> {
        self.implementers.buckets::<T>()
    }

    // --- Views ---

    /// Reserves a `V` for `egid` and returns it for the caller to populate.
    ///
    /// The returned reference borrows the database; re-fetch through
    /// [`query_view_mut`](Self::query_view_mut) after any later reservation.
    pub fn reserve_view<V: EntityView>(&mut self, egid: Egid) -> Result<&mut V, DatabaseError> {
        self.views.reserve(egid)
    }

    /// Returns every `V` reserved in `group`, as one slice.
    pub fn query_views<V: EntityView>(&self, group: GroupId) -> Result<&[V], DatabaseError> {
        self.views.query(group)
    }

    /// Returns every `V` reserved in `group`, as one mutable slice.
    pub fn query_views_mut<V: EntityView>(
        &mut self,
        group: GroupId,
    ) -> Result<&mut [V], DatabaseError> {
        self.views.query_mut(group)
    }

    /// Returns the `V` reserved for `egid`.
    pub fn query_view<V: EntityView>(&self, egid: Egid) -> Result<&V, DatabaseError> {
        self.views.get(egid)
    }

    /// Returns the `V` reserved for `egid`, mutably.
    pub fn query_view_mut<V: EntityView>(&mut self, egid: Egid) -> Result<&mut V, DatabaseError> {
        self.views.get_mut(egid)
    }

    /// Returns `true` if a `V` was reserved for `egid`.
    pub fn has_view<V: EntityView>(&self, egid: Egid) -> bool {
        self.views.contains::<V>(egid)
    }

    /// Number of `V` reserved in `group`; zero when there are none.
    pub fn view_count<V: EntityView>(&self, group: GroupId) -> usize {
        self.views.count::<V>(group)
    }

    /// Groups holding at least one `V`.
    pub fn groups_of<V: EntityView>(&self) -> Vec<GroupId> {
        self.views.groups::<V>()
    }

    // --- Whole-database access ---

    /// Implementer storage.
    pub fn implementers(&self) -> &ImplementerStore {
        &self.implementers
    }

    /// View storage.
    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    /// Splits the database into its two storages so a system can iterate
    /// views while writing to the implementers they refer to.
    pub fn split_mut(&mut self) -> (&mut ImplementerStore, &mut ViewRegistry) {
        (&mut self.implementers, &mut self.views)
    }

    /// Counts what the database currently holds.
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            entities: self.last_entity_id,
            implementer_kinds: self.implementers.kind_count(),
            implementers: self.implementers.instance_count(),
            implementer_buckets: self.implementers.bucket_count(),
            view_kinds: self.views.type_count(),
            view_keys: self.views.key_count(),
            views: self.views.instance_count(),
        }
    }

    /// Tears down every implementer and view.
    ///
    /// The entity id counter is kept, so ids are still never reused. Implementer
    /// handles reserved before the clear no longer resolve.
    pub fn clear(&mut self) {
        log::info!("EntityDatabase: clearing ({})", self.stats());
        self.implementers.clear();
        self.views.clear();
    }
}

#[cfg(test)]
impl EntityDatabase {
    pub(crate) fn with_last_entity_id(last_entity_id: EntityIndex) -> Self {
        Self {
            last_entity_id,
            ..Self::default()
        }
    }
}

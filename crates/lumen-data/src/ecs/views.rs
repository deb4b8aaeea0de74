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

//! Group-partitioned storage of entity views.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap};

use lumen_core::{EntityIndex, EntityView, Egid, GroupId, INVALID_GROUP};

use crate::ecs::DatabaseError;

/// The views of one type filed under one group.
///
/// `views` is the contiguous buffer systems iterate; `index` maps an entity id
/// to its position in that buffer. Views are only ever appended, so a position
/// stays valid once recorded.
struct ViewGroup<V> {
    views: Vec<V>,
    index: BTreeMap<EntityIndex, usize>,
}

impl<V> ViewGroup<V> {
    fn new() -> Self {
        Self {
            views: Vec::new(),
            index: BTreeMap::new(),
        }
    }
}

/// Every group of one view type.
struct ViewTable<V> {
    groups: BTreeMap<GroupId, ViewGroup<V>>,
}

/// Type-erased access to a [`ViewTable`] for the registry's type map.
trait AnyViewTable {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn group_count(&self) -> usize;
    fn instance_count(&self) -> usize;
}

impl<V: 'static> AnyViewTable for ViewTable<V> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn instance_count(&self) -> usize {
        self.groups.values().map(|g| g.views.len()).sum()
    }
}

/// Registry of entity views keyed by `(view type, group)`.
///
/// Each key owns one growable buffer. A reference returned by
/// [`reserve`](Self::reserve) borrows the registry, so it cannot outlive the
/// next reservation against any key: growth of the buffer is never observable
/// through a stale reference. Durable access goes through the entity's
/// [`Egid`].
#[derive(Default)]
pub struct ViewRegistry {
    tables: HashMap<TypeId, Box<dyn AnyViewTable>>,
}

impl ViewRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Appends a default `V` under `egid`'s group, stamps `egid` into it and
    /// returns it for the caller to populate.
    pub fn reserve<V: EntityView>(&mut self, egid: Egid) -> Result<&mut V, DatabaseError> {
        check_group::<V>(egid.group_id())?;
        if egid.entity_id() == 0 {
            return Err(DatabaseError::InvalidEntity {
                view: type_name::<V>(),
                egid,
            });
        }

        let table = self.table_or_insert::<V>();
        let group = table.groups.entry(egid.group_id()).or_insert_with(|| {
            log::debug!(
                "ViewRegistry: new group {} for view {}",
                egid.group_id(),
                type_name::<V>()
            );
            ViewGroup::new()
        });

        if group.index.contains_key(&egid.entity_id()) {
            return Err(DatabaseError::DuplicateView {
                view: type_name::<V>(),
                egid,
            });
        }

        let position = group.views.len();
        group.index.insert(egid.entity_id(), position);
        let mut view = V::default();
        view.set_egid(egid);
        group.views.push(view);

        Ok(&mut group.views[position])
    }

    /// Returns every `V` of `group` as one contiguous slice.
    pub fn query<V: EntityView>(&self, group: GroupId) -> Result<&[V], DatabaseError> {
        Ok(&self.group::<V>(group)?.views)
    }

    /// Returns every `V` of `group` as one contiguous mutable slice.
    pub fn query_mut<V: EntityView>(&mut self, group: GroupId) -> Result<&mut [V], DatabaseError> {
        Ok(&mut self.group_mut::<V>(group)?.views)
    }

    /// Returns the `V` reserved for `egid`.
    pub fn get<V: EntityView>(&self, egid: Egid) -> Result<&V, DatabaseError> {
        let group = self.group::<V>(egid.group_id())?;
        let position = position_of::<V>(&group.index, egid)?;
        Ok(&group.views[position])
    }

    /// Returns the `V` reserved for `egid`, mutably.
    pub fn get_mut<V: EntityView>(&mut self, egid: Egid) -> Result<&mut V, DatabaseError> {
        let group = self.group_mut::<V>(egid.group_id())?;
        let position = position_of::<V>(&group.index, egid)?;
        Ok(&mut group.views[position])
    }

    /// Returns `true` if a `V` was reserved for `egid`.
    pub fn contains<V: EntityView>(&self, egid: Egid) -> bool {
        self.table::<V>()
            .and_then(|t| t.groups.get(&egid.group_id()))
            .is_some_and(|g| g.index.contains_key(&egid.entity_id()))
    }

    /// Number of `V` reserved in `group`. Zero when nothing was reserved there.
    pub fn count<V: EntityView>(&self, group: GroupId) -> usize {
        self.table::<V>()
            .and_then(|t| t.groups.get(&group))
            .map_or(0, |g| g.views.len())
    }

    /// Groups holding at least one `V`, in ascending order.
    pub fn groups<V: EntityView>(&self) -> Vec<GroupId> {
        self.table::<V>()
            .map(|t| t.groups.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of distinct view types.
    pub fn type_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of `(view type, group)` buffers.
    pub fn key_count(&self) -> usize {
        self.tables.values().map(|t| t.group_count()).sum()
    }

    /// Total number of views across all buffers.
    pub fn instance_count(&self) -> usize {
        self.tables.values().map(|t| t.instance_count()).sum()
    }

    /// Drops every view of every type.
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    fn table<V: EntityView>(&self) -> Option<&ViewTable<V>> {
        self.tables
            .get(&TypeId::of::<V>())?
            .as_any()
            .downcast_ref::<ViewTable<V>>()
    }

    fn table_mut<V: EntityView>(&mut self) -> Option<&mut ViewTable<V>> {
        self.tables
            .get_mut(&TypeId::of::<V>())?
            .as_any_mut()
            .downcast_mut::<ViewTable<V>>()
    }

    fn table_or_insert<V: EntityView>(&mut self) -> &mut ViewTable<V> {
        let entry = self.tables.entry(TypeId::of::<V>()).or_insert_with(|| {
            log::debug!("ViewRegistry: new view type {}", type_name::<V>());
            Box::new(ViewTable::<V> {
                groups: BTreeMap::new(),
            })
        });
        match entry.as_any_mut().downcast_mut::<ViewTable<V>>() {
            Some(table) => table,
            // Keyed by `TypeId::of::<V>()`, so the entry is always a `ViewTable<V>`.
            None => unreachable!("view storage keyed by the wrong type"),
        }
    }

    fn group<V: EntityView>(&self, group: GroupId) -> Result<&ViewGroup<V>, DatabaseError> {
        check_group::<V>(group)?;
        self.table::<V>()
            .ok_or(DatabaseError::UnknownViewType {
                view: type_name::<V>(),
            })?
            .groups
            .get(&group)
            .ok_or(DatabaseError::UnknownGroup {
                view: type_name::<V>(),
                group,
            })
    }

    fn group_mut<V: EntityView>(
        &mut self,
        group: GroupId,
    ) -> Result<&mut ViewGroup<V>, DatabaseError> {
        check_group::<V>(group)?;
        self.table_mut::<V>()
            .ok_or(DatabaseError::UnknownViewType {
                view: type_name::<V>(),
            })?
            .groups
            .get_mut(&group)
            .ok_or(DatabaseError::UnknownGroup {
                view: type_name::<V>(),
                group,
            })
    }
}

fn check_group<V>(group: GroupId) -> Result<(), DatabaseError> {
    if group == INVALID_GROUP {
        return Err(DatabaseError::InvalidGroup {
            view: type_name::<V>(),
        });
    }
    Ok(())
}

fn position_of<V>(
    index: &BTreeMap<EntityIndex, usize>,
    egid: Egid,
) -> Result<usize, DatabaseError> {
    index
        .get(&egid.entity_id())
        .copied()
        .ok_or(DatabaseError::UnknownEntity {
            view: type_name::<V>(),
            egid,
        })
}

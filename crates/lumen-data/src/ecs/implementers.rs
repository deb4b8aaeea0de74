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

//! Type-keyed storage of every implementer bucket list.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use lumen_core::Implementer;

use crate::ecs::buckets::{next_epoch, AnyBuckets, ImplementerBuckets, ImplementerRef};
use crate::ecs::DatabaseError;

/// Holds one [`ImplementerBuckets`] per implementer type.
///
/// New implementer shapes need no registration: the first reservation of a
/// type creates its bucket list. The type lookup happens once per call; bulk
/// access goes through [`buckets`](Self::buckets) and iterates the typed
/// storage directly.
///
/// Handles carry the store's epoch. A store gets a fresh epoch when created
/// and again on every [`clear`](Self::clear), so handles from another store or
/// from before a clear resolve to [`DatabaseError::DanglingImplementer`].
pub struct ImplementerStore {
    epoch: u32,
    kinds: HashMap<TypeId, Box<dyn AnyBuckets>>,
}

impl Default for ImplementerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ImplementerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            epoch: next_epoch(),
            kinds: HashMap::new(),
        }
    }

    /// Epoch stamped into the handles this store currently issues.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Reserves a slot for `value` and returns its pointer-stable handle.
    pub fn reserve<T: Implementer>(&mut self, value: T) -> ImplementerRef<T> {
        self.buckets_or_insert::<T>().reserve(value)
    }

    /// Resolves a handle to the implementer it points at.
    pub fn get<T: Implementer>(&self, handle: ImplementerRef<T>) -> Result<&T, DatabaseError> {
        self.buckets::<T>()?
            .get(handle)
            .ok_or_else(|| dangling(handle))
    }

    /// Resolves a handle to the implementer it points at, mutably.
    pub fn get_mut<T: Implementer>(
        &mut self,
        handle: ImplementerRef<T>,
    ) -> Result<&mut T, DatabaseError> {
        self.buckets_mut::<T>()?
            .get_mut(handle)
            .ok_or_else(|| dangling(handle))
    }

    /// Returns the typed bucket list of `T`.
    pub fn buckets<T: Implementer>(&self) -> Result<&ImplementerBuckets<T>, DatabaseError> {
        self.kinds
            .get(&TypeId::of::<T>())
            .and_then(|b| b.as_any().downcast_ref::<ImplementerBuckets<T>>())
            .ok_or(DatabaseError::UnknownImplementerType {
                implementer: type_name::<T>(),
            })
    }

    /// Returns the typed bucket list of `T`, mutably.
    pub fn buckets_mut<T: Implementer>(
        &mut self,
    ) -> Result<&mut ImplementerBuckets<T>, DatabaseError> {
        self.kinds
            .get_mut(&TypeId::of::<T>())
            .and_then(|b| b.as_any_mut().downcast_mut::<ImplementerBuckets<T>>())
            .ok_or(DatabaseError::UnknownImplementerType {
                implementer: type_name::<T>(),
            })
    }

    /// Number of implementers of type `T` reserved so far. Zero for unknown types.
    pub fn count<T: Implementer>(&self) -> usize {
        self.kinds
            .get(&TypeId::of::<T>())
            .map_or(0, |b| b.len())
    }

    /// Number of distinct implementer types.
    pub fn kind_count(&self) -> usize {
        self.kinds.len()
    }

    /// Total number of implementers across all types.
    pub fn instance_count(&self) -> usize {
        self.kinds.values().map(|b| b.len()).sum()
    }

    /// Total number of buckets across all types.
    pub fn bucket_count(&self) -> usize {
        self.kinds.values().map(|b| b.bucket_count()).sum()
    }

    /// Drops every implementer of every type.
    pub fn clear(&mut self) {
        self.kinds.clear();
        self.epoch = next_epoch();
    }

    fn buckets_or_insert<T: Implementer>(&mut self) -> &mut ImplementerBuckets<T> {
        let epoch = self.epoch;
        let entry = self.kinds.entry(TypeId::of::<T>()).or_insert_with(|| {
            log::debug!("ImplementerStore: new implementer type {}", type_name::<T>());
            Box::new(ImplementerBuckets::<T>::with_epoch(epoch))
        });
        match entry.as_any_mut().downcast_mut::<ImplementerBuckets<T>>() {
            Some(buckets) => buckets,
            // The map is keyed by `TypeId::of::<T>()`, so the entry is always
            // an `ImplementerBuckets<T>`.
            None => unreachable!("implementer storage keyed by the wrong type"),
        }
    }
}

fn dangling<T>(handle: ImplementerRef<T>) -> DatabaseError {
    DatabaseError::DanglingImplementer {
        implementer: type_name::<T>(),
        epoch: handle.epoch(),
        bucket: handle.bucket(),
        slot: handle.slot(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::Implementer;

    #[derive(Implementer, Debug, Clone, PartialEq)]
    struct Bounds {
        min: [f32; 3],
        max: [f32; 3],
    }

    #[derive(Implementer, Debug, Clone, PartialEq)]
    struct Light {
        intensity: f32,
    }

    #[test]
    fn test_reserve_and_get_per_type() {
        let mut store = ImplementerStore::new();
        let bounds = store.reserve(Bounds {
            min: [0.0; 3],
            max: [1.0; 3],
        });
        let light = store.reserve(Light { intensity: 2.5 });

        assert_eq!(store.get(bounds).unwrap().min, [0.0; 3]);
        assert_eq!(store.get(bounds).unwrap().max, [1.0; 3]);
        assert_eq!(store.get(light).unwrap().intensity, 2.5);
        assert_eq!(store.kind_count(), 2);
        assert_eq!(store.instance_count(), 2);
    }

    #[test]
    fn test_get_mut_writes_through() {
        let mut store = ImplementerStore::new();
        let light = store.reserve(Light { intensity: 1.0 });
        store.get_mut(light).unwrap().intensity = 4.0;
        assert_eq!(store.get(light).unwrap().intensity, 4.0);
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let store = ImplementerStore::new();
        let err = store.buckets::<Light>().err().unwrap();
        assert!(matches!(err, DatabaseError::UnknownImplementerType { .. }));
        assert_eq!(store.count::<Light>(), 0);
    }

    #[test]
    fn test_dangling_handle_is_an_error() {
        let mut store = ImplementerStore::new();
        store.reserve(Light { intensity: 1.0 });
        let err = store.get(ImplementerRef::<Light>::DANGLING).unwrap_err();
        assert!(matches!(err, DatabaseError::DanglingImplementer { .. }));
    }

    #[test]
    fn test_handle_from_before_clear_is_dangling() {
        let mut store = ImplementerStore::new();
        let stale = store.reserve(Light { intensity: 1.0 });
        let before = store.epoch();
        store.clear();
        assert_ne!(store.epoch(), before);

        let fresh = store.reserve(Light { intensity: 9.0 });
        assert_eq!((stale.bucket(), stale.slot()), (fresh.bucket(), fresh.slot()));
        assert!(matches!(
            store.get(stale),
            Err(DatabaseError::DanglingImplementer { .. })
        ));
        assert!(matches!(
            store.get_mut(stale),
            Err(DatabaseError::DanglingImplementer { .. })
        ));
        assert_eq!(store.get(fresh).unwrap().intensity, 9.0);
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut store = ImplementerStore::new();
        store.reserve(Light { intensity: 1.0 });
        store.clear();
        assert_eq!(store.kind_count(), 0);
        assert_eq!(store.bucket_count(), 0);
    }
}

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

//! Append-only, fixed-capacity block storage for implementers.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

/// Size budget of one bucket. A bucket holds as many whole `T` as fit in it.
pub const FIXED_BUCKET_BYTES: usize = 16 * 1024;

static NEXT_EPOCH: AtomicU32 = AtomicU32::new(1);

/// Hands out a storage epoch that no other live storage in the process holds.
///
/// Epoch `0` is reserved for [`ImplementerRef::DANGLING`] and never returned.
pub(crate) fn next_epoch() -> u32 {
    loop {
        let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
        if epoch != 0 {
            return epoch;
        }
    }
}

/// Returns how many `T` one bucket holds. Never less than one.
#[inline]
pub(crate) const fn elements_per_bucket<T>() -> usize {
    let size = std::mem::size_of::<T>();
    if size == 0 || size >= FIXED_BUCKET_BYTES {
        1
    } else {
        FIXED_BUCKET_BYTES / size
    }
}

/// A typed, copyable handle to an implementer reserved in bucket storage.
///
/// The handle is a coordinate (bucket, slot) stamped with the epoch of the
/// storage that issued it. It resolves only in that storage and only until the
/// storage is cleared; the implementer it resolves to never moves in memory.
/// The default handle is dangling and resolves to nothing.
pub struct ImplementerRef<T> {
    epoch: u32,
    bucket: u32,
    slot: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ImplementerRef<T> {
    /// The handle that never resolves.
    pub const DANGLING: Self = Self::new(0, u32::MAX, u32::MAX);

    const fn new(epoch: u32, bucket: u32, slot: u32) -> Self {
        Self {
            epoch,
            bucket,
            slot,
            _marker: PhantomData,
        }
    }

    /// Epoch of the storage that issued the handle.
    #[inline]
    pub fn epoch(self) -> u32 {
        self.epoch
    }

    /// Index of the bucket holding the implementer.
    #[inline]
    pub fn bucket(self) -> u32 {
        self.bucket
    }

    /// Index of the implementer inside its bucket.
    #[inline]
    pub fn slot(self) -> u32 {
        self.slot
    }

    /// Returns `true` for the default, never-reserved handle.
    #[inline]
    pub fn is_dangling(self) -> bool {
        self.epoch == 0
    }
}

// Manual impls: the derives would needlessly require `T: Clone`, `T: Debug`, ...
impl<T> Clone for ImplementerRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ImplementerRef<T> {}

impl<T> Default for ImplementerRef<T> {
    fn default() -> Self {
        Self::DANGLING
    }
}

impl<T> PartialEq for ImplementerRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.epoch == other.epoch && self.bucket == other.bucket && self.slot == other.slot
    }
}

impl<T> Eq for ImplementerRef<T> {}

impl<T> Hash for ImplementerRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.epoch.hash(state);
        self.bucket.hash(state);
        self.slot.hash(state);
    }
}

impl<T> fmt::Debug for ImplementerRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplementerRef")
            .field("type", &std::any::type_name::<T>())
            .field("epoch", &self.epoch)
            .field("bucket", &self.bucket)
            .field("slot", &self.slot)
            .finish()
    }
}

/// Pointer-stable storage for every implementer of one type.
///
/// Storage is a list of buckets. Each bucket is allocated once with room for
/// [`elements_per_bucket`](Self::elements_per_bucket) values and is never
/// grown past that room, so a value's address never changes. A new bucket is
/// appended lazily when the next slot would overflow the last one. Nothing is
/// ever freed individually.
///
/// Every storage carries its own epoch, so a handle issued by another storage
/// never resolves here even when its coordinate is in range.
pub struct ImplementerBuckets<T> {
    epoch: u32,
    buckets: Vec<Vec<T>>,
    elements_per_bucket: usize,
    len: usize,
}

impl<T> ImplementerBuckets<T> {
    /// Creates empty storage. No bucket is allocated until the first reservation.
    pub fn new() -> Self {
        Self::with_epoch(next_epoch())
    }

    pub(crate) fn with_epoch(epoch: u32) -> Self {
        Self {
            epoch,
            buckets: Vec::new(),
            elements_per_bucket: elements_per_bucket::<T>(),
            len: 0,
        }
    }

    /// Stores `value` in the next free slot and returns its handle.
    pub fn reserve(&mut self, value: T) -> ImplementerRef<T> {
        let bucket = self.len / self.elements_per_bucket;
        let slot = self.len % self.elements_per_bucket;

        if bucket == self.buckets.len() {
            log::trace!(
                "ImplementerBuckets<{}>: allocating bucket {} ({} slots)",
                std::any::type_name::<T>(),
                bucket,
                self.elements_per_bucket
            );
            self.buckets
                .push(Vec::with_capacity(self.elements_per_bucket));
        }

        let block = &mut self.buckets[bucket];
        // A push within capacity never reallocates, which is what keeps
        // previously reserved values in place.
        debug_assert!(block.len() < block.capacity());
        block.push(value);
        self.len += 1;

        ImplementerRef::new(self.epoch, bucket as u32, slot as u32)
    }

    /// Resolves a handle.
    #[inline]
    pub fn get(&self, handle: ImplementerRef<T>) -> Option<&T> {
        if handle.epoch != self.epoch {
            return None;
        }
        self.buckets
            .get(handle.bucket as usize)?
            .get(handle.slot as usize)
    }

    /// Resolves a handle mutably.
    #[inline]
    pub fn get_mut(&mut self, handle: ImplementerRef<T>) -> Option<&mut T> {
        if handle.epoch != self.epoch {
            return None;
        }
        self.buckets
            .get_mut(handle.bucket as usize)?
            .get_mut(handle.slot as usize)
    }

    /// Epoch stamped into every handle this storage issues.
    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Number of reserved implementers.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing was reserved yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets allocated so far.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Capacity of a single bucket.
    #[inline]
    pub fn elements_per_bucket(&self) -> usize {
        self.elements_per_bucket
    }

    /// Iterates over every implementer in reservation order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buckets.iter().flatten()
    }

    /// Iterates mutably over every implementer in reservation order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.buckets.iter_mut().flatten()
    }
}

impl<T> Default for ImplementerBuckets<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased access to an [`ImplementerBuckets`] for the store's type map.
pub(crate) trait AnyBuckets {
    /// Casts the trait object to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Casts the trait object to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Number of reserved implementers.
    fn len(&self) -> usize;

    /// Number of allocated buckets.
    fn bucket_count(&self) -> usize;
}

impl<T: 'static> AnyBuckets for ImplementerBuckets<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn len(&self) -> usize {
        self.len
    }

    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

//! Point index shared between a reader thread and its consumers
//!
//! One coarse lock guards the whole [`PartitionedIndex`]. It is held for a single
//! insert, relabel or query at a time; range queries return owned copies so nothing
//! borrowed from the index outlives the lock.

use std::sync::{Arc, Mutex, MutexGuard};

use cloudlabel_core::{Extents3d, PartitionedIndex, Payload, Point3d, PointMap};

#[derive(Debug, Clone, Default)]
pub struct SharedIndex {
    inner: Arc<Mutex<PartitionedIndex>>,
}

impl SharedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the index for a sequence of operations
    ///
    /// A reader thread that panicked while holding the lock leaves the index as it was
    /// after its last complete operation, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, PartitionedIndex> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, point: &Point3d, payload: Payload) {
        self.lock().insert(point, payload);
    }

    pub fn size(&self) -> usize {
        self.lock().size()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn find(&self, point: &Point3d) -> Vec<Payload> {
        self.lock().find(point).to_vec()
    }

    pub fn find_range(&self, lower: &Point3d, upper: &Point3d) -> PointMap<Payload> {
        self.lock().find_range(lower, upper)
    }

    pub fn relabel(&self, point: &Point3d, id: u32) -> usize {
        self.lock().relabel(point, id)
    }

    pub fn extents(&self) -> Extents3d {
        self.lock().extents().clone()
    }
}

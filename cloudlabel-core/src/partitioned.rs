//! Point map kept in lockstep with a per-partition grouping of the same points
//!
//! Every `(point, payload)` in the primary map with `payload.id == k` also appears in
//! the partition map for `k`, and nothing else does. All mutation goes through this type
//! so the two structures cannot drift apart; partitions that become empty are removed.

use std::collections::BTreeMap;

use crate::extents::Extents3d;
use crate::point::{Payload, Point3d};
use crate::point_map::PointMap;

/// Points grouped by partition id
pub type Partitions = BTreeMap<u32, PointMap<Payload>>;

/// Primary point map, partition grouping and running extents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedIndex {
    points: PointMap<Payload>,
    partitions: Partitions,
    extents: Extents3d,
}

impl PartitionedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &PointMap<Payload> {
        &self.points
    }

    pub fn partitions(&self) -> &Partitions {
        &self.partitions
    }

    pub fn partition(&self, id: u32) -> Option<&PointMap<Payload>> {
        self.partitions.get(&id)
    }

    /// Extents of every point ever inserted; erasing does not shrink them
    pub fn extents(&self) -> &Extents3d {
        &self.extents
    }

    pub fn size(&self) -> usize {
        self.points.size()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn find(&self, point: &Point3d) -> &[Payload] {
        self.points.find(point)
    }

    pub fn find_range(&self, lower: &Point3d, upper: &Point3d) -> PointMap<Payload> {
        self.points.find_range(lower, upper)
    }

    pub fn insert(&mut self, point: &Point3d, payload: Payload) {
        self.points.insert(point, payload);
        self.partitions.entry(payload.id).or_default().insert(point, payload);
        self.extents.add(point);
    }

    pub fn insert_map(&mut self, other: &PointMap<Payload>) {
        for (point, payload) in other {
            self.insert(&point, *payload);
        }
    }

    /// Remove every payload at `point` from both structures
    pub fn erase(&mut self, point: &Point3d) -> usize {
        for payload in self.points.find(point) {
            if let Some(partition) = self.partitions.get_mut(&payload.id) {
                partition.erase(point);
                if partition.is_empty() {
                    self.partitions.remove(&payload.id);
                }
            }
        }
        self.points.erase(point)
    }

    pub fn erase_map<U>(&mut self, other: &PointMap<U>) -> usize {
        other.keys().map(|point| self.erase(&point)).sum()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.partitions.clear();
        self.extents = Extents3d::new();
    }

    /// Move every payload at `point` whose id differs from `id` into partition `id`
    ///
    /// Returns the number of payloads changed; relabeling to the current id changes
    /// nothing.
    pub fn relabel(&mut self, point: &Point3d, id: u32) -> usize {
        self.relabel_with(point, id, |_| {})
    }

    /// As [`PartitionedIndex::relabel`], calling `on_change` with each payload after its
    /// id has been updated
    pub fn relabel_with<F>(&mut self, point: &Point3d, id: u32, mut on_change: F) -> usize
    where
        F: FnMut(&Payload),
    {
        let mut count = 0;
        for payload in self.points.find_mut(point) {
            if payload.id == id {
                continue;
            }
            if let Some(partition) = self.partitions.get_mut(&payload.id) {
                remove_payload(partition, point, payload.index);
                if partition.is_empty() {
                    self.partitions.remove(&payload.id);
                }
            }
            payload.id = id;
            self.partitions.entry(id).or_default().insert(point, *payload);
            on_change(payload);
            count += 1;
        }
        count
    }

    /// Relabel every coordinate present in `selection`
    pub fn relabel_map<U, F>(&mut self, selection: &PointMap<U>, id: u32, mut on_change: F) -> usize
    where
        F: FnMut(&Payload),
    {
        selection
            .keys()
            .map(|point| self.relabel_with(&point, id, &mut on_change))
            .sum()
    }

    /// Converge coordinates holding payloads with different ids onto one id
    ///
    /// At each coordinate the payload with the lowest source index keeps its id and the
    /// others take it.
    pub fn deduplicate<F>(&mut self, mut on_change: F) -> usize
    where
        F: FnMut(&Payload),
    {
        let targets: Vec<(Point3d, u32)> = self
            .points
            .keys()
            .filter_map(|point| {
                let payloads = self.points.find(&point);
                let first = payloads.iter().min_by_key(|payload| payload.index)?;
                payloads
                    .iter()
                    .any(|payload| payload.id != first.id)
                    .then_some((point, first.id))
            })
            .collect();
        targets
            .iter()
            .map(|(point, id)| self.relabel_with(point, *id, &mut on_change))
            .sum()
    }
}

/// Remove the payload with source `index` at `point`, keeping any others there
fn remove_payload(map: &mut PointMap<Payload>, point: &Point3d, index: usize) {
    let remaining: Vec<Payload> = map
        .find(point)
        .iter()
        .copied()
        .filter(|payload| payload.index != index)
        .collect();
    map.erase(point);
    for payload in remaining {
        map.insert(point, payload);
    }
}

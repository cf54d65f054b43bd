//! Multidimensional point map: exact and range lookup of payloads keyed by 3D coordinate
//!
//! The map is a tree of ordered maps, one level per axis: the outer level is keyed by
//! `x`, the middle by `y` and the innermost level maps `z` to every payload stored at
//! that exact coordinate. Several payloads may share one coordinate (the same point
//! can appear in more than one record), and lookups return all of them.
//!
//! Coordinates are compared exactly, through [`OrderedFloat`]; there is no tolerance.
//! Empty levels are pruned on erase, so emptiness checks and traversal never see dead
//! branches.
//!
//! Payloads can be modified in place through [`PointMap::find_mut`]. The coordinate is
//! the key and is not reachable that way; moving a payload to another coordinate takes
//! an erase followed by an insert.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::iter::FusedIterator;
use std::slice;

use ordered_float::OrderedFloat;

use crate::point::Point3d;

type Key = OrderedFloat<f64>;
type ZLevel<T> = BTreeMap<Key, Vec<T>>;
type YLevel<T> = BTreeMap<Key, ZLevel<T>>;

fn key(v: f64) -> Key {
    OrderedFloat(v)
}

/// Ordered map from 3D coordinates to one or more payloads per coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct PointMap<T> {
    xs: BTreeMap<Key, YLevel<T>>,
}

impl<T> PointMap<T> {
    /// Create a new empty map
    pub fn new() -> Self {
        Self { xs: BTreeMap::new() }
    }

    /// Store `payload` at `point`; duplicate coordinates are kept side by side
    pub fn insert(&mut self, point: &Point3d, payload: T) {
        self.xs
            .entry(key(point.x))
            .or_default()
            .entry(key(point.y))
            .or_default()
            .entry(key(point.z))
            .or_default()
            .push(payload);
    }

    /// All payloads stored exactly at `point`, in insertion order; empty if absent
    pub fn find(&self, point: &Point3d) -> &[T] {
        self.xs
            .get(&key(point.x))
            .and_then(|ys| ys.get(&key(point.y)))
            .and_then(|zs| zs.get(&key(point.z)))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Mutable access to the payloads at `point`
    pub fn find_mut(&mut self, point: &Point3d) -> &mut [T] {
        self.xs
            .get_mut(&key(point.x))
            .and_then(|ys| ys.get_mut(&key(point.y)))
            .and_then(|zs| zs.get_mut(&key(point.z)))
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, point: &Point3d) -> bool {
        !self.find(point).is_empty()
    }

    /// Remove every payload at `point`, returning how many were removed
    pub fn erase(&mut self, point: &Point3d) -> usize {
        let (x, y, z) = (key(point.x), key(point.y), key(point.z));
        let Some(ys) = self.xs.get_mut(&x) else {
            return 0;
        };
        let Some(zs) = ys.get_mut(&y) else {
            return 0;
        };
        let removed = zs.remove(&z).map_or(0, |payloads| payloads.len());
        if zs.is_empty() {
            ys.remove(&y);
        }
        if ys.is_empty() {
            self.xs.remove(&x);
        }
        removed
    }

    /// Erase every coordinate present in `other`, whatever its payloads
    pub fn erase_map<U>(&mut self, other: &PointMap<U>) -> usize {
        other.keys().map(|p| self.erase(&p)).sum()
    }

    /// Total number of payloads; walks the whole tree
    pub fn size(&self) -> usize {
        self.xs
            .values()
            .flat_map(|ys| ys.values())
            .flat_map(|zs| zs.values())
            .map(Vec::len)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn clear(&mut self) {
        self.xs.clear();
    }

    /// Enumerate `(point, payload)` in coordinate order: by `x`, then `y`, then `z`
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            xs: self.xs.iter(),
            ys: None,
            zs: None,
            values: None,
        }
    }

    /// Distinct coordinates in map order
    pub fn keys(&self) -> impl Iterator<Item = Point3d> + '_ {
        self.xs.iter().flat_map(|(x, ys)| {
            ys.iter().flat_map(move |(y, zs)| {
                zs.keys().map(move |z| Point3d::new(x.0, y.0, z.0))
            })
        })
    }
}

impl<T: Clone> PointMap<T> {
    /// Merge every `(point, payload)` of `other` into this map
    pub fn insert_map(&mut self, other: &PointMap<T>) {
        for (point, payload) in other {
            self.insert(&point, payload.clone());
        }
    }

    /// Owned copy of all entries with `lower[i] <= p[i] <= upper[i]` on every axis
    ///
    /// A box with `upper < lower` on any axis is empty.
    pub fn find_range(&self, lower: &Point3d, upper: &Point3d) -> PointMap<T> {
        let mut result = PointMap::new();
        if (0..3).any(|i| key(upper[i]) < key(lower[i])) {
            return result;
        }
        for (x, ys) in self.xs.range(key(lower.x)..=key(upper.x)) {
            let mut out_ys = YLevel::new();
            for (y, zs) in ys.range(key(lower.y)..=key(upper.y)) {
                let out_zs: ZLevel<T> = zs
                    .range(key(lower.z)..=key(upper.z))
                    .map(|(z, payloads)| (*z, payloads.clone()))
                    .collect();
                if !out_zs.is_empty() {
                    out_ys.insert(*y, out_zs);
                }
            }
            if !out_ys.is_empty() {
                result.xs.insert(*x, out_ys);
            }
        }
        result
    }
}

impl<T> Default for PointMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<(Point3d, T)> for PointMap<T> {
    fn extend<I: IntoIterator<Item = (Point3d, T)>>(&mut self, iter: I) {
        for (point, payload) in iter {
            self.insert(&point, payload);
        }
    }
}

impl<T> FromIterator<(Point3d, T)> for PointMap<T> {
    fn from_iter<I: IntoIterator<Item = (Point3d, T)>>(iter: I) -> Self {
        let mut map = PointMap::new();
        map.extend(iter);
        map
    }
}

impl<'a, T> IntoIterator for &'a PointMap<T> {
    type Item = (Point3d, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Display> fmt::Display for PointMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[3]: size = {}:", self.xs.len())?;
        for (x, ys) in &self.xs {
            writeln!(f, "    {}:", x)?;
            writeln!(f, "        [2]: size = {}:", ys.len())?;
            for (y, zs) in ys {
                writeln!(f, "            {}:", y)?;
                for (z, payloads) in zs {
                    for payload in payloads {
                        writeln!(f, "                {}:{}", z, payload)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Lazy enumerator over a [`PointMap`]; `None` marks the end
pub struct Iter<'a, T> {
    xs: btree_map::Iter<'a, Key, YLevel<T>>,
    ys: Option<(Key, btree_map::Iter<'a, Key, ZLevel<T>>)>,
    zs: Option<(Key, Key, btree_map::Iter<'a, Key, Vec<T>>)>,
    values: Option<(Point3d, slice::Iter<'a, T>)>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Point3d, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((point, values)) = &mut self.values {
                if let Some(payload) = values.next() {
                    return Some((*point, payload));
                }
                self.values = None;
            }
            if let Some((x, y, zs)) = &mut self.zs {
                if let Some((z, payloads)) = zs.next() {
                    let point = Point3d::new(x.0, y.0, z.0);
                    self.values = Some((point, payloads.iter()));
                    continue;
                }
                self.zs = None;
            }
            if let Some((x, ys)) = &mut self.ys {
                if let Some((y, zs)) = ys.next() {
                    let x = *x;
                    self.zs = Some((x, *y, zs.iter()));
                    continue;
                }
                self.ys = None;
            }
            let (x, ys) = self.xs.next()?;
            self.ys = Some((*x, ys.iter()));
        }
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

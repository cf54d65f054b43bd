//! Running axis-aligned bounding box over points of a fixed dimension

use std::fmt;
use std::ops::{Add, Sub};

use nalgebra::{Point, SVector, Scalar};

/// Axis-aligned bounding box accumulator
///
/// Undefined until the first point or box is added; afterwards it only ever grows.
/// `size()` counts the points folded in, not the volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Extents<T: Scalar, const D: usize> {
    bounds: Option<(Point<T, D>, Point<T, D>)>,
    size: usize,
}

/// Extents over double precision 3D points
pub type Extents3d = Extents<f64, 3>;

/// Extents over single precision 3D points
pub type Extents3f = Extents<f32, 3>;

impl<T, const D: usize> Extents<T, D>
where
    T: Scalar + Copy + PartialOrd,
{
    pub fn new() -> Self {
        Self { bounds: None, size: 0 }
    }

    /// Extents spanning `min` and `max`, counted as two points
    pub fn from_min_max(min: Point<T, D>, max: Point<T, D>) -> Self {
        let mut e = Self::new();
        e.add(&min);
        e.add(&max);
        e
    }

    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point<T, D>>,
        T: 'a,
    {
        let mut e = Self::new();
        for p in points {
            e.add(p);
        }
        e
    }

    /// Widen the box to include `p`
    pub fn add(&mut self, p: &Point<T, D>) {
        if let Some((min, max)) = self.bounds.as_mut() {
            for i in 0..D {
                if p[i] < min[i] {
                    min[i] = p[i];
                }
                if max[i] < p[i] {
                    max[i] = p[i];
                }
            }
        } else {
            self.bounds = Some((*p, *p));
        }
        self.size += 1;
    }

    /// Widen the box to include `other`; point counts are summed
    pub fn add_extents(&mut self, other: &Self) {
        if let Some((min, max)) = &other.bounds {
            let size = self.size;
            self.add(min);
            self.add(max);
            self.size = size;
        }
        self.size += other.size;
    }

    pub fn bounds(&self) -> Option<(&Point<T, D>, &Point<T, D>)> {
        self.bounds.as_ref().map(|(min, max)| (min, max))
    }

    /// # Panics
    ///
    /// Panics if nothing has been added yet.
    pub fn min(&self) -> &Point<T, D> {
        match &self.bounds {
            Some((min, _)) => min,
            None => panic!("empty extents"),
        }
    }

    /// # Panics
    ///
    /// Panics if nothing has been added yet.
    pub fn max(&self) -> &Point<T, D> {
        match &self.bounds {
            Some((_, max)) => max,
            None => panic!("empty extents"),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// True if adding `p` would leave min and max unchanged
    pub fn has(&self, p: &Point<T, D>) -> bool {
        let Some((min, max)) = &self.bounds else {
            return false;
        };
        let mut e = self.clone();
        e.add(p);
        e.min() == min && e.max() == max
    }
}

impl<T, const D: usize> Extents<T, D>
where
    T: Scalar + Copy + PartialOrd + Add<Output = T> + Sub<Output = T>,
{
    /// `max - min` per axis, `None` when empty
    pub fn box_size(&self) -> Option<SVector<T, D>> {
        self.bounds
            .as_ref()
            .map(|(min, max)| SVector::from_fn(|i, _| max[i] - min[i]))
    }

    /// Box around `centre` reaching `radius[i]` along each axis
    pub fn around(centre: &Point<T, D>, radius: &SVector<T, D>) -> Self {
        let lower = Point::from(SVector::from_fn(|i, _| centre[i] - radius[i]));
        let upper = Point::from(SVector::from_fn(|i, _| centre[i] + radius[i]));
        Self::from_min_max(lower, upper)
    }

    /// A copy grown by `margin` on every side
    pub fn expanded(&self, margin: T) -> Self {
        match &self.bounds {
            None => self.clone(),
            Some((min, max)) => {
                let lower = Point::from(SVector::from_fn(|i, _| min[i] - margin));
                let upper = Point::from(SVector::from_fn(|i, _| max[i] + margin));
                let mut e = Self::from_min_max(lower, upper);
                e.size = self.size;
                e
            }
        }
    }
}

impl<T, const D: usize> Default for Extents<T, D>
where
    T: Scalar + Copy + PartialOrd,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const D: usize> fmt::Display for Extents<T, D>
where
    T: Scalar + Copy + PartialOrd + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bounds {
            None => write!(f, "<empty>"),
            Some((min, max)) => {
                let join = |p: &Point<T, D>| {
                    p.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
                };
                write!(f, "{},{}", join(min), join(max))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{Point3d, Vector3d};

    #[test]
    fn test_first_point_sets_both_corners() {
        let mut e = Extents3d::new();
        assert!(e.is_empty());
        e.add(&Point3d::new(1.0, 2.0, 3.0));
        assert_eq!(e.min(), &Point3d::new(1.0, 2.0, 3.0));
        assert_eq!(e.max(), &Point3d::new(1.0, 2.0, 3.0));
        assert_eq!(e.size(), 1);
    }

    #[test]
    fn test_axes_widen_independently() {
        let mut e = Extents3d::new();
        e.add(&Point3d::new(0.0, 0.0, 0.0));
        e.add(&Point3d::new(-1.0, 5.0, 2.0));
        assert_eq!(e.min(), &Point3d::new(-1.0, 0.0, 0.0));
        assert_eq!(e.max(), &Point3d::new(0.0, 5.0, 2.0));

        // one point both lowering and raising different axes
        e.add(&Point3d::new(3.0, -2.0, 1.0));
        assert_eq!(e.min(), &Point3d::new(-1.0, -2.0, 0.0));
        assert_eq!(e.max(), &Point3d::new(3.0, 5.0, 2.0));
    }

    #[test]
    #[should_panic(expected = "empty extents")]
    fn test_min_of_empty_panics() {
        Extents3d::new().min();
    }

    #[test]
    fn test_has() {
        let e = Extents3d::from_min_max(Point3d::new(0.0, 0.0, 0.0), Point3d::new(1.0, 1.0, 1.0));
        assert!(e.has(&Point3d::new(0.5, 0.5, 0.5)));
        assert!(e.has(&Point3d::new(1.0, 0.0, 1.0)));
        assert!(!e.has(&Point3d::new(1.5, 0.5, 0.5)));
        assert!(!Extents3d::new().has(&Point3d::origin()));
    }

    #[test]
    fn test_add_extents_sums_counts() {
        let mut a = Extents3d::from_points(&[Point3d::new(0.0, 0.0, 0.0), Point3d::new(1.0, 1.0, 1.0)]);
        let b = Extents3d::from_points(&[
            Point3d::new(2.0, -1.0, 0.5),
            Point3d::new(2.5, 0.0, 0.5),
            Point3d::new(2.0, 0.0, 0.5),
        ]);
        a.add_extents(&b);
        assert_eq!(a.size(), 5);
        assert_eq!(a.min(), &Point3d::new(0.0, -1.0, 0.0));
        assert_eq!(a.max(), &Point3d::new(2.5, 1.0, 1.0));

        a.add_extents(&Extents3d::new());
        assert_eq!(a.size(), 5);
    }

    #[test]
    fn test_around_and_box_size() {
        let e = Extents3d::around(&Point3d::new(1.0, 1.0, 1.0), &Vector3d::new(1.0, 2.0, 0.5));
        assert_eq!(e.min(), &Point3d::new(0.0, -1.0, 0.5));
        assert_eq!(e.box_size().unwrap(), Vector3d::new(2.0, 4.0, 1.0));
        let grown = e.expanded(10.0);
        assert_eq!(grown.min(), &Point3d::new(-10.0, -11.0, -9.5));
    }
}

//! Point types and related functionality

use std::fmt;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use bytemuck::{Pod, Zeroable};

use crate::colour::Colour;

/// A 3D point with floating point coordinates, used for vertex upload
pub type Point3f = Point3<f32>;

/// A 3D point with double precision coordinates, used as the lookup key
pub type Point3d = Point3<f64>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Value stored for every point of a labeled cloud
///
/// `index` is the position of the originating record in its source, so that
/// persisted output keeps file order regardless of map order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payload {
    pub id: u32,
    pub index: usize,
}

impl Payload {
    pub fn new(id: u32, index: usize) -> Self {
        Self { id, index }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id {} (line {})", self.id, self.index)
    }
}

/// A vertex as handed to the renderer: position relative to the view offset plus colour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct ColouredVertex {
    pub position: Point3f,
    pub colour: Colour,
}

unsafe impl Pod for ColouredVertex {}
unsafe impl Zeroable for ColouredVertex {}

impl Default for ColouredVertex {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            colour: Colour::WHITE,
        }
    }
}

/// Convert a world coordinate to a render position relative to `offset`
pub fn to_render_position(point: &Point3d, offset: &Point3d) -> Point3f {
    let relative = point - offset;
    Point3f::new(relative.x as f32, relative.y as f32, relative.z as f32)
}

//! Core data structures for cloudlabel
//!
//! This crate provides the pieces shared by the labeling and streaming layers:
//! an exact/range point map with multiplicity, running extents, a partition-aware
//! index built on the point map, and a block-aware circular vertex buffer.

pub mod point;
pub mod point_map;
pub mod partitioned;
pub mod extents;
pub mod vertex_buffer;
pub mod colour;
pub mod error;

pub use point::*;
pub use point_map::PointMap;
pub use partitioned::*;
pub use extents::*;
pub use vertex_buffer::*;
pub use colour::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

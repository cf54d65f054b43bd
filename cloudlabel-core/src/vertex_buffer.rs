//! Block-aware circular vertex buffer for streamed points
//!
//! Storage is twice the capacity: two halves of `capacity` slots each. The producer
//! writes into one half; when the block id changes it moves to the other half, and the
//! half it left becomes the read window if the reader was still looking at the half now
//! being overwritten. Renderers draw `[index(), index() + size())` of the backing arrays.
//!
//! Block 0 is the unblocked stream: it becomes visible vertex by vertex as it fills.
//! A block larger than the capacity wraps and overwrites its own oldest vertices.

use crate::colour::Colour;
use crate::point::{ColouredVertex, Point3f};

#[derive(Debug, Clone)]
pub struct VertexBuffer {
    points: Vec<Point3f>,
    colours: Vec<Colour>,
    read_index: usize,
    write_index: usize,
    read_size: usize,
    write_size: usize,
    capacity: usize,
    block: u32,
}

impl VertexBuffer {
    /// Allocate a buffer holding at most `capacity` vertices per block
    pub fn new(capacity: usize) -> Self {
        Self {
            points: vec![Point3f::origin(); 2 * capacity],
            colours: vec![Colour::default(); 2 * capacity],
            read_index: 0,
            write_index: 0,
            read_size: 0,
            write_size: 0,
            capacity,
            block: 0,
        }
    }

    pub fn add_vertex(&mut self, point: Point3f, colour: Colour, block: u32) {
        if self.capacity == 0 {
            return;
        }
        if block != self.block {
            self.block = block;
            self.write_index = (self.write_index + self.capacity) % (2 * self.capacity);
            if self.read_index == self.write_index {
                self.read_index = (self.read_index + self.capacity) % (2 * self.capacity);
                self.read_size = self.write_size;
            }
            self.write_size = 0;
        }
        if self.write_size == self.capacity {
            self.write_size = 0;
            self.read_size = self.capacity;
        }
        let slot = self.write_index + self.write_size;
        self.points[slot] = point;
        self.colours[slot] = colour;
        self.write_size += 1;
        if block == 0 && self.read_size < self.capacity {
            self.read_size += 1;
        }
    }

    /// Both halves of the position storage
    pub fn points(&self) -> &[Point3f] {
        &self.points
    }

    /// Both halves of the colour storage
    pub fn colours(&self) -> &[Colour] {
        &self.colours
    }

    /// Length of the read window
    pub fn size(&self) -> usize {
        self.read_size
    }

    /// Start of the read window in the backing arrays
    pub fn index(&self) -> usize {
        self.read_index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.read_size == 0
    }

    /// Block currently being written
    pub fn block(&self) -> u32 {
        self.block
    }

    /// The read window as position and colour slices
    pub fn window(&self) -> (&[Point3f], &[Colour]) {
        let range = self.read_index..self.read_index + self.read_size;
        (&self.points[range.clone()], &self.colours[range])
    }

    /// The read window interleaved for upload as a single vertex array
    pub fn interleaved(&self) -> Vec<ColouredVertex> {
        let (points, colours) = self.window();
        points
            .iter()
            .zip(colours)
            .map(|(position, colour)| ColouredVertex { position: *position, colour: *colour })
            .collect()
    }

    /// Forget all vertices, keeping the allocation
    pub fn clear(&mut self) {
        self.read_index = 0;
        self.write_index = 0;
        self.read_size = 0;
        self.write_size = 0;
        self.block = 0;
    }
}

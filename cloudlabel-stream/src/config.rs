//! Reader configuration

use cloudlabel_core::ColourMode;

/// Default number of vertices kept per block
pub const DEFAULT_CAPACITY: usize = 2_000_000;

/// Configuration for a [`StreamReader`](crate::StreamReader)
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Vertex buffer capacity per block
    pub capacity: usize,
    pub colour: ColourMode,
    /// Used for the thread name and in log messages
    pub label: String,
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_colour(mut self, colour: ColourMode) -> Self {
        self.colour = colour;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            colour: ColourMode::default(),
            label: "points".to_string(),
        }
    }
}

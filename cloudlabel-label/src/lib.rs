//! Labeling for cloudlabel
//!
//! File-backed point datasets whose partition ids can be edited through picking,
//! selection and fill tools, and written back without disturbing the rest of the file.

pub mod dataset;
pub mod tools;

pub use dataset::{BasicDataset, Dataset, DatasetState};
pub use tools::{fill, pick, select_clip, select_id, select_partition, shake_colours, SelectionMode};

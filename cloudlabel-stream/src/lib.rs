//! Streaming point sources for cloudlabel
//!
//! A [`StreamReader`] reads one source (file or standard input) on its own thread,
//! inserting points into a [`SharedIndex`] that other threads can query and relabel
//! under its lock, and hands vertices to the thread that owns the reader for drawing.

pub mod config;
pub mod reader;
pub mod shared;

pub use config::{ReaderConfig, DEFAULT_CAPACITY};
pub use reader::{StreamReader, StreamVertex};
pub use shared::SharedIndex;

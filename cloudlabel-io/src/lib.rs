//! Record I/O for cloudlabel
//!
//! This crate reads delimited point records (`x,y,z,id,...`) line by line and writes
//! them back with updated partition ids, keeping every other column verbatim.

pub mod options;
pub mod record;
pub mod reader;
pub mod writer;

pub use options::{CsvOptions, Field};
pub use record::{column_spans, PointRecord, SourceLine};
pub use reader::{open_source, RecordReader};
pub use writer::RecordWriter;

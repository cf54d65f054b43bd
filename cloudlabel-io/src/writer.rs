//! Writes source lines back out with updated ids

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use cloudlabel_core::{Error, Result};

use crate::options::{CsvOptions, Field};
use crate::record::SourceLine;

/// Writes lines in the order given, replacing only the id column
pub struct RecordWriter<W: Write> {
    writer: W,
    options: CsvOptions,
    count: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, options: CsvOptions) -> Self {
        Self { writer, options, count: 0 }
    }

    /// Write a header line verbatim; not counted as a record
    pub fn write_header(&mut self, header: &str) -> Result<()> {
        writeln!(self.writer, "{}", header)?;
        Ok(())
    }

    pub fn write(&mut self, line: &SourceLine, id: u32) -> Result<()> {
        let text = line.to_line_with_id(id, &self.options)?;
        writeln!(self.writer, "{}", text)?;
        self.count += 1;
        Ok(())
    }

    /// Lines written so far
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.count)
    }
}

impl RecordWriter<BufWriter<File>> {
    /// Create or truncate `path`
    ///
    /// Fails without touching `path` if the options have no `id` field, since no line
    /// could be written.
    pub fn create<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<Self> {
        if !options.has(&Field::Id) {
            return Err(Error::InvalidData(format!(
                "cannot write {}: fields \"{}\" have no id",
                path.as_ref().display(),
                options.fields_string()
            )));
        }
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), options))
    }
}

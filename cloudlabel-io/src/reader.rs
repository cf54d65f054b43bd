//! Streaming record reader
//!
//! Records are pulled one line at a time, so a reader over a pipe only blocks for as
//! long as the producer takes to write the next line. End of input is `Ok(None)` from
//! [`RecordReader::read`] (or `None` from the iterator), never an error.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use cloudlabel_core::{Error, Result};

use crate::options::CsvOptions;
use crate::record::SourceLine;

/// Reads [`SourceLine`]s from any buffered input
pub struct RecordReader<R> {
    reader: R,
    options: CsvOptions,
    line_number: usize,
    buffer: String,
    header: Option<String>,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R, options: CsvOptions) -> Result<Self> {
        if let Some(format) = &options.binary {
            return Err(Error::Unsupported(format!("binary records ({})", format)));
        }
        Ok(Self {
            reader,
            options,
            line_number: 0,
            buffer: String::new(),
            header: None,
        })
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Number of lines consumed so far, including header and blank lines
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// The skipped header line, once it has been read
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Next record, `Ok(None)` at end of input
    pub fn read(&mut self) -> Result<Option<SourceLine>> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            if self.line_number == 1 && self.options.has_header {
                self.header = Some(self.buffer.trim_end_matches(&['\r', '\n'][..]).to_string());
                continue;
            }
            let content = self.buffer.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }
            return SourceLine::parse(&self.buffer, self.line_number, &self.options).map(Some);
        }
    }
}

impl RecordReader<BufReader<File>> {
    /// Open a file for reading
    pub fn open<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), options)
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<SourceLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

/// Open a named source for reading; `-` is standard input
pub fn open_source(name: &str) -> Result<Box<dyn BufRead + Send>> {
    if name == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        Ok(Box::new(BufReader::new(File::open(name)?)))
    }
}

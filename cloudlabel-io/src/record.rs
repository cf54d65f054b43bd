//! Point records and the source lines they were parsed from

use std::ops::Range;

use cloudlabel_core::{Colour, Error, Point3d, Result};

use crate::options::{CsvOptions, Field};

/// The interpreted content of one input line
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub point: Point3d,
    pub id: u32,
    pub block: u32,
    pub colour: Option<Colour>,
    pub scalar: f64,
    pub label: String,
}

impl PointRecord {
    pub fn new(point: Point3d) -> Self {
        Self {
            point,
            id: 0,
            block: 0,
            colour: None,
            scalar: 0.0,
            label: String::new(),
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn with_block(mut self, block: u32) -> Self {
        self.block = block;
        self
    }
}

/// A parsed record together with the line it was parsed from
///
/// The raw text and the byte range of every column are kept so that the line can be
/// written back unchanged apart from its id, padding and alignment included.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub record: PointRecord,
    raw: String,
    spans: Vec<Range<usize>>,
}

/// Byte ranges of the columns of `line`, each without surrounding whitespace
///
/// A whitespace delimiter treats any run of whitespace as one separator.
pub fn column_spans(line: &str, delimiter: char) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    if delimiter.is_whitespace() {
        let mut start = None;
        for (i, c) in line.char_indices() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    spans.push(s..i);
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push(s..line.len());
        }
    } else {
        let mut offset = 0;
        for piece in line.split(delimiter) {
            let begin = offset + piece.len() - piece.trim_start().len();
            spans.push(begin..begin + piece.trim().len());
            offset += piece.len() + delimiter.len_utf8();
        }
    }
    spans
}

impl SourceLine {
    /// Parse one line; `line_number` is only used for error messages
    pub fn parse(line: &str, line_number: usize, options: &CsvOptions) -> Result<Self> {
        let raw = line.trim_end_matches(&['\r', '\n'][..]).to_string();
        let spans = column_spans(&raw, options.delimiter);
        if spans.len() < options.fields.len() {
            return Err(Error::Parse {
                line: line_number,
                message: format!(
                    "expected {} columns ({}), got {}",
                    options.fields.len(),
                    options.fields_string(),
                    spans.len()
                ),
            });
        }

        let mut point = Point3d::origin();
        let mut record = PointRecord::new(point);
        let mut rgba: [Option<u8>; 4] = [None; 4];

        for (field, span) in options.fields.iter().zip(&spans) {
            let value = &raw[span.clone()];
            match field {
                Field::X => point.x = parse_number(value, field, line_number)?,
                Field::Y => point.y = parse_number(value, field, line_number)?,
                Field::Z => point.z = parse_number(value, field, line_number)?,
                Field::Id => record.id = parse_integer(value, field, line_number)?,
                Field::Block => record.block = parse_integer(value, field, line_number)?,
                Field::Red => rgba[0] = Some(parse_channel(value, field, line_number)?),
                Field::Green => rgba[1] = Some(parse_channel(value, field, line_number)?),
                Field::Blue => rgba[2] = Some(parse_channel(value, field, line_number)?),
                Field::Alpha => rgba[3] = Some(parse_channel(value, field, line_number)?),
                Field::Scalar => record.scalar = parse_number(value, field, line_number)?,
                Field::Label => record.label = value.to_string(),
                Field::Other(_) => {}
            }
        }

        record.point = point;
        if rgba[..3].iter().any(Option::is_some) {
            record.colour = Some(Colour::rgba(
                rgba[0].unwrap_or(0),
                rgba[1].unwrap_or(0),
                rgba[2].unwrap_or(0),
                rgba[3].unwrap_or(255),
            ));
        }
        Ok(Self { record, raw, spans })
    }

    /// The line as read, without its line terminator
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Column `i` without surrounding whitespace
    pub fn column(&self, i: usize) -> Option<&str> {
        self.spans.get(i).map(|span| &self.raw[span.clone()])
    }

    pub fn column_count(&self) -> usize {
        self.spans.len()
    }

    /// The original line with its id column replaced by `id`
    ///
    /// Everything outside the id column, delimiters and whitespace included, is copied
    /// as read. Fails if the options have no `id` field.
    pub fn to_line_with_id(&self, id: u32, options: &CsvOptions) -> Result<String> {
        let column = options
            .column(&Field::Id)
            .ok_or_else(|| Error::InvalidData(format!("fields \"{}\" have no id", options.fields_string())))?;
        let span = self.spans.get(column).ok_or_else(|| {
            Error::InvalidData(format!("line \"{}\" has no column {}", self.raw, column))
        })?;
        let mut line = String::with_capacity(self.raw.len());
        line.push_str(&self.raw[..span.start]);
        line.push_str(&id.to_string());
        line.push_str(&self.raw[span.end..]);
        Ok(line)
    }
}

fn parse_number(value: &str, field: &Field, line: usize) -> Result<f64> {
    value.parse::<f64>().map_err(|_| Error::Parse {
        line,
        message: format!("invalid {} \"{}\"", field.name(), value),
    })
}

fn parse_integer(value: &str, field: &Field, line: usize) -> Result<u32> {
    value.parse::<u32>().map_err(|_| Error::Parse {
        line,
        message: format!("invalid {} \"{}\"", field.name(), value),
    })
}

fn parse_channel(value: &str, field: &Field, line: usize) -> Result<u8> {
    let v = parse_number(value, field, line)?;
    Ok(v.clamp(0.0, 255.0) as u8)
}

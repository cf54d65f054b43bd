//! Field layout and delimiter of a point record stream
//!
//! Fields are named in a comma separated list such as `x,y,z,id`. Recognised names:
//! - `x`, `y`, `z` (required), or `point` as shorthand for all three
//! - `id`: partition label
//! - `block`: producer-defined block number for streamed rendering
//! - `r`, `g`, `b`, `a` (also `red`, `green`, ...): per-point colour
//! - `scalar`: value for colour ramps
//! - `label`: free text
//!
//! Any other name (including an empty one) is a column that is carried but not
//! interpreted.

use cloudlabel_core::{Error, Result};

/// Meaning of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    X,
    Y,
    Z,
    Id,
    Block,
    Red,
    Green,
    Blue,
    Alpha,
    Scalar,
    Label,
    Other(String),
}

impl Field {
    /// Parse a single field name
    pub fn from_name(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "x" | "point/x" => Field::X,
            "y" | "point/y" => Field::Y,
            "z" | "point/z" => Field::Z,
            "id" => Field::Id,
            "block" => Field::Block,
            "r" | "red" | "colour/r" | "color/r" => Field::Red,
            "g" | "green" | "colour/g" | "color/g" => Field::Green,
            "b" | "blue" | "colour/b" | "color/b" => Field::Blue,
            "a" | "alpha" | "colour/a" | "color/a" => Field::Alpha,
            "scalar" => Field::Scalar,
            "label" => Field::Label,
            _ => Field::Other(name.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Field::X => "x",
            Field::Y => "y",
            Field::Z => "z",
            Field::Id => "id",
            Field::Block => "block",
            Field::Red => "r",
            Field::Green => "g",
            Field::Blue => "b",
            Field::Alpha => "a",
            Field::Scalar => "scalar",
            Field::Label => "label",
            Field::Other(name) => name,
        }
    }
}

/// How to split and interpret the lines of a source
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    pub fields: Vec<Field>,
    pub delimiter: char,
    pub has_header: bool,
    /// Binary record format, e.g. `3d,ui`; not supported by the readers
    pub binary: Option<String>,
}

impl CsvOptions {
    /// Options for the given field list, comma delimited, no header
    pub fn new(fields: &str) -> Result<Self> {
        let mut parsed = Vec::new();
        for name in fields.split(',') {
            if name.trim().eq_ignore_ascii_case("point") {
                parsed.extend([Field::X, Field::Y, Field::Z]);
            } else {
                parsed.push(Field::from_name(name));
            }
        }
        for required in [Field::X, Field::Y, Field::Z] {
            if !parsed.contains(&required) {
                return Err(Error::InvalidData(format!(
                    "fields \"{}\" do not contain {}",
                    fields,
                    required.name()
                )));
            }
        }
        Ok(Self {
            fields: parsed,
            delimiter: ',',
            has_header: false,
            binary: None,
        })
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_binary(mut self, format: impl Into<String>) -> Self {
        self.binary = Some(format.into());
        self
    }

    pub fn is_binary(&self) -> bool {
        self.binary.is_some()
    }

    /// Column index of `field`, if present
    pub fn column(&self, field: &Field) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    pub fn has(&self, field: &Field) -> bool {
        self.column(field).is_some()
    }

    /// Field list in the form accepted by [`CsvOptions::new`]
    pub fn fields_string(&self) -> String {
        self.fields.iter().map(Field::name).collect::<Vec<_>>().join(",")
    }
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            fields: vec![Field::X, Field::Y, Field::Z],
            delimiter: ',',
            has_header: false,
            binary: None,
        }
    }
}

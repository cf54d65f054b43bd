//! Error types for cloudlabel

use thiserror::Error;

/// Main error type for cloudlabel operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Result type alias for cloudlabel operations
pub type Result<T> = std::result::Result<T, Error>;

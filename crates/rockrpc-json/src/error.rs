use std::fmt;

use thiserror::Error;

/// Direction of a type conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// JSON text to native value
    Import,
    /// Native value to JSON text
    Export,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Import => f.write_str("import"),
            Direction::Export => f.write_str("export"),
        }
    }
}

/// Errors raised by the reader, the writer and the conversion registries
#[derive(Debug, Error)]
pub enum JsonError {
    /// Malformed JSON text
    #[error("{message} (line {line}, column {column})")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    /// Reader/writer protocol misuse: wrong token expected, bracket mismatch,
    /// writing past the end of the document
    #[error("Structural error: {0}")]
    Structural(String),

    #[error("No {direction} converter available for type {type_name}")]
    NoConverter {
        type_name: &'static str,
        direction: Direction,
    },

    #[error("Import error: {0}")]
    Import(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Formatting error")]
    Fmt(#[from] fmt::Error),
}

impl JsonError {
    pub fn structural(message: impl Into<String>) -> Self {
        JsonError::Structural(message.into())
    }

    pub fn import(message: impl Into<String>) -> Self {
        JsonError::Import(message.into())
    }

    pub fn export(message: impl Into<String>) -> Self {
        JsonError::Export(message.into())
    }

    /// True for malformed input, as opposed to misuse or conversion failures
    pub fn is_parse(&self) -> bool {
        matches!(self, JsonError::Parse { .. })
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, JsonError::Structural(_))
    }
}

/// Result alias used throughout the JSON engine
pub type JsonResult<T> = Result<T, JsonError>;

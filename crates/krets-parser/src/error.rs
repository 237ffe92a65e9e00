//! Error types for krets-parser.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error at line {line}, column {column}: {message}")]
    ParseError {
        line: usize,
        column: usize,
        message: String,
    },
}

impl Error {
    pub(crate) fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Error::ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Source line of the error (1-based).
    pub fn line(&self) -> usize {
        match self {
            Error::ParseError { line, .. } => *line,
        }
    }

    /// Source column of the error (1-based).
    pub fn column(&self) -> usize {
        match self {
            Error::ParseError { column, .. } => *column,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

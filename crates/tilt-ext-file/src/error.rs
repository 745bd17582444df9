//! Error types for file-backed sources and writers.

use std::path::Path;

use thiserror::Error;
use tilt_core::CoreError;

/// A specialized Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

/// The error type for file operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FileError {
    /// A required file does not exist.
    #[error("File not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },

    /// Reading or writing failed.
    #[error("I/O error on '{path}': {reason}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying failure.
        reason: String,
    },

    /// A record could not be parsed.
    #[error("Malformed record in '{path}' at line {line}: {reason}")]
    Parse {
        /// File involved.
        path: String,
        /// One-based line number, 0 when unknown.
        line: u64,
        /// What was wrong.
        reason: String,
    },
}

impl FileError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(path: &Path) -> Self {
        Self::NotFound {
            path: path.display().to_string(),
        }
    }

    /// Creates an I/O error.
    #[must_use]
    pub fn io(path: &Path, reason: impl ToString) -> Self {
        Self::Io {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(path: &Path, line: u64, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.display().to_string(),
            line,
            reason: reason.into(),
        }
    }

    /// Maps a `csv` error, keeping its line number when it has one.
    #[must_use]
    pub fn from_csv(path: &Path, err: &csv::Error) -> Self {
        match err.position() {
            Some(pos) => Self::parse(path, pos.line(), err.to_string()),
            None if err.is_io_error() => Self::io(path, err),
            None => Self::parse(path, 0, err.to_string()),
        }
    }
}

impl From<FileError> for CoreError {
    fn from(err: FileError) -> Self {
        let path = match &err {
            FileError::NotFound { path }
            | FileError::Io { path, .. }
            | FileError::Parse { path, .. } => path.clone(),
        };
        CoreError::data_source(path, err.to_string())
    }
}

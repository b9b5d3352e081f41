//! Error handling for the reconciliation pipeline.

pub mod util;

use std::io;
use std::path::{Path, PathBuf};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Specialized error type for pipeline operations
#[derive(Debug, Error)]
pub enum ReconError {
    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    ParquetError(#[from] ParquetError),

    /// Error raised by an Arrow compute kernel
    #[error("Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    /// Error writing delimited output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error parsing a JSON configuration file
    #[error("Config parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An expected column is absent or has an unusable type
    #[error("Schema error in table '{table}': {message}")]
    SchemaError { table: String, message: String },

    /// Join keys have incompatible types on the two sides
    #[error("Join key type mismatch on '{left}' = '{right}': {left_type} vs {right_type}")]
    KeyTypeMismatch {
        left: String,
        right: String,
        left_type: String,
        right_type: String,
    },

    /// Join key values do not have the required representation
    #[error("Join key format error in {table}.{column}: {invalid} value(s) {expected} (e.g. {sample:?})")]
    KeyFormatError {
        table: String,
        column: String,
        expected: String,
        invalid: usize,
        sample: String,
    },

    /// A classification table or rule set is malformed
    #[error("Rule error: {0}")]
    RuleError(String),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    ConfigError(String),

    /// No job is registered under the requested name
    #[error("Unknown job: {0}")]
    UnknownJob(String),

    /// Wraps another error with the path it concerns
    #[error("{source} (path: {shown})", shown = .path.display())]
    WithPath {
        path: PathBuf,
        #[source]
        source: Box<ReconError>,
    },
}

impl ReconError {
    /// Create a schema error for a table
    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaError {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a schema error for a missing column
    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::schema(table, format!("expected column '{column}' is absent"))
    }

    /// Attach a path to this error
    #[must_use]
    pub fn with_path(self, path: impl AsRef<Path>) -> Self {
        Self::WithPath {
            path: path.as_ref().to_path_buf(),
            source: Box::new(self),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ReconError>;

/// Extension trait for attaching a path to any convertible error
pub trait PathContext<T> {
    /// Convert the error and attach the given path
    fn with_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T, E: Into<ReconError>> PathContext<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| e.into().with_path(path))
    }
}

//! Error types for the loader.
//!
//! Schema and table-load failures are fatal to a batch. Index failures and
//! row-count mismatches are reported and the batch carries on.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// A table could not be created.
#[derive(Debug, Error)]
#[error("failed to create table {table}: {source}")]
pub struct SchemaError {
    pub table: String,
    #[source]
    pub source: rusqlite::Error,
}

/// A single CSV record that cannot become a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("column {column}: {value:?} is not an integer")]
    NotInteger { column: &'static str, value: String },

    #[error("column {column} is required but empty")]
    MissingValue { column: &'static str },

    #[error("column {column}: value has {len} characters, limit is {max}")]
    TooLong {
        column: &'static str,
        len: usize,
        max: usize,
    },

    #[error("record is not valid UTF-8")]
    InvalidUtf8,
}

/// Why a table load failed.
#[derive(Debug, Error)]
pub enum LoadCause {
    #[error("CSV file not found")]
    MissingFile,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("header has {found} columns, expected {expected}")]
    HeaderMismatch { expected: usize, found: usize },

    #[error("line {line}: {error}")]
    Row { line: u64, error: RowError },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("storage rejected row at line {line}: {source}")]
    Rejected {
        line: u64,
        #[source]
        source: rusqlite::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// A specific table failed to ingest.
#[derive(Debug, Error)]
#[error("failed to load table {table} from {}: {cause}", .path.display())]
pub struct LoadError {
    pub table: String,
    pub path: PathBuf,
    #[source]
    pub cause: LoadCause,
}

impl LoadError {
    pub fn new(table: impl Into<String>, path: impl Into<PathBuf>, cause: impl Into<LoadCause>) -> Self {
        Self {
            table: table.into(),
            path: path.into(),
            cause: cause.into(),
        }
    }

    pub fn is_missing_file(&self) -> bool {
        matches!(self.cause, LoadCause::MissingFile)
    }
}

/// A secondary index could not be built. Never fatal.
#[derive(Debug, Error)]
#[error("failed to create index {index} on {table}: {source}")]
pub struct IndexError {
    pub index: String,
    pub table: String,
    #[source]
    pub source: rusqlite::Error,
}

/// Row count differs from the expected count for a table. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationWarning {
    pub table: String,
    pub expected: u64,
    /// `None` when the table does not exist in the database
    pub actual: Option<u64>,
}

impl fmt::Display for VerificationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.actual {
            Some(actual) => write!(
                f,
                "{}: expected {} rows, found {}",
                self.table, self.expected, actual
            ),
            None => write!(
                f,
                "{}: expected {} rows, table is missing",
                self.table, self.expected
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_names_table_and_path() {
        let err = LoadError::new("keyword", "/data/keyword.csv", LoadCause::MissingFile);
        let msg = err.to_string();
        assert!(msg.contains("keyword"));
        assert!(msg.contains("/data/keyword.csv"));
        assert!(err.is_missing_file());
    }

    #[test]
    fn test_verification_warning_display() {
        let warning = VerificationWarning {
            table: "title".to_string(),
            expected: 10,
            actual: Some(9),
        };
        assert_eq!(warning.to_string(), "title: expected 10 rows, found 9");
    }
}

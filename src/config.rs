use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::{TableSchema, JOB_ROW_COUNTS};

/// Default output database file name
pub const DEFAULT_DB: &str = "imdbload.db";

/// What to do with a record that cannot become a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Fail the table on the first bad record
    #[default]
    Strict,
    /// Skip bad records and count them
    IgnoreRowErrors,
}

/// CSV dialect of the input files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
    pub quote: u8,
    /// `None` disables backslash-style escapes; doubled quotes are always accepted
    pub escape: Option<u8>,
    pub error_policy: ErrorPolicy,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            quote: b'"',
            escape: Some(b'\\'),
            error_policy: ErrorPolicy::Strict,
        }
    }
}

impl CsvOptions {
    /// Build a `csv` reader configured for this dialect
    pub fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(self.escape)
            .double_quote(true)
            .has_headers(false)
            .flexible(true);
        builder
    }
}

/// Expected row count per table
pub type RowCounts = BTreeMap<String, u64>;

/// Everything one load run needs, passed explicitly through the pipeline
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub data_dir: PathBuf,
    pub output_db: PathBuf,
    pub tables: Vec<&'static TableSchema>,
    pub csv: CsvOptions,
    pub build_indexes: bool,
    pub refresh_statistics: bool,
    pub expected_counts: Option<RowCounts>,
}

impl LoaderConfig {
    pub fn new(data_dir: impl Into<PathBuf>, output_db: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_db: output_db.into(),
            tables: crate::schema::ALL_TABLES.to_vec(),
            csv: CsvOptions::default(),
            build_indexes: true,
            refresh_statistics: true,
            expected_counts: None,
        }
    }
}

/// Parse a single ASCII character CLI argument (delimiter, quote, escape)
pub fn parse_ascii_char(s: &str) -> Result<u8> {
    let unescaped = match s {
        "\\t" => "\t",
        other => other,
    };
    let bytes = unescaped.as_bytes();
    if bytes.len() != 1 || !bytes[0].is_ascii() {
        bail!("expected a single ASCII character, got {:?}", s);
    }
    Ok(bytes[0])
}

/// Read expected row counts from a JSON object `{"table": count}`
pub fn read_expected_counts(path: &Path) -> Result<RowCounts> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read expected counts: {:?}", path))?;
    let counts: RowCounts = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse expected counts: {:?}", path))?;
    Ok(counts)
}

/// Built-in counts of the reference JOB snapshot
pub fn job_row_counts() -> RowCounts {
    JOB_ROW_COUNTS
        .iter()
        .map(|(name, count)| (name.to_string(), *count))
        .collect()
}

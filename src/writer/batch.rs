//! Sequential batch driver: schema, per-table load, indexes, statistics and
//! verification, in that order.
//!
//! Tables are loaded one at a time on a single connection. SQLite allows one
//! writer per database, so there is nothing to gain from concurrent loads.

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use super::sqlite::{SqliteWriter, TableLoad};
use crate::config::{CsvOptions, LoaderConfig, RowCounts};
use crate::error::{LoadError, VerificationWarning};
use crate::schema::{indexes_for, TableSchema};

/// Outcome of `load_all`: which tables loaded, which were missing, and where
/// the batch stopped if it stopped early.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub loaded: Vec<TableLoad>,
    pub missing: Vec<String>,
    pub failed: Option<LoadError>,
    pub not_attempted: Vec<String>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }

    pub fn total_rows(&self) -> u64 {
        self.loaded.iter().map(|t| t.rows_loaded).sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.loaded.iter().map(|t| t.rows_skipped).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Loaded,
    Missing,
    Failed,
    NotAttempted,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableOutcome {
    pub table: String,
    pub status: TableStatus,
    pub rows_loaded: u64,
    pub rows_skipped: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Serializable summary of a full load run
#[derive(Debug, Default, Serialize)]
pub struct LoadSummary {
    pub tables: Vec<TableOutcome>,
    pub total_rows: u64,
    pub total_skipped: u64,
    pub indexes_created: usize,
    pub index_failures: Vec<String>,
    pub statistics_refreshed: bool,
    pub row_counts: RowCounts,
    pub warnings: Vec<VerificationWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub elapsed_secs: f64,
}

impl LoadSummary {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Closing line of the run, worded by outcome
    pub fn footer(&self, output_db: &Path) -> String {
        if self.is_success() {
            format!("Created {:?} in {:.1}s", output_db, self.elapsed_secs)
        } else {
            format!(
                "Load into {:?} aborted after {:.1}s",
                output_db, self.elapsed_secs
            )
        }
    }

    pub fn count(&self, status: TableStatus) -> usize {
        self.tables.iter().filter(|t| t.status == status).count()
    }

    fn from_batch(batch: &BatchReport) -> Self {
        let mut tables: Vec<TableOutcome> = batch
            .loaded
            .iter()
            .map(|t| TableOutcome {
                table: t.table.clone(),
                status: TableStatus::Loaded,
                rows_loaded: t.rows_loaded,
                rows_skipped: t.rows_skipped,
                error: None,
            })
            .collect();

        let bare = |table: &String, status| TableOutcome {
            table: table.clone(),
            status,
            rows_loaded: 0,
            rows_skipped: 0,
            error: None,
        };

        tables.extend(batch.missing.iter().map(|t| bare(t, TableStatus::Missing)));
        if let Some(err) = &batch.failed {
            tables.push(TableOutcome {
                error: Some(err.cause.to_string()),
                ..bare(&err.table, TableStatus::Failed)
            });
        }
        tables.extend(
            batch
                .not_attempted
                .iter()
                .map(|t| bare(t, TableStatus::NotAttempted)),
        );

        Self {
            tables,
            total_rows: batch.total_rows(),
            total_skipped: batch.total_skipped(),
            failure: batch.failed.as_ref().map(|e| e.to_string()),
            ..Self::default()
        }
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:30} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

/// Load every table in `tables`, in order, one at a time.
///
/// A missing CSV is recorded and skipped. The first fatal table failure stops
/// the batch; the remaining tables are reported as not attempted.
pub fn load_all(
    writer: &mut SqliteWriter,
    data_dir: &Path,
    tables: &[&TableSchema],
    options: &CsvOptions,
    multi: &MultiProgress,
) -> BatchReport {
    let mut report = BatchReport::default();
    let style = progress_style();

    for (pos, schema) in tables.iter().enumerate() {
        let csv_path = data_dir.join(schema.source_file());

        let pb = multi.add(ProgressBar::new(0));
        pb.set_style(style.clone());
        pb.set_message(schema.name.to_string());

        match writer.load_table(schema, &csv_path, options, &pb) {
            Ok(load) => {
                multi.suspend(|| {
                    info!(
                        "{}: {} rows ({} skipped) in {:.1}s",
                        load.table, load.rows_loaded, load.rows_skipped, load.elapsed_secs
                    )
                });
                report.loaded.push(load);
            }
            Err(err) if err.is_missing_file() => {
                pb.finish_with_message(format!("{}: skipped (file not found)", schema.name));
                multi.suspend(|| warn!("{}: {:?} not found, skipping", schema.name, csv_path));
                report.missing.push(schema.name.to_string());
            }
            Err(err) => {
                multi.suspend(|| error!("{}", err));
                report.not_attempted = tables[pos + 1..]
                    .iter()
                    .map(|t| t.name.to_string())
                    .collect();
                report.failed = Some(err);
                break;
            }
        }
    }

    report
}

/// Full load run: fresh database, schema, tables, indexes, statistics,
/// verification. Later stages are skipped when a table load fails.
pub fn load_to_sqlite(config: &LoaderConfig, multi: &MultiProgress) -> Result<LoadSummary> {
    let start = Instant::now();

    let mut writer = SqliteWriter::create(&config.output_db)?;
    writer
        .create_schema(&config.tables)
        .context("Failed to create schema")?;

    let batch = load_all(
        &mut writer,
        &config.data_dir,
        &config.tables,
        &config.csv,
        multi,
    );
    let mut summary = LoadSummary::from_batch(&batch);

    if batch.is_success() {
        if config.build_indexes {
            let report = writer.create_indexes(&indexes_for(&config.tables));
            summary.indexes_created = report.created.len();
            summary.index_failures = report.failed.iter().map(|e| e.to_string()).collect();
        }

        if config.refresh_statistics {
            summary.statistics_refreshed = writer.refresh_statistics();
        }

        let verification = writer
            .verify_row_counts(&config.tables, config.expected_counts.as_ref())
            .context("Failed to verify row counts")?;
        summary.row_counts = verification.counts;
        summary.warnings = verification.warnings;
    }

    summary.elapsed_secs = start.elapsed().as_secs_f64();
    Ok(summary)
}

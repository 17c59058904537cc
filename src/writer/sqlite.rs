use anyhow::{bail, Context};
use csv::ByteRecord;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use rusqlite::{Connection, ErrorCode, Transaction};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

use super::schema_gen::{
    generate_create_index, generate_create_table, generate_drop_table, generate_insert,
};
use crate::config::{CsvOptions, ErrorPolicy, RowCounts};
use crate::error::{IndexError, LoadCause, LoadError, SchemaError, VerificationWarning};
use crate::parser::{parse_record, ParsedRow};
use crate::schema::{IndexDef, TableSchema};

const BATCH_SIZE: usize = 1000;

/// Result of loading one table
#[derive(Debug, Clone, Serialize)]
pub struct TableLoad {
    pub table: String,
    pub rows_loaded: u64,
    pub rows_skipped: u64,
    pub elapsed_secs: f64,
}

/// Result of building secondary indexes
#[derive(Debug, Default)]
pub struct IndexReport {
    pub created: Vec<String>,
    pub failed: Vec<IndexError>,
}

/// Row counts per table plus any mismatches against expected counts
#[derive(Debug, Default, Serialize)]
pub struct Verification {
    pub counts: RowCounts,
    pub warnings: Vec<VerificationWarning>,
}

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    /// Create a fresh database, removing any existing file at `db_path`
    pub fn create(db_path: &Path) -> anyhow::Result<Self> {
        if db_path.exists() {
            std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        }

        let conn = Connection::open(db_path).context("Failed to create database")?;
        Self::from_connection(conn).context("Failed to configure database")
    }

    /// Open an existing database
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        if !db_path.exists() {
            bail!("Database not found: {:?}", db_path);
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;
        Self::from_connection(conn).context("Failed to configure database")
    }

    /// Wrap an already-open connection and tune it for bulk insert
    pub fn from_connection(conn: Connection) -> rusqlite::Result<Self> {
        // Reference columns are never enforced
        conn.pragma_update(None, "foreign_keys", false)?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "cache_size", -64000)?;

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create all tables for the given schemas. Fails if any table already exists.
    pub fn create_schema(&self, schemas: &[&TableSchema]) -> Result<(), SchemaError> {
        info!("Creating {} tables", schemas.len());

        for schema in schemas {
            let sql = generate_create_table(schema);
            self.conn
                .execute(&sql, [])
                .map_err(|source| SchemaError {
                    table: schema.name.to_string(),
                    source,
                })?;
        }

        Ok(())
    }

    /// Drop, recreate and bulk-load a single table from a CSV file.
    ///
    /// Rows are inserted in one transaction, so a failed load leaves the
    /// table present and empty.
    pub fn load_table(
        &mut self,
        schema: &TableSchema,
        csv_path: &Path,
        options: &CsvOptions,
        progress: &ProgressBar,
    ) -> Result<TableLoad, LoadError> {
        let start = Instant::now();
        let fail = |cause: LoadCause| LoadError::new(schema.name, csv_path, cause);

        if !csv_path.is_file() {
            return Err(fail(LoadCause::MissingFile));
        }

        let file = File::open(csv_path).map_err(|e| fail(e.into()))?;
        let file_len = file.metadata().map(|m| m.len()).unwrap_or(0);
        progress.set_length(file_len);

        let mut reader = options.reader_builder().from_reader(BufReader::new(file));

        self.recreate_table(schema).map_err(|e| fail(e.into()))?;

        let tx = self.conn.transaction().map_err(|e| fail(e.into()))?;
        let (rows_loaded, rows_skipped) =
            match insert_rows(&tx, schema, &mut reader, options, progress) {
                Ok(counts) => counts,
                Err(cause) => {
                    if let Err(e) = tx.rollback() {
                        progress.suspend(|| warn!("{}: rollback failed: {}", schema.name, e));
                    }
                    progress.abandon_with_message(format!("{}: failed", schema.name));
                    return Err(fail(cause));
                }
            };
        tx.commit().map_err(|e| fail(e.into()))?;

        progress.set_position(file_len);
        progress.finish_with_message(format!(
            "{}: {} rows ({} skipped)",
            schema.name, rows_loaded, rows_skipped
        ));

        if rows_skipped > 0 {
            progress.suspend(|| {
                warn!(
                    "{}: skipped {} malformed rows from {:?}",
                    schema.name, rows_skipped, csv_path
                )
            });
        }

        Ok(TableLoad {
            table: schema.name.to_string(),
            rows_loaded,
            rows_skipped,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    fn recreate_table(&mut self, schema: &TableSchema) -> rusqlite::Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(&generate_drop_table(schema), [])?;
        tx.execute(&generate_create_table(schema), [])?;
        tx.commit()
    }

    /// Build secondary indexes. Failures are logged and collected, never fatal.
    pub fn create_indexes(&self, indexes: &[&IndexDef]) -> IndexReport {
        info!("Creating {} indexes", indexes.len());
        let mut report = IndexReport::default();

        for index in indexes {
            let sql = generate_create_index(index);
            match self.conn.execute(&sql, []) {
                Ok(_) => {
                    debug!("created index {}", index.name);
                    report.created.push(index.name.to_string());
                }
                Err(source) => {
                    let err = IndexError {
                        index: index.name.to_string(),
                        table: index.table.to_string(),
                        source,
                    };
                    warn!("{}", err);
                    report.failed.push(err);
                }
            }
        }

        report
    }

    /// Recompute planner statistics. Advisory: returns false instead of failing.
    pub fn refresh_statistics(&self) -> bool {
        info!("Refreshing planner statistics");
        match self.conn.execute_batch("ANALYZE;") {
            Ok(()) => true,
            Err(e) => {
                warn!("Statistics refresh failed: {}", e);
                false
            }
        }
    }

    /// Count rows per table and compare against `expected` when given.
    /// Mismatches become warnings; a missing table is omitted from the counts.
    pub fn verify_row_counts(
        &self,
        tables: &[&TableSchema],
        expected: Option<&RowCounts>,
    ) -> rusqlite::Result<Verification> {
        let mut verification = Verification::default();

        for schema in tables {
            let actual = if self.table_exists(schema.name)? {
                let sql = format!("SELECT COUNT(*) FROM {}", schema.name);
                let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
                verification
                    .counts
                    .insert(schema.name.to_string(), count as u64);
                Some(count as u64)
            } else {
                None
            };

            if let Some(&want) = expected.and_then(|e| e.get(schema.name)) {
                if actual != Some(want) {
                    let warning = VerificationWarning {
                        table: schema.name.to_string(),
                        expected: want,
                        actual,
                    };
                    warn!("Row count mismatch: {}", warning);
                    verification.warnings.push(warning);
                }
            }
        }

        Ok(verification)
    }

    pub fn table_exists(&self, name: &str) -> rusqlite::Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// Stream every record into the table, returning (loaded, skipped)
fn insert_rows<R: Read>(
    tx: &Transaction,
    schema: &TableSchema,
    reader: &mut csv::Reader<R>,
    options: &CsvOptions,
    progress: &ProgressBar,
) -> Result<(u64, u64), LoadCause> {
    let insert_sql = generate_insert(schema);
    let mut record = ByteRecord::new();
    let mut header_pending = options.has_header;
    let mut loaded: u64 = 0;
    let mut skipped: u64 = 0;
    let mut batch: Vec<(u64, ParsedRow)> = Vec::with_capacity(BATCH_SIZE);

    loop {
        let line = reader.position().line();
        if !reader.read_byte_record(&mut record)? {
            break;
        }

        if header_pending {
            check_header(&record, schema, progress)?;
            header_pending = false;
            continue;
        }

        match parse_record(&record, schema) {
            Ok(row) => batch.push((line, row)),
            Err(error) => match options.error_policy {
                ErrorPolicy::Strict => return Err(LoadCause::Row { line, error }),
                ErrorPolicy::IgnoreRowErrors => {
                    progress.suspend(|| {
                        warn!("{}: skipping line {}: {}", schema.name, line, error)
                    });
                    skipped += 1;
                }
            },
        }

        if batch.len() >= BATCH_SIZE {
            let (ok, rejected) =
                insert_batch(tx, &insert_sql, schema, &batch, options, progress)?;
            loaded += ok;
            skipped += rejected;
            batch.clear();
            progress.set_position(reader.position().byte());
        }
    }

    // Insert remaining batch
    if !batch.is_empty() {
        let (ok, rejected) = insert_batch(tx, &insert_sql, schema, &batch, options, progress)?;
        loaded += ok;
        skipped += rejected;
    }

    Ok((loaded, skipped))
}

fn check_header(
    record: &ByteRecord,
    schema: &TableSchema,
    progress: &ProgressBar,
) -> Result<(), LoadCause> {
    if record.len() != schema.columns.len() {
        return Err(LoadCause::HeaderMismatch {
            expected: schema.columns.len(),
            found: record.len(),
        });
    }

    let names: Vec<String> = record
        .iter()
        .map(|f| String::from_utf8_lossy(f).trim().to_string())
        .collect();
    if names.iter().map(String::as_str).ne(schema.column_names()) {
        progress.suspend(|| {
            warn!(
                "{}: header {:?} differs from schema {:?}, mapping by position",
                schema.name,
                names,
                schema.column_names()
            )
        });
    }

    Ok(())
}

/// Insert a batch of rows, returning (inserted, rejected)
fn insert_batch(
    tx: &Transaction,
    sql: &str,
    schema: &TableSchema,
    batch: &[(u64, ParsedRow)],
    options: &CsvOptions,
    progress: &ProgressBar,
) -> Result<(u64, u64), LoadCause> {
    let mut stmt = tx.prepare_cached(sql)?;
    let mut inserted = 0;
    let mut rejected = 0;

    for (line, row) in batch {
        for (idx, value) in row.values.iter().enumerate() {
            value.bind_to(idx + 1, &mut stmt)?;
        }

        match stmt.raw_execute() {
            Ok(_) => inserted += 1,
            Err(e)
                if is_constraint_violation(&e)
                    && options.error_policy == ErrorPolicy::IgnoreRowErrors =>
            {
                progress.suspend(|| warn!("{}: skipping line {}: {}", schema.name, line, e));
                rejected += 1;
            }
            Err(e) if is_constraint_violation(&e) => {
                return Err(LoadCause::Rejected {
                    line: *line,
                    source: e,
                });
            }
            Err(e) => return Err(LoadCause::Storage(e)),
        }
    }

    Ok((inserted, rejected))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{KEYWORD, KIND_TYPE};
    use std::io::Write;

    fn memory_writer() -> SqliteWriter {
        SqliteWriter::from_connection(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_create_schema_twice_fails() {
        let writer = memory_writer();
        writer.create_schema(&[&KEYWORD]).unwrap();

        let err = writer.create_schema(&[&KEYWORD]).unwrap_err();
        assert_eq!(err.table, "keyword");
    }

    #[test]
    fn test_load_table_counts_rows() {
        let mut writer = memory_writer();
        let file = csv_file("id,kind\n1,movie\n2,tv series\n");

        let load = writer
            .load_table(&KIND_TYPE, file.path(), &CsvOptions::default(), &ProgressBar::hidden())
            .unwrap();
        assert_eq!(load.rows_loaded, 2);
        assert_eq!(load.rows_skipped, 0);
    }

    #[test]
    fn test_backslash_escaped_quotes() {
        let mut writer = memory_writer();
        let file = csv_file("id,keyword,phonetic_code\n1,\"say \\\"hi\\\", ok\",S\n");

        writer
            .load_table(&KEYWORD, file.path(), &CsvOptions::default(), &ProgressBar::hidden())
            .unwrap();

        let keyword: String = writer
            .connection()
            .query_row("SELECT keyword FROM keyword WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(keyword, "say \"hi\", ok");
    }

    #[test]
    fn test_header_mismatch_fails() {
        let mut writer = memory_writer();
        let file = csv_file("id,kind,extra\n1,movie,x\n");

        let err = writer
            .load_table(&KIND_TYPE, file.path(), &CsvOptions::default(), &ProgressBar::hidden())
            .unwrap_err();
        assert!(matches!(
            err.cause,
            LoadCause::HeaderMismatch {
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_duplicate_primary_key() {
        let mut writer = memory_writer();
        let file = csv_file("id,kind\n1,movie\n1,tv series\n2,episode\n");

        let err = writer
            .load_table(&KIND_TYPE, file.path(), &CsvOptions::default(), &ProgressBar::hidden())
            .unwrap_err();
        assert!(matches!(err.cause, LoadCause::Rejected { .. }));

        let options = CsvOptions {
            error_policy: ErrorPolicy::IgnoreRowErrors,
            ..CsvOptions::default()
        };
        let load = writer
            .load_table(&KIND_TYPE, file.path(), &options, &ProgressBar::hidden())
            .unwrap();
        assert_eq!(load.rows_loaded, 2);
        assert_eq!(load.rows_skipped, 1);
    }

    #[test]
    fn test_refresh_statistics() {
        let writer = memory_writer();
        writer.create_schema(&[&KEYWORD]).unwrap();
        assert!(writer.refresh_statistics());
    }
}

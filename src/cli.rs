use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{parse_ascii_char, CsvOptions, ErrorPolicy, DEFAULT_DB};

#[derive(Parser, Debug)]
#[command(name = "job-loader")]
#[command(version, about = "Load the IMDB Join Order Benchmark CSV dump into SQLite")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a fresh database and load every table from CSV
    Load {
        /// Directory containing one <table>.csv per table
        data_dir: PathBuf,

        /// Output SQLite database path (replaced if it exists)
        #[arg(default_value = DEFAULT_DB)]
        output_db: PathBuf,

        /// Only include these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Exclude these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        #[command(flatten)]
        csv: CsvArgs,

        /// Do not build secondary indexes after loading
        #[arg(long)]
        skip_indexes: bool,

        /// Do not refresh planner statistics after loading
        #[arg(long)]
        skip_analyze: bool,

        #[command(flatten)]
        expected: ExpectedArgs,

        /// Write the load summary as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print row counts of an existing database
    Verify {
        /// SQLite database path
        db: PathBuf,

        #[command(flatten)]
        expected: ExpectedArgs,
    },

    /// Build secondary indexes and refresh statistics on an existing database
    Index {
        /// SQLite database path
        db: PathBuf,
    },

    /// Print the CREATE TABLE and CREATE INDEX statements
    Schema,

    /// List all table names in load order
    ListTables,
}

/// CSV dialect flags
#[derive(Args, Debug)]
pub struct CsvArgs {
    /// Field delimiter
    #[arg(long, default_value = ",", value_parser = parse_ascii_char)]
    pub delimiter: u8,

    /// Quote character
    #[arg(long, default_value = "\"", value_parser = parse_ascii_char)]
    pub quote: u8,

    /// Escape character inside quoted fields
    #[arg(long, default_value = "\\", value_parser = parse_ascii_char)]
    pub escape: u8,

    /// Disable the escape character (doubled quotes still work)
    #[arg(long)]
    pub no_escape: bool,

    /// Input files have no header row
    #[arg(long)]
    pub no_header: bool,

    /// Skip malformed rows instead of failing the table
    #[arg(long)]
    pub ignore_errors: bool,
}

impl CsvArgs {
    pub fn to_options(&self) -> CsvOptions {
        CsvOptions {
            delimiter: self.delimiter,
            has_header: !self.no_header,
            quote: self.quote,
            escape: (!self.no_escape).then_some(self.escape),
            error_policy: if self.ignore_errors {
                ErrorPolicy::IgnoreRowErrors
            } else {
                ErrorPolicy::Strict
            },
        }
    }
}

/// Expected row count source
#[derive(Args, Debug)]
pub struct ExpectedArgs {
    /// JSON file mapping table name to expected row count
    #[arg(long, conflicts_with = "job_counts")]
    pub expected_counts: Option<PathBuf>,

    /// Compare against the row counts of the reference JOB snapshot
    #[arg(long)]
    pub job_counts: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_defaults() {
        let cli = Cli::try_parse_from(["job-loader", "load", "/data/imdb"]).unwrap();
        match cli.command {
            Commands::Load {
                data_dir,
                output_db,
                csv,
                ..
            } => {
                assert_eq!(data_dir, PathBuf::from("/data/imdb"));
                assert_eq!(output_db, PathBuf::from(DEFAULT_DB));
                assert_eq!(csv.to_options(), CsvOptions::default());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_load_dialect_flags() {
        let cli = Cli::try_parse_from([
            "job-loader",
            "load",
            "data",
            "out.db",
            "--delimiter",
            "|",
            "--no-escape",
            "--no-header",
            "--ignore-errors",
        ])
        .unwrap();
        let Commands::Load { csv, .. } = cli.command else {
            panic!("expected load command");
        };
        let options = csv.to_options();
        assert_eq!(options.delimiter, b'|');
        assert_eq!(options.escape, None);
        assert!(!options.has_header);
        assert_eq!(options.error_policy, ErrorPolicy::IgnoreRowErrors);
    }

    #[test]
    fn test_expected_sources_conflict() {
        let result = Cli::try_parse_from([
            "job-loader",
            "verify",
            "x.db",
            "--expected-counts",
            "c.json",
            "--job-counts",
        ]);
        assert!(result.is_err());
    }
}

use anyhow::{Context, Result};
use indicatif::MultiProgress;
use job_loader::{
    cli::{Cli, Commands, ExpectedArgs},
    config::{job_row_counts, read_expected_counts, LoaderConfig, RowCounts},
    filter::resolve_tables,
    schema::{indexes_for, table_names, ALL_INDEXES, ALL_TABLES},
    writer::schema_gen::{generate_create_index, generate_create_table},
    writer::{load_to_sqlite, LoadSummary, SqliteWriter, TableStatus},
};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Load {
            data_dir,
            output_db,
            include,
            exclude,
            csv,
            skip_indexes,
            skip_analyze,
            expected,
            report,
        } => {
            let config = LoaderConfig {
                tables: resolve_tables(include, exclude)?,
                csv: csv.to_options(),
                build_indexes: !skip_indexes,
                refresh_statistics: !skip_analyze,
                expected_counts: expected_counts(&expected)?,
                ..LoaderConfig::new(data_dir, output_db)
            };

            println!("Loading {:?} into {:?}...\n", config.data_dir, config.output_db);
            let summary = load_to_sqlite(&config, &MultiProgress::new())?;

            print_summary(&config, &summary);

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&summary)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write report: {:?}", path))?;
            }

            if !summary.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Verify { db, expected } => {
            let writer = SqliteWriter::open(&db)?;
            let expected = expected_counts(&expected)?;
            let verification = writer
                .verify_row_counts(ALL_TABLES, expected.as_ref())
                .context("Failed to verify row counts")?;

            for (table, count) in &verification.counts {
                println!("{:20} {:>12}", table, count);
            }
            for warning in &verification.warnings {
                println!("warning: {}", warning);
            }
        }

        Commands::Index { db } => {
            let writer = SqliteWriter::open(&db)?;
            let report = writer.create_indexes(&indexes_for(ALL_TABLES));
            writer.refresh_statistics();
            println!(
                "Created {} indexes ({} failed)",
                report.created.len(),
                report.failed.len()
            );
        }

        Commands::Schema => {
            for table in ALL_TABLES {
                println!("{};\n", generate_create_table(table));
            }
            for index in ALL_INDEXES {
                println!("{};", generate_create_index(index));
            }
        }

        Commands::ListTables => {
            println!("Available tables:\n");
            for name in table_names() {
                println!("  {}", name);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn expected_counts(args: &ExpectedArgs) -> Result<Option<RowCounts>> {
    if args.job_counts {
        return Ok(Some(job_row_counts()));
    }
    args.expected_counts
        .as_deref()
        .map(read_expected_counts)
        .transpose()
}

fn print_summary(config: &LoaderConfig, summary: &LoadSummary) {
    println!(
        "\n{} loaded, {} failed, {} missing, {} not attempted",
        summary.count(TableStatus::Loaded),
        summary.count(TableStatus::Failed),
        summary.count(TableStatus::Missing),
        summary.count(TableStatus::NotAttempted),
    );
    println!(
        "{} rows loaded, {} rows skipped, {} indexes built",
        summary.total_rows, summary.total_skipped, summary.indexes_created
    );
    for failure in &summary.index_failures {
        println!("index warning: {}", failure);
    }
    for warning in &summary.warnings {
        println!("count warning: {}", warning);
    }
    println!("{}", summary.footer(&config.output_db));
}

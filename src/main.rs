//! CLI entry point for the travel survey preprocessing tool.
//!
//! Provides subcommands for the full preprocessing run, inspecting the values
//! of one raw column, and exporting journey segments.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use travel_survey_prep::{
    accessor::DataAccessor,
    config::RunConfig,
    pipeline::{Pipeline, run_pipeline},
    source::{CsvDirectory, write_relation},
};

#[derive(Parser)]
#[command(name = "travel_survey_prep")]
#[command(about = "Preprocess household travel survey extracts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every preprocessing step and write the processed tables
    Run {
        /// Directory holding the raw CSV extracts
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Directory to write processed tables to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Gzip compress the processed CSV files
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Apply the corrected rules instead of reproducing the published tables
        #[arg(long, default_value_t = false)]
        fix_known_defects: bool,
    },
    /// Count the values of one column of a raw dataset or a processed table
    UniqueValues {
        /// Raw dataset name, or a processed table name with --processed
        dataset: String,

        column: String,

        /// Directory holding the raw CSV extracts
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Count over the processed table, building it first
        #[arg(long, default_value_t = false)]
        processed: bool,

        /// Apply the corrected rules when building the processed table
        #[arg(long, default_value_t = false)]
        fix_known_defects: bool,
    },
    /// Export one row per journey leg
    Segments {
        /// "work" for journey to work, anything else for journey to education
        #[arg(short, long)]
        journey_type: Option<String>,

        /// CSV file to write segments to
        #[arg(short, long, default_value = "journey_segments.csv")]
        output: PathBuf,

        /// Directory holding the raw CSV extracts
        #[arg(short, long)]
        input_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/travel_survey_prep.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("travel_survey_prep.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input_dir,
            output_dir,
            gzip,
            fix_known_defects,
        } => {
            let config = RunConfig::from_env(input_dir, output_dir, gzip, fix_known_defects);
            let summary = run_pipeline(&config)?;
            info!(
                tables = summary.tables.len(),
                output_dir = %config.output_dir.display(),
                "Preprocessing finished"
            );
        }
        Commands::UniqueValues {
            dataset,
            column,
            input_dir,
            processed,
            fix_known_defects,
        } => {
            let config = RunConfig::from_env(input_dir, None, false, fix_known_defects);
            let mut accessor = DataAccessor::new(CsvDirectory::new(&config.input_dir));
            let counts = if processed {
                Pipeline::new(accessor, config.compat).unique_values(&dataset, &column)?
            } else {
                accessor.get_unique_values(&dataset, &column)?
            };

            info!(dataset = %dataset, column = %column, distinct = counts.len(), "Value counts");
            for (value, count) in &counts {
                info!(value = %value, count, "Value");
            }
        }
        Commands::Segments {
            journey_type,
            output,
            input_dir,
        } => {
            let config = RunConfig::from_env(input_dir, None, false, false);
            let mut accessor = DataAccessor::new(CsvDirectory::new(&config.input_dir));
            let segments = accessor.get_journey_segments(journey_type.as_deref())?;

            write_relation(&segments, BufWriter::new(File::create(&output)?))?;
            info!(
                segments = segments.len(),
                path = %output.display(),
                "Journey segments written"
            );
        }
    }

    Ok(())
}

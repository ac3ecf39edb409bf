//! Batch ETL for the emotion analysis pipeline.
//!
//! - `extract` reads label files, simulates model results and writes the
//!   result CSV.
//! - `load` replaces the staging table with the contents of the result CSV.
//! - `run` does both in sequence.
//!
//! ## Usage
//!
//! ```bash
//! emolens-etl extract --labels-dir ./train/labels
//! emolens-etl load
//! emolens-etl run --labels-dir ./train/labels --seed 42
//! ```
//!
//! Every failure is fatal to the run and maps to a nonzero exit status.
//! There are no retries; re-run the step.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use emolens::config::{Config, DatabaseConfig, ExtractConfig, LoadConfig};
use emolens::logging::{self, LogTarget};
use emolens::pipeline::{run_extract, run_load};
use emolens::PipelineError;

#[derive(Debug, Parser)]
#[command(name = "emolens-etl", version, about = "Extract and load emotion analysis results")]
struct Cli {
    /// Path to the settings file
    #[arg(short, long, env = "EMOLENS_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read label files and write the result CSV
    Extract(ExtractArgs),
    /// Replace the staging table with the result CSV
    Load(LoadArgs),
    /// Extract, then load the file just written
    Run {
        #[command(flatten)]
        extract: ExtractArgs,

        /// Staging table to replace
        #[arg(long)]
        table: Option<String>,
    },
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Directory of label files
    #[arg(long)]
    labels_dir: Option<PathBuf>,

    /// Result CSV to write
    #[arg(long)]
    output: Option<PathBuf>,

    /// Maximum number of records to emit
    #[arg(long)]
    max_files: Option<usize>,

    /// RNG seed for a reproducible simulation
    #[arg(long)]
    seed: Option<u64>,
}

impl ExtractArgs {
    fn apply(&self, config: &mut ExtractConfig) {
        if let Some(ref dir) = self.labels_dir {
            config.labels_dir = dir.clone();
        }
        if let Some(ref output) = self.output {
            config.output_path = output.clone();
        }
        if let Some(max) = self.max_files {
            config.max_files = max;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

#[derive(Debug, Args)]
struct LoadArgs {
    /// Result CSV to load
    #[arg(long)]
    input: Option<PathBuf>,

    /// Staging table to replace
    #[arg(long)]
    table: Option<String>,
}

impl LoadArgs {
    fn apply(&self, config: &mut LoadConfig) {
        if let Some(ref input) = self.input {
            config.input_path = input.clone();
        }
        if let Some(ref table) = self.table {
            config.staging_table = table.clone();
        }
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = logging::init(LogTarget::Console) {
        eprintln!("Warning: logging unavailable: {:#}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            let code = err
                .downcast_ref::<PipelineError>()
                .map(|e| e.exit_code())
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Extract(args) => {
            args.apply(&mut config.extract);
            let summary = run_extract(&config.extract)?;
            info!(
                "Extract finished: {} rows in {:?}",
                summary.rows_written, summary.output_path
            );
        }
        Command::Load(args) => {
            args.apply(&mut config.load);
            let database = DatabaseConfig::from_env()?;
            let summary = run_load(&config.load, &database)?;
            info!("Load finished: {} rows in '{}'", summary.rows_loaded, summary.table);
        }
        Command::Run { extract, table } => {
            extract.apply(&mut config.extract);
            config.load.input_path = config.extract.output_path.clone();
            if let Some(table) = table {
                config.load.staging_table = table;
            }

            // Credentials are checked before any work is done
            let database = DatabaseConfig::from_env()?;

            let extracted = run_extract(&config.extract)?;
            info!("Extract finished: {} rows", extracted.rows_written);
            let loaded = run_load(&config.load, &database)?;
            info!("Load finished: {} rows in '{}'", loaded.rows_loaded, loaded.table);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_loads_the_extract_output() {
        let cli = Cli::try_parse_from([
            "emolens-etl", "run", "--output", "out.csv", "--table", "stg",
        ])
        .unwrap();
        match cli.command {
            Command::Run { extract, table } => {
                assert_eq!(extract.output, Some(PathBuf::from("out.csv")));
                assert_eq!(table.as_deref(), Some("stg"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_rejects_separate_input() {
        assert!(Cli::try_parse_from(["emolens-etl", "run", "--input", "other.csv"]).is_err());
    }

    #[test]
    fn test_load_accepts_input() {
        let cli = Cli::try_parse_from(["emolens-etl", "load", "--input", "other.csv"]).unwrap();
        let mut config = LoadConfig::default();
        match cli.command {
            Command::Load(args) => args.apply(&mut config),
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(config.input_path, PathBuf::from("other.csv"));
    }
}

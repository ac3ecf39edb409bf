//! Batch steps: extract (labels -> result file) and load (result file ->
//! staging table).

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::info;

use crate::annotations::AnnotationReader;
use crate::config::{DatabaseConfig, ExtractConfig, LoadConfig};
use crate::db::Store;
use crate::error::Result;
use crate::results::{read_result_file, write_result_file, RowAssembler, StagingRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub rows_written: usize,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows_loaded: usize,
    pub table: String,
}

/// Read label files, simulate predictions and write the result file.
pub fn run_extract(config: &ExtractConfig) -> Result<ExtractSummary> {
    info!("Reading annotation files from {:?}", config.labels_dir);
    let reader = AnnotationReader::new(&config.labels_dir, config.max_files);
    let records = reader.records()?;

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let rows = RowAssembler::new(config.base_time, rng).assemble(records);
    info!("Assembled {} result rows", rows.len());

    write_result_file(&rows, &config.output_path)?;
    info!("Wrote {} rows to {:?}", rows.len(), config.output_path);

    Ok(ExtractSummary {
        rows_written: rows.len(),
        output_path: config.output_path.clone(),
    })
}

/// Read the result file, connect, and replace the staging table.
///
/// The file is parsed before any connection is made, so a bad file never
/// touches the store.
pub fn run_load(config: &LoadConfig, database: &DatabaseConfig) -> Result<LoadSummary> {
    info!("Reading result file {:?}", config.input_path);
    let rows = read_result_file(&config.input_path)?;
    info!("Read {} rows", rows.len());

    info!("Connecting to {}", database.describe());
    let store = Store::open(database)?;
    load_rows(config, &store, &rows)
}

fn load_rows(config: &LoadConfig, store: &Store, rows: &[StagingRow]) -> Result<LoadSummary> {
    info!(
        "Loading data into table '{}' ({})",
        config.staging_table,
        store.backend_name()
    );
    let rows_loaded = store.replace_staging(&config.staging_table, rows)?;
    info!("Loaded {} rows into '{}'", rows_loaded, config.staging_table);

    Ok(LoadSummary {
        rows_loaded,
        table: config.staging_table.clone(),
    })
}

//! The ETL run: discover input files, load them one by one, commit per file.

mod discover;
mod load;

pub use discover::discover_json_files;
pub use load::{load_log_file, load_song_file};

use crate::config::EtlConfig;
use crate::warehouse::{SqliteWarehouse, TableCounts, Warehouse};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// The two input datasets. Songs must be loaded before logs so that
/// songplays can be resolved against them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetKind {
    Songs,
    Logs,
}

impl DatasetKind {
    fn load_file(
        &self,
        warehouse: &dyn Warehouse,
        path: &Path,
        stats: &mut LoadStats,
    ) -> Result<()> {
        match self {
            DatasetKind::Songs => load_song_file(warehouse, path, stats),
            DatasetKind::Logs => load_log_file(warehouse, path, stats),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub files_processed: usize,
    pub songs_inserted: usize,
    pub songs_skipped: usize,
    pub artists_inserted: usize,
    pub artists_skipped: usize,
    pub users_inserted: usize,
    pub users_skipped: usize,
    pub time_rows: usize,
    pub songplays: usize,
    pub songplays_resolved: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: LoadStats,
    pub counts: TableCounts,
}

/// Load every file of one dataset, committing after each file.
///
/// The first error aborts the dataset. Files before it stay committed, the
/// failing file is rolled back.
pub fn process_data(
    warehouse: &mut SqliteWarehouse,
    root: &Path,
    kind: DatasetKind,
    stats: &mut LoadStats,
) -> Result<usize> {
    let files = discover_json_files(root)?;
    let num_files = files.len();
    info!("{} files found in {}", num_files, root.display());

    for (index, path) in files.iter().enumerate() {
        let tx = warehouse.begin_file()?;
        kind.load_file(&tx, path, stats)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        tx.commit()?;
        stats.files_processed += 1;
        info!("{}/{} files processed.", index + 1, num_files);
    }

    Ok(num_files)
}

/// Run the whole job: song dataset first, then the log dataset.
pub fn run(warehouse: &mut SqliteWarehouse, config: &EtlConfig) -> Result<RunSummary> {
    let mut stats = LoadStats::default();

    info!("Loading song data from {}", config.song_data.display());
    process_data(warehouse, &config.song_data, DatasetKind::Songs, &mut stats)?;

    info!("Loading log data from {}", config.log_data.display());
    process_data(warehouse, &config.log_data, DatasetKind::Logs, &mut stats)?;

    let counts = warehouse.counts()?;
    Ok(RunSummary { stats, counts })
}

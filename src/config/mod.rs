mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_SONG_DATA_DIR: &str = "data/song_data";
pub const DEFAULT_LOG_DATA_DIR: &str = "data/log_data";

/// CLI arguments that can be used for config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub database: Option<PathBuf>,
    pub song_data: Option<PathBuf>,
    pub log_data: Option<PathBuf>,
    pub reset: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlConfig {
    pub database: PathBuf,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub reset: bool,
}

fn require_dir(name: &str, path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} directory does not exist: {:?}", name, path);
    }
    if !path.is_dir() {
        bail!("{} is not a directory: {:?}", name, path);
    }
    Ok(())
}

impl EtlConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let database = file
            .database
            .map(PathBuf::from)
            .or_else(|| cli.database.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("database must be specified on the command line or in config file")
            })?;

        let song_data = file
            .song_data
            .map(PathBuf::from)
            .or_else(|| cli.song_data.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SONG_DATA_DIR));
        require_dir("song_data", &song_data)?;

        let log_data = file
            .log_data
            .map(PathBuf::from)
            .or_else(|| cli.log_data.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DATA_DIR));
        require_dir("log_data", &log_data)?;

        let reset = file.reset.unwrap_or(cli.reset);

        Ok(EtlConfig {
            database,
            song_data,
            log_data,
            reset,
        })
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::{pipeline, CliConfig, EtlConfig, FileConfig, SqliteWarehouse};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(about = "Load song metadata and event logs into a SQLite star schema")]
struct CliArgs {
    /// Path to the SQLite warehouse database file, created if missing.
    #[clap(value_parser = parse_path)]
    pub database: Option<PathBuf>,

    /// Root directory of the song metadata files.
    #[clap(long, value_parser = parse_path)]
    pub song_data: Option<PathBuf>,

    /// Root directory of the event log files.
    #[clap(long, value_parser = parse_path)]
    pub log_data: Option<PathBuf>,

    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Drop and recreate all warehouse tables before loading.
    #[clap(long)]
    pub reset: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            database: self.database.clone(),
            song_data: self.song_data.clone(),
            log_data: self.log_data.clone(),
            reset: self.reset,
        }
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = EtlConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening warehouse database at {:?}...", config.database);
    let mut warehouse = SqliteWarehouse::open(&config.database)?;
    if config.reset {
        warehouse.reset()?;
    }

    let summary = pipeline::run(&mut warehouse, &config)?;
    let stats = &summary.stats;
    let counts = &summary.counts;

    info!("Load Summary");
    info!("============");
    info!("Files processed: {}", stats.files_processed);
    info!(
        "Songs inserted: {} ({} already present)",
        stats.songs_inserted, stats.songs_skipped
    );
    info!(
        "Artists inserted: {} ({} already present)",
        stats.artists_inserted, stats.artists_skipped
    );
    info!(
        "Users inserted: {} ({} already present)",
        stats.users_inserted, stats.users_skipped
    );
    info!("Time rows inserted: {}", stats.time_rows);
    info!(
        "Songplays inserted: {} ({} matched a song)",
        stats.songplays, stats.songplays_resolved
    );

    info!("Database contains:");
    info!("  {} songplays", counts.songplays);
    info!("  {} users", counts.users);
    info!("  {} songs", counts.songs);
    info!("  {} artists", counts.artists);
    info!("  {} time rows", counts.time);

    Ok(())
}

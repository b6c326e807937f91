//! Sparkify ETL Library
//!
//! Loads song metadata and event logs into a SQLite star schema. The modules
//! are exposed for the binary and the end-to-end tests.

pub mod config;
pub mod pipeline;
pub mod records;
pub mod sqlite_persistence;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use config::{CliConfig, EtlConfig, FileConfig};
pub use pipeline::{run, DatasetKind, LoadStats, RunSummary};
pub use warehouse::{SqliteWarehouse, TableCounts, Warehouse};

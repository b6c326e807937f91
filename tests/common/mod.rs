//! Common test infrastructure
//!
//! Builds throwaway song/log datasets on disk and reads back what a run
//! stored. Tests should only import from this module.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestDataset;
//!
//! #[test]
//! fn test_load() {
//!     let dataset = TestDataset::new();
//!     dataset.write_song("A/A/A/S1.json", &common::song_json("S1", "T", "A1", "Art", 180.5));
//!     let mut warehouse = dataset.open_warehouse();
//!     sparkify_etl::run(&mut warehouse, &dataset.config()).unwrap();
//! }
//! ```

mod fixtures;

pub use fixtures::*;

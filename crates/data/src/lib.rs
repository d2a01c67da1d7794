//! Source table loading and dataset storage for the options pipeline.
//!
//! This crate provides:
//! - A CSV-backed `SourceStore` for prices, options, macro series, ratios, names and dividends
//! - Parquet and CSV `DatasetSink`s sharing one column layout
//! - Coverage summaries of the loaded sources

pub mod csv_storage;
pub mod dates;
pub mod models;
pub mod parquet_storage;
pub mod schema;
pub mod summary;

pub use csv_storage::{CsvSourceStore, CsvStorage};
pub use parquet_storage::ParquetStorage;
pub use summary::{summarize, TableStatus};

use optionset_core::{DatasetSink, OutputFormat};
use std::path::Path;

/// Creates the sink for the configured output format.
pub fn sink_for(format: OutputFormat, dir: &Path) -> Box<dyn DatasetSink> {
    match format {
        OutputFormat::Parquet => Box::new(ParquetStorage::new(dir)),
        OutputFormat::Csv => Box::new(CsvStorage::new(dir)),
    }
}

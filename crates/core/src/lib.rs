//! Core types, configuration and storage seams for the options dataset pipeline.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod records;
pub mod traits;

pub use config::{
    DatasetConfig, NextPeriodPolicy, OutputConfig, OutputFormat, PartitionConfig, PathsConfig,
    PipelineConfig, SyntheticConfig,
};
pub use config_loader::ConfigLoader;
pub use error::PipelineError;
pub use records::{
    industry_one_hot, industry_slot, DividendRecord, EntityId, FundamentalRecord,
    MacroObservation, NameRecord, OptionQuote, OptionType, PanelRow, PriceRecord, SourceTables,
    SyntheticRecord, INDUSTRY_COUNT,
};
pub use traits::{DatasetSink, SourceStore};

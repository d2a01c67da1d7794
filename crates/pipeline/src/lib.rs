//! Dataset pipeline stages for the options panel.
//!
//! Stages run in a fixed order: derived series, merge, feature derivation,
//! missing-value drop, partitioning, feature statistics and synthetic
//! contract generation. [`DatasetPipeline::run`] composes them.

pub mod calendar;
pub mod features;
pub mod merge;
pub mod partition;
pub mod pipeline;
pub mod returns;
pub mod stats;
pub mod synthetic;

pub use calendar::{month_end, NextPeriod, TradingCalendar};
pub use features::{CompletePanel, FeatureRow, FeatureSet};
pub use merge::MergedRow;
pub use partition::Partitions;
pub use pipeline::{
    DatasetBundle, DatasetPipeline, RunSummary, SINGLE_TABLE, SYNTHETIC_TABLE, TEST_TABLE,
    TRAIN_TABLE, VALIDATE_TABLE,
};
pub use returns::{compute_derived_series, DerivedSeries, DerivedValues};
pub use stats::{ColumnStats, FeatureStats};
pub use synthetic::SyntheticGenerator;

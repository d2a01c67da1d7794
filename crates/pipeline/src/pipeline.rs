//! Stage composition: sources in, finished dataset tables out.

use optionset_core::{
    EntityId, OptionType, PanelRow, PipelineConfig, PipelineError, SourceTables, SyntheticRecord,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::calendar::{NextPeriod, TradingCalendar};
use crate::features::{self, CompletePanel, FeatureSet};
use crate::merge::{self, MergedRow};
use crate::partition::{self, Partitions};
use crate::returns::{compute_derived_series, DerivedSeries};
use crate::stats::FeatureStats;
use crate::synthetic::SyntheticGenerator;

pub const TRAIN_TABLE: &str = "train";
pub const VALIDATE_TABLE: &str = "validate";
pub const TEST_TABLE: &str = "test";
pub const SINGLE_TABLE: &str = "single";
pub const SYNTHETIC_TABLE: &str = "synthetic";

/// Row counts and parameters of one run, persisted next to the tables.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub option_type: OptionType,
    pub merged_rows: usize,
    pub panel_rows: usize,
    pub dropped_fraction: f64,
    pub infinite_replaced: usize,
    pub partition_seed: u64,
    pub train_rows: usize,
    pub validate_rows: usize,
    pub test_rows: usize,
    pub single_entity: Option<EntityId>,
    pub single_rows: usize,
    pub synthetic_seed: Option<u64>,
    pub synthetic_rows: usize,
    pub feature_stats: FeatureStats,
}

/// Every output table of a run.
#[derive(Debug, Clone)]
pub struct DatasetBundle {
    pub train: Vec<PanelRow>,
    pub validate: Vec<PanelRow>,
    pub test: Vec<PanelRow>,
    pub single: Vec<PanelRow>,
    pub synthetic: Vec<SyntheticRecord>,
    pub summary: RunSummary,
}

impl DatasetBundle {
    /// Panel tables with their output names.
    #[must_use]
    pub fn panel_tables(&self) -> [(&'static str, &[PanelRow]); 4] {
        [
            (TRAIN_TABLE, self.train.as_slice()),
            (VALIDATE_TABLE, self.validate.as_slice()),
            (TEST_TABLE, self.test.as_slice()),
            (SINGLE_TABLE, self.single.as_slice()),
        ]
    }
}

/// Named pipeline stages driven by one immutable configuration.
#[derive(Debug, Clone, Copy)]
pub struct DatasetPipeline<'a> {
    config: &'a PipelineConfig,
}

impl<'a> DatasetPipeline<'a> {
    #[must_use]
    pub const fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn trading_calendar(&self, tables: &SourceTables) -> TradingCalendar {
        TradingCalendar::from_dates(tables.prices.iter().map(|p| p.date))
    }

    #[must_use]
    pub fn derive_series(&self, tables: &SourceTables) -> DerivedSeries {
        tracing::info!("Calculating returns and volas");
        compute_derived_series(&tables.prices, self.config.dataset.annualization)
    }

    /// Runs every join in order.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPanel` naming the first join that left no rows.
    pub fn merge(
        &self,
        tables: &SourceTables,
        derived: &DerivedSeries,
        calendar: &TradingCalendar,
    ) -> Result<Vec<MergedRow>, PipelineError> {
        let next = NextPeriod::new(self.config.dataset.next_period, calendar);
        let prices = merge::shift_prices(&tables.prices, &next);
        let rows = merge::join_prices(&tables.options, &prices)?;
        let rows = merge::attach_derived(rows, derived);
        let rows = merge::join_macro(rows, &tables.treasury, &tables.vix)?;
        let rows = merge::join_fundamentals(rows, &tables.fundamentals)?;
        merge::join_names(rows, &tables.names)
    }

    #[must_use]
    pub fn derive_features(&self, rows: Vec<MergedRow>, calendar: &TradingCalendar) -> FeatureSet {
        let next = NextPeriod::new(self.config.dataset.next_period, calendar);
        features::derive_features(rows, &next)
    }

    /// Applies the missing-value policy.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPanel` if no row is complete.
    pub fn drop_incomplete(&self, features: FeatureSet) -> Result<CompletePanel, PipelineError> {
        let panel = features::drop_incomplete(features);
        if panel.rows.is_empty() {
            return Err(PipelineError::empty_panel("drop_incomplete"));
        }
        Ok(panel)
    }

    #[must_use]
    pub fn partition(&self, rows: &[PanelRow]) -> Partitions {
        partition::partition(rows, &self.config.partition)
    }

    /// # Errors
    ///
    /// Returns an error if the training partition is empty.
    pub fn feature_stats(&self, train: &[PanelRow]) -> Result<FeatureStats, PipelineError> {
        FeatureStats::from_train(
            train,
            &self.config.dataset.fundamental_columns,
            &self.config.synthetic.auxiliary_columns,
        )
    }

    /// Random source for synthetic noise: seeded when configured, otherwise entropy.
    #[must_use]
    pub fn synthetic_rng(&self) -> ChaCha8Rng {
        match self.config.synthetic.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    #[must_use]
    pub fn synthesize(&self, stats: &FeatureStats) -> Vec<SyntheticRecord> {
        if !self.config.synthetic.enabled {
            tracing::info!("Synthetic contracts disabled");
            return Vec::new();
        }
        let generator = SyntheticGenerator::new(self.config.dataset.option_type, stats);
        generator.generate(&mut self.synthetic_rng())
    }

    /// Runs every stage over the loaded sources.
    ///
    /// # Errors
    ///
    /// Returns the first stage error; nothing is partially produced.
    pub fn run(&self, tables: &SourceTables) -> Result<DatasetBundle, PipelineError> {
        if !tables.dividends.is_empty() {
            tracing::debug!(rows = tables.dividends.len(), "Dividends loaded but not merged");
        }

        let calendar = self.trading_calendar(tables);
        let derived = self.derive_series(tables);
        let merged = self.merge(tables, &derived, &calendar)?;
        let merged_rows = merged.len();
        let features = self.derive_features(merged, &calendar);
        let infinite_replaced = features.infinite_replaced;
        let panel = self.drop_incomplete(features)?;
        tracing::info!(rows = panel.rows.len(), "Panel complete");

        let Partitions {
            train,
            validate,
            test,
        } = self.partition(&panel.rows);
        let (single_entity, single) =
            partition::single_entity(&panel.rows, self.config.partition.single_entity_position);

        let feature_stats = self.feature_stats(&train)?;
        let synthetic = self.synthesize(&feature_stats);

        let summary = RunSummary {
            option_type: self.config.dataset.option_type,
            merged_rows,
            panel_rows: panel.rows.len(),
            dropped_fraction: panel.dropped_fraction,
            infinite_replaced,
            partition_seed: self.config.partition.seed,
            train_rows: train.len(),
            validate_rows: validate.len(),
            test_rows: test.len(),
            single_entity,
            single_rows: single.len(),
            synthetic_seed: self.config.synthetic.seed,
            synthetic_rows: synthetic.len(),
            feature_stats,
        };

        Ok(DatasetBundle {
            train,
            validate,
            test,
            single,
            synthetic,
            summary,
        })
    }
}

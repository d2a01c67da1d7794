use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PipelineError;
use crate::records::OptionType;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub dataset: DatasetConfig,
    pub partition: PartitionConfig,
    pub synthetic: SyntheticConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the source CSV tables.
    pub source_dir: PathBuf,
    /// Directory the partitions and manifest are written to.
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub option_type: OptionType,
    /// First options year loaded (inclusive).
    pub start_year: i32,
    /// Last options year (exclusive).
    pub end_year: i32,
    /// Trading days per year used to annualize returns and volatilities.
    pub annualization: f64,
    pub fundamental_columns: Vec<String>,
    pub next_period: NextPeriodPolicy,
}

/// How the "next period" observation of a group is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextPeriodPolicy {
    /// The following row of the group, whatever the calendar gap.
    NextObservation,
    /// The following row only if it falls on the next trading day.
    #[default]
    NextTradingDay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub seed: u64,
    pub train_fraction: f64,
    pub validate_fraction: f64,
    /// Zero-based position, among the sorted distinct entities, of the single-entity subset.
    pub single_entity_position: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub enabled: bool,
    /// Noise seed; `None` draws from process entropy.
    pub seed: Option<u64>,
    /// Fundamental columns sampled for synthetic rows.
    pub auxiliary_columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Parquet,
    Csv,
}

impl OutputFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Csv => "csv",
        }
    }
}

fn default_fundamental_columns() -> Vec<String> {
    ["roe", "roa", "capital_ratio", "pe_op_basic", "pe_op_dil"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            option_type: OptionType::Call,
            start_year: 2010,
            end_year: 2016,
            annualization: 252.0,
            fundamental_columns: default_fundamental_columns(),
            next_period: NextPeriodPolicy::default(),
        }
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            seed: 69777,
            train_fraction: 0.6,
            validate_fraction: 0.2,
            single_entity_position: 3,
        }
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: None,
            auxiliary_columns: default_fundamental_columns(),
        }
    }
}

impl DatasetConfig {
    /// Options years to load, `start_year..end_year`.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start_year..self.end_year
    }
}

impl PipelineConfig {
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty year range, non-positive annualization,
    /// unusable partition fractions, or synthetic columns that are not loaded.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let dataset = &self.dataset;
        if dataset.start_year >= dataset.end_year {
            return Err(PipelineError::InvalidConfig(format!(
                "start_year {} must be before end_year {}",
                dataset.start_year, dataset.end_year
            )));
        }
        if dataset.annualization.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
            return Err(PipelineError::InvalidConfig(format!(
                "annualization must be positive, got {}",
                dataset.annualization
            )));
        }

        let p = &self.partition;
        let in_unit = |f: f64| f > 0.0 && f < 1.0;
        if !in_unit(p.train_fraction)
            || !in_unit(p.validate_fraction)
            || p.train_fraction + p.validate_fraction >= 1.0
        {
            return Err(PipelineError::InvalidFraction {
                train: p.train_fraction,
                validate: p.validate_fraction,
            });
        }

        if let Some(missing) = self
            .synthetic
            .auxiliary_columns
            .iter()
            .find(|c| !dataset.fundamental_columns.contains(c))
        {
            return Err(PipelineError::InvalidConfig(format!(
                "synthetic auxiliary column '{missing}' is not in dataset.fundamental_columns"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn default_years_are_half_open() {
        let years: Vec<i32> = DatasetConfig::default().years().collect();
        assert_eq!(years, vec![2010, 2011, 2012, 2013, 2014, 2015]);
    }

    #[test]
    fn validate_rejects_empty_year_range() {
        let mut config = PipelineConfig::default();
        config.dataset.end_year = config.dataset.start_year;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_fractions_summing_to_one() {
        let mut config = PipelineConfig::default();
        config.partition.train_fraction = 0.8;
        config.partition.validate_fraction = 0.2;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidFraction { .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_auxiliary_column() {
        let mut config = PipelineConfig::default();
        config.synthetic.auxiliary_columns.push("bm".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn output_format_extension() {
        assert_eq!(OutputFormat::Parquet.extension(), "parquet");
        assert_eq!(OutputFormat::Csv.extension(), "csv");
    }
}

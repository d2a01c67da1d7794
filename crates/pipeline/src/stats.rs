//! Empirical feature statistics of the training partition.

use optionset_core::{PanelRow, PipelineError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub std: f64,
}

impl ColumnStats {
    /// Mean and sample standard deviation (n − 1). Fewer than two values give std 0.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() < 2 {
            0.0
        } else {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        };
        Self { mean, std }
    }

    fn of(rows: &[PanelRow], f: impl Fn(&PanelRow) -> f64) -> Self {
        Self::from_values(&rows.iter().map(f).collect::<Vec<_>>())
    }
}

/// Mean and standard deviation of every feature sampled for synthetic rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FeatureStats {
    pub returns: ColumnStats,
    pub v110: ColumnStats,
    pub v60: ColumnStats,
    pub v20: ColumnStats,
    pub v5: ColumnStats,
    pub r: ColumnStats,
    pub vix: ColumnStats,
    /// Auxiliary fundamental columns in configured order.
    pub auxiliary: Vec<(String, ColumnStats)>,
}

impl FeatureStats {
    /// Computes statistics over the training rows.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPanel` for an empty training set and `InvalidConfig`
    /// when an auxiliary column is not among the fundamental columns.
    pub fn from_train(
        train: &[PanelRow],
        fundamental_columns: &[String],
        auxiliary_columns: &[String],
    ) -> Result<Self, PipelineError> {
        if train.is_empty() {
            return Err(PipelineError::empty_panel("train"));
        }

        let auxiliary = auxiliary_columns
            .iter()
            .map(|name| {
                let idx = fundamental_columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| {
                        PipelineError::InvalidConfig(format!(
                            "auxiliary column '{name}' is not a fundamental column"
                        ))
                    })?;
                let stats = ColumnStats::of(train, |r| r.fundamentals.get(idx).copied().unwrap_or(0.0));
                Ok((name.clone(), stats))
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let stats = Self {
            returns: ColumnStats::of(train, |r| r.returns),
            v110: ColumnStats::of(train, |r| r.v110),
            v60: ColumnStats::of(train, |r| r.v60),
            v20: ColumnStats::of(train, |r| r.v20),
            v5: ColumnStats::of(train, |r| r.v5),
            r: ColumnStats::of(train, |r| r.r),
            vix: ColumnStats::of(train, |r| r.vix),
            auxiliary,
        };
        tracing::debug!(?stats, "Computed training feature statistics");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(returns: f64, roe: f64) -> PanelRow {
        let date = NaiveDate::from_ymd_opt(2010, 1, 4).unwrap();
        PanelRow {
            date,
            permno: 1,
            strike_price: 10.0,
            expiration_date: date,
            days: 30,
            option_price: 1.0,
            impl_volatility: 0.2,
            delta: 0.5,
            prc: 10.0,
            prc_shifted_1: 10.0,
            returns,
            v110: 0.3,
            v60: 0.3,
            v20: 0.3,
            v5: 0.3,
            r: 0.01,
            vix: 20.0,
            fundamentals: vec![0.5, roe],
            industry: None,
            comnam: String::new(),
            ticker: String::new(),
            option_price_shifted_1: 1.0,
            moneyness: 1.0,
            scaled_option_price: 0.1,
            scaled_option_price_shifted_1: 0.1,
            perfect_hedge_1: 0.0,
            p_value_change_1: 0.0,
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn column_stats_uses_sample_std() {
        let stats = ColumnStats::from_values(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(stats.mean, 2.5);
        assert!((stats.std - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn column_stats_single_value_has_zero_std() {
        let stats = ColumnStats::from_values(&[7.0]);
        assert_eq!(stats, ColumnStats { mean: 7.0, std: 0.0 });
    }

    #[test]
    fn from_train_maps_auxiliary_by_name() {
        let train = vec![row(0.1, 1.0), row(0.3, 3.0)];
        let stats =
            FeatureStats::from_train(&train, &columns(&["roa", "roe"]), &columns(&["roe"])).unwrap();

        assert!((stats.returns.mean - 0.2).abs() < 1e-12);
        assert_eq!(stats.v5.std, 0.0);
        assert_eq!(stats.auxiliary.len(), 1);
        assert_eq!(stats.auxiliary[0].0, "roe");
        assert_eq!(stats.auxiliary[0].1.mean, 2.0);
    }

    #[test]
    fn from_train_rejects_empty_partition() {
        let err = FeatureStats::from_train(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyPanel { .. }));
    }

    #[test]
    fn from_train_rejects_unknown_auxiliary() {
        let err = FeatureStats::from_train(&[row(0.1, 1.0)], &columns(&["roa"]), &columns(&["bm"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }
}

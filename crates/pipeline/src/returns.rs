//! Trailing return and volatility statistics per security.
//!
//! Prices are pivoted into a wide (date × security) matrix over the union of
//! trading dates, percentage returns are taken per column, and rolling
//! statistics are annualized and reshaped back into a long
//! (security, date)-keyed series. Entries without enough history are absent.

use chrono::NaiveDate;
use optionset_core::{EntityId, PriceRecord};
use std::collections::{BTreeSet, HashMap};

/// Window lengths of the rolling volatility features, in trading days.
pub const VOLATILITY_WINDOWS: [usize; 4] = [5, 20, 60, 110];

/// Window length of the rolling mean return feature.
pub const MEAN_WINDOW: usize = 110;

/// Annualized trailing statistics of one security on one date.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedValues {
    pub returns: Option<f64>,
    pub v110: Option<f64>,
    pub v60: Option<f64>,
    pub v20: Option<f64>,
    pub v5: Option<f64>,
}

impl DerivedValues {
    fn set_volatility(&mut self, window: usize, value: f64) {
        match window {
            5 => self.v5 = Some(value),
            20 => self.v20 = Some(value),
            60 => self.v60 = Some(value),
            110 => self.v110 = Some(value),
            _ => {}
        }
    }
}

/// Long-format derived series keyed by (security, date).
#[derive(Debug, Clone, Default)]
pub struct DerivedSeries {
    values: HashMap<(EntityId, NaiveDate), DerivedValues>,
}

impl DerivedSeries {
    #[must_use]
    pub fn get(&self, permno: EntityId, date: NaiveDate) -> Option<&DerivedValues> {
        self.values.get(&(permno, date))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Wide price matrix: one column per security over the union of dates.
#[derive(Debug, Clone, Default)]
pub struct PriceMatrix {
    pub dates: Vec<NaiveDate>,
    pub entities: Vec<EntityId>,
    /// `columns[e][t]` is the price of `entities[e]` on `dates[t]`.
    pub columns: Vec<Vec<Option<f64>>>,
}

impl PriceMatrix {
    /// Pivots long price records; a repeated (date, security) keeps the last price.
    #[must_use]
    pub fn from_records(prices: &[PriceRecord]) -> Self {
        let dates: Vec<NaiveDate> = prices
            .iter()
            .map(|p| p.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let entities: Vec<EntityId> = prices
            .iter()
            .map(|p| p.permno)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let date_idx: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let entity_idx: HashMap<EntityId, usize> =
            entities.iter().enumerate().map(|(i, e)| (*e, i)).collect();

        let mut columns = vec![vec![None; dates.len()]; entities.len()];
        for p in prices {
            columns[entity_idx[&p.permno]][date_idx[&p.date]] = p.prc;
        }

        Self {
            dates,
            entities,
            columns,
        }
    }
}

/// Percentage change between consecutive rows.
///
/// Missing prices are forward-filled before differencing, so a gap yields a
/// zero return rather than breaking the window. Leading gaps stay missing.
#[must_use]
pub fn pct_change(prices: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last: Option<f64> = None;
    prices
        .iter()
        .map(|&price| {
            let filled = price.or(last);
            let change = match (last, filled) {
                (Some(prev), Some(cur)) => Some(cur / prev - 1.0),
                _ => None,
            };
            last = filled;
            change
        })
        .collect()
}

fn window_values(values: &[Option<f64>], end: usize, window: usize) -> Option<Vec<f64>> {
    if window == 0 || end + 1 < window {
        return None;
    }
    values[end + 1 - window..=end].iter().copied().collect()
}

/// Trailing mean over `window` rows; undefined unless every value is present.
#[must_use]
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|end| {
            window_values(values, end, window).map(|w| w.iter().sum::<f64>() / w.len() as f64)
        })
        .collect()
}

/// Trailing sample standard deviation (n − 1 denominator) over `window` rows.
#[must_use]
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|end| {
            let w = window_values(values, end, window)?;
            if w.len() < 2 {
                return None;
            }
            let mean = w.iter().sum::<f64>() / w.len() as f64;
            let variance =
                w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
            Some(variance.sqrt())
        })
        .collect()
}

/// Infinite statistics (zero-price denominators) become zero, NaN becomes missing.
fn sanitize(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else if value.is_infinite() {
        Some(0.0)
    } else {
        Some(value)
    }
}

/// Computes annualized rolling returns and volatilities for every security.
#[must_use]
pub fn compute_derived_series(prices: &[PriceRecord], annualization: f64) -> DerivedSeries {
    let matrix = PriceMatrix::from_records(prices);
    let vol_scale = annualization.sqrt();
    let mut values: HashMap<(EntityId, NaiveDate), DerivedValues> = HashMap::new();

    for (permno, column) in matrix.entities.iter().zip(&matrix.columns) {
        let returns = pct_change(column);

        let mean = rolling_mean(&returns, MEAN_WINDOW);
        for (date, m) in matrix.dates.iter().zip(mean) {
            if let Some(m) = m.and_then(|m| sanitize(m * annualization)) {
                values.entry((*permno, *date)).or_default().returns = Some(m);
            }
        }

        for window in VOLATILITY_WINDOWS {
            let std = rolling_std(&returns, window);
            for (date, s) in matrix.dates.iter().zip(std) {
                if let Some(s) = s.and_then(|s| sanitize(s * vol_scale)) {
                    values
                        .entry((*permno, *date))
                        .or_default()
                        .set_volatility(window, s);
                }
            }
        }
    }

    tracing::info!(
        entities = matrix.entities.len(),
        dates = matrix.dates.len(),
        entries = values.len(),
        "Calculated returns and volatilities"
    );

    DerivedSeries { values }
}

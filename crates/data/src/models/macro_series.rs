use chrono::NaiveDate;
use optionset_core::MacroObservation;
use serde::Deserialize;

use crate::dates::de_date;

/// `treasury.csv`: 3-month constant maturity rate, as published.
#[derive(Debug, Clone, Deserialize)]
pub struct TreasuryRow {
    #[serde(alias = "Date", deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(alias = "Value")]
    pub value: Option<f64>,
}

/// `vix.csv`: front-month volatility index futures; only the close is used.
#[derive(Debug, Clone, Deserialize)]
pub struct VixRow {
    #[serde(alias = "Trade Date", deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(alias = "Close")]
    pub close: Option<f64>,
}

impl From<TreasuryRow> for MacroObservation {
    fn from(row: TreasuryRow) -> Self {
        Self {
            date: row.date,
            value: row.value,
        }
    }
}

impl From<VixRow> for MacroObservation {
    fn from(row: VixRow) -> Self {
        Self {
            date: row.date,
            value: row.close,
        }
    }
}

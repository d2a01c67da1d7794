use chrono::NaiveDate;
use optionset_core::{EntityId, OptionQuote, PriceRecord};
use serde::Deserialize;

use crate::dates::de_date;

/// `prices.csv`: one closing price per security and trading day.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRow {
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    pub permno: EntityId,
    pub prc: Option<f64>,
}

impl From<PriceRow> for PriceRecord {
    fn from(row: PriceRow) -> Self {
        Self {
            date: row.date,
            permno: row.permno,
            prc: row.prc,
        }
    }
}

/// `options_<year>.csv`. The security column is `id` in raw vendor exports.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionRow {
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(alias = "id")]
    pub permno: EntityId,
    pub days: i64,
    pub option_price: Option<f64>,
    pub impl_volatility: Option<f64>,
    pub delta: Option<f64>,
    pub strike_price: f64,
}

impl From<OptionRow> for OptionQuote {
    fn from(row: OptionRow) -> Self {
        Self {
            date: row.date,
            permno: row.permno,
            days: row.days,
            option_price: row.option_price,
            impl_volatility: row.impl_volatility,
            delta: row.delta,
            strike_price: row.strike_price,
        }
    }
}

use chrono::NaiveDate;
use optionset_core::{DividendRecord, EntityId, NameRecord};
use serde::Deserialize;

use crate::dates::{de_date, de_opt_date};

/// `names.csv`: company name history, one row per validity interval.
#[derive(Debug, Clone, Deserialize)]
pub struct NameRow {
    pub permno: EntityId,
    pub comnam: Option<String>,
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub namedt: Option<NaiveDate>,
    #[serde(deserialize_with = "de_date")]
    pub nameenddt: NaiveDate,
}

impl From<NameRow> for NameRecord {
    fn from(row: NameRow) -> Self {
        Self {
            permno: row.permno,
            comnam: row.comnam.filter(|s| !s.trim().is_empty()),
            ticker: row.ticker.filter(|s| !s.trim().is_empty()),
            namedt: row.namedt,
            nameenddt: row.nameenddt,
        }
    }
}

/// `dividends.csv`: declared cash distributions.
#[derive(Debug, Clone, Deserialize)]
pub struct DividendRow {
    pub permno: EntityId,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub paydt: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub dclrdt: Option<NaiveDate>,
    pub divamt: Option<f64>,
}

impl From<DividendRow> for DividendRecord {
    fn from(row: DividendRow) -> Self {
        Self {
            permno: row.permno,
            paydt: row.paydt,
            dclrdt: row.dclrdt,
            divamt: row.divamt,
        }
    }
}

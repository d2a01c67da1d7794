use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// Security identifier (CRSP `permno`).
pub type EntityId = i64;

/// Number of Fama-French industry categories carried as one-hot columns.
pub const INDUSTRY_COUNT: usize = 49;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[default]
    Call,
    Put,
}

impl FromStr for OptionType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "call" | "c" => Ok(Self::Call),
            "put" | "p" => Ok(Self::Put),
            _ => Err(PipelineError::InvalidOptionType(s.to_string())),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

/// Daily closing price of one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub permno: EntityId,
    pub prc: Option<f64>,
}

/// End-of-day quote for one option contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub date: NaiveDate,
    pub permno: EntityId,
    /// Calendar days until expiry.
    pub days: i64,
    pub option_price: Option<f64>,
    pub impl_volatility: Option<f64>,
    pub delta: Option<f64>,
    pub strike_price: f64,
}

/// A date-keyed macro observation (treasury rate, volatility index close).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroObservation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Monthly firm ratios. `values` is aligned with the configured fundamental columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRecord {
    pub permno: EntityId,
    pub public_date: NaiveDate,
    /// Fama-French 49 industry code, 1..=49.
    pub ffi49: Option<i64>,
    pub values: Vec<Option<f64>>,
}

impl FundamentalRecord {
    /// One-hot slot of the industry code, `None` when unclassified.
    #[must_use]
    pub fn industry_slot(&self) -> Option<usize> {
        industry_slot(self.ffi49)
    }
}

/// Maps an FFI49 code onto its one-hot slot (`code - 1`).
#[must_use]
pub fn industry_slot(code: Option<i64>) -> Option<usize> {
    match code {
        Some(c) if (1..=INDUSTRY_COUNT as i64).contains(&c) => Some((c - 1) as usize),
        _ => None,
    }
}

/// Expands an industry slot into a dense 0/1 vector.
#[must_use]
pub fn industry_one_hot(slot: Option<usize>) -> [f64; INDUSTRY_COUNT] {
    let mut dummies = [0.0; INDUSTRY_COUNT];
    if let Some(i) = slot.filter(|&i| i < INDUSTRY_COUNT) {
        dummies[i] = 1.0;
    }
    dummies
}

/// One name-validity interval of a security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRecord {
    pub permno: EntityId,
    pub comnam: Option<String>,
    pub ticker: Option<String>,
    pub namedt: Option<NaiveDate>,
    pub nameenddt: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendRecord {
    pub permno: EntityId,
    pub paydt: Option<NaiveDate>,
    pub dclrdt: Option<NaiveDate>,
    pub divamt: Option<f64>,
}

/// Every source table needed for one run, read once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub prices: Vec<PriceRecord>,
    pub options: Vec<OptionQuote>,
    pub treasury: Vec<MacroObservation>,
    pub vix: Vec<MacroObservation>,
    pub fundamentals: Vec<FundamentalRecord>,
    /// Column names matching `FundamentalRecord::values`.
    pub fundamental_columns: Vec<String>,
    pub names: Vec<NameRecord>,
    pub dividends: Vec<DividendRecord>,
}

/// A fully joined, fully derived observation of one option contract on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    pub date: NaiveDate,
    pub permno: EntityId,
    pub strike_price: f64,
    pub expiration_date: NaiveDate,
    pub days: i64,
    pub option_price: f64,
    pub impl_volatility: f64,
    pub delta: f64,
    pub prc: f64,
    pub prc_shifted_1: f64,
    pub returns: f64,
    pub v110: f64,
    pub v60: f64,
    pub v20: f64,
    pub v5: f64,
    pub r: f64,
    pub vix: f64,
    pub fundamentals: Vec<f64>,
    pub industry: Option<usize>,
    pub comnam: String,
    pub ticker: String,
    pub option_price_shifted_1: f64,
    pub moneyness: f64,
    pub scaled_option_price: f64,
    pub scaled_option_price_shifted_1: f64,
    pub perfect_hedge_1: f64,
    pub p_value_change_1: f64,
}

/// An artificial boundary-condition contract.
///
/// Implied volatility is not a field: no market quote exists, so writers
/// always emit it as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticRecord {
    /// Time to expiry; zero at maturity, otherwise a year fraction.
    pub days: f64,
    pub option_price: f64,
    pub delta: f64,
    pub strike_price: f64,
    pub prc: f64,
    pub returns: f64,
    pub v110: f64,
    pub v60: f64,
    pub v20: f64,
    pub v5: f64,
    pub r: f64,
    pub moneyness: f64,
    pub scaled_option_price: f64,
    pub vix: f64,
    pub industry: usize,
    /// Values of the auxiliary fundamental columns, in configured order.
    pub auxiliary: Vec<f64>,
}

impl SyntheticRecord {
    #[must_use]
    pub const fn impl_volatility(&self) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_type_parses_case_insensitively() {
        assert_eq!("CALL".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!("put".parse::<OptionType>().unwrap(), OptionType::Put);
    }

    #[test]
    fn option_type_rejects_unknown_value() {
        let err = "straddle".parse::<OptionType>().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidOptionType(ref s) if s == "straddle"));
    }

    #[test]
    fn option_type_display_round_trips() {
        assert_eq!(OptionType::Put.to_string(), "put");
        assert_eq!(OptionType::Call.to_string().parse::<OptionType>().unwrap(), OptionType::Call);
    }

    #[test]
    fn option_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OptionType::Put).unwrap(), "\"put\"");
        let parsed: OptionType = serde_json::from_str("\"call\"").unwrap();
        assert_eq!(parsed, OptionType::Call);
    }

    #[test]
    fn industry_slot_maps_codes_to_zero_based_slots() {
        assert_eq!(industry_slot(Some(1)), Some(0));
        assert_eq!(industry_slot(Some(49)), Some(48));
        assert_eq!(industry_slot(Some(0)), None);
        assert_eq!(industry_slot(Some(50)), None);
        assert_eq!(industry_slot(None), None);
    }

    #[test]
    fn industry_one_hot_sets_exactly_one_slot() {
        let dummies = industry_one_hot(Some(7));
        assert_eq!(dummies.iter().sum::<f64>(), 1.0);
        assert_eq!(dummies[7], 1.0);
    }

    #[test]
    fn industry_one_hot_unclassified_is_all_zero() {
        assert!(industry_one_hot(None).iter().all(|&v| v == 0.0));
    }
}

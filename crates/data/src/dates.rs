//! Lenient date parsing for source tables.
//!
//! Exports from different vendors disagree on date formats: plain ISO dates,
//! ISO timestamps, and compact `YYYYMMDD` all occur.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Parses `YYYY-MM-DD` (optionally followed by a time part) or `YYYYMMDD`.
///
/// # Errors
/// Returns the chrono parse error of the ISO attempt when neither format matches.
pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|err| NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|_| err))
}

pub fn de_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(|e| serde::de::Error::custom(format!("invalid date '{raw}': {e}")))
}

pub fn de_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_date(&raw)
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid date '{raw}': {e}"))),
        _ => Ok(None),
    }
}

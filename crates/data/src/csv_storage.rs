use anyhow::{Context, Result};
use chrono::Duration;
use csv::Writer;
use optionset_core::{
    DatasetSink, DividendRecord, FundamentalRecord, MacroObservation, NameRecord, OptionQuote,
    PanelRow, PipelineError, PriceRecord, SourceStore, SyntheticRecord,
};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::dates::parse_date;
use crate::models::{DividendRow, NameRow, OptionRow, PriceRow, TreasuryRow, VixRow};
use crate::schema::{panel_columns, synthetic_columns, Column};

pub const PRICES_FILE: &str = "prices.csv";
pub const TREASURY_FILE: &str = "treasury.csv";
pub const VIX_FILE: &str = "vix.csv";
pub const RATIOS_FILE: &str = "ratios.csv";
pub const NAMES_FILE: &str = "names.csv";
pub const DIVIDENDS_FILE: &str = "dividends.csv";

/// File holding the options quotes of one year.
#[must_use]
pub fn options_file(year: i32) -> String {
    format!("options_{year}.csv")
}

/// Source tables stored as CSV files in one directory.
#[derive(Debug, Clone)]
pub struct CsvSourceStore {
    dir: PathBuf,
}

impl CsvSourceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn open(&self, table: &str, file: &str) -> Result<csv::Reader<File>> {
        let path = self.dir.join(file);
        let reader = csv::Reader::from_path(&path)
            .map_err(|e| PipelineError::source_read(table, format!("{}: {e}", path.display())))?;
        Ok(reader)
    }

    fn read_rows<R, T>(&self, table: &str, file: &str) -> Result<Vec<T>>
    where
        R: DeserializeOwned,
        T: From<R>,
    {
        let mut reader = self.open(table, file)?;
        let mut records = Vec::new();
        for (i, result) in reader.deserialize::<R>().enumerate() {
            // header is line 1
            let row = result.with_context(|| format!("Invalid row {} in {table} table", i + 2))?;
            records.push(T::from(row));
        }
        tracing::debug!(table, file, rows = records.len(), "Read source table");
        Ok(records)
    }
}

fn parse_optional_number(raw: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some)
}

/// Integral industry codes only; `36.7` is corrupt, not industry 36.
fn industry_code(code: f64) -> Option<i64> {
    (code.fract() == 0.0 && code.abs() <= i64::MAX as f64).then(|| code as i64)
}

fn has_valid_expiry(quote: &OptionQuote) -> bool {
    Duration::try_days(quote.days)
        .and_then(|d| quote.date.checked_add_signed(d))
        .is_some()
}

impl SourceStore for CsvSourceStore {
    fn prices(&self) -> Result<Vec<PriceRecord>> {
        self.read_rows::<PriceRow, _>("prices", PRICES_FILE)
    }

    fn options(&self, year: i32) -> Result<Vec<OptionQuote>> {
        let table = format!("options{year}");
        let quotes = self.read_rows::<OptionRow, _>(&table, &options_file(year))?;
        if let Some((i, quote)) = quotes.iter().enumerate().find(|(_, q)| !has_valid_expiry(q)) {
            return Err(PipelineError::source_read(
                table,
                format!(
                    "row {}: days {} past {} is not a valid expiration date",
                    i + 2,
                    quote.days,
                    quote.date
                ),
            )
            .into());
        }
        Ok(quotes)
    }

    fn treasury(&self) -> Result<Vec<MacroObservation>> {
        self.read_rows::<TreasuryRow, _>("treasury", TREASURY_FILE)
    }

    fn vix(&self) -> Result<Vec<MacroObservation>> {
        self.read_rows::<VixRow, _>("vix", VIX_FILE)
    }

    /// Ratios carry a configurable set of columns, so they are read by header
    /// position rather than through a fixed row struct.
    fn fundamentals(&self, columns: &[String]) -> Result<Vec<FundamentalRecord>> {
        const TABLE: &str = "ratios";
        let mut reader = self.open(TABLE, RATIOS_FILE)?;
        let headers = reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PipelineError::missing_column(TABLE, name))
        };

        let permno_idx = position("permno")?;
        let date_idx = position("public_date")?;
        let industry_idx = position("ffi49")?;
        let value_idx = columns
            .iter()
            .map(|c| position(c.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let line = i + 2;
            let record = result?;
            let field = |idx: usize| record.get(idx).unwrap_or("");

            let permno = field(permno_idx)
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid permno in {TABLE} line {line}"))?;
            let public_date = parse_date(field(date_idx))
                .with_context(|| format!("Invalid public_date in {TABLE} line {line}"))?;
            let ffi49 = parse_optional_number(field(industry_idx))
                .with_context(|| format!("Invalid ffi49 in {TABLE} line {line}"))?
                .map(|code| industry_code(code).ok_or(code))
                .transpose()
                .map_err(|code| {
                    PipelineError::source_read(
                        TABLE,
                        format!("line {line}: ffi49 {code} is not an integral industry code"),
                    )
                })?;
            let values = value_idx
                .iter()
                .zip(columns)
                .map(|(&idx, name)| {
                    parse_optional_number(field(idx))
                        .with_context(|| format!("Invalid {name} in {TABLE} line {line}"))
                })
                .collect::<Result<Vec<_>>>()?;

            records.push(FundamentalRecord {
                permno,
                public_date,
                ffi49,
                values,
            });
        }
        Ok(records)
    }

    fn names(&self) -> Result<Vec<NameRecord>> {
        self.read_rows::<NameRow, _>("names", NAMES_FILE)
    }

    fn dividends(&self) -> Result<Vec<DividendRecord>> {
        self.read_rows::<DividendRow, _>("dividends", DIVIDENDS_FILE)
    }
}

/// Writes output tables as CSV files, `<dir>/<table>.csv`.
#[derive(Debug, Clone)]
pub struct CsvStorage {
    dir: PathBuf,
}

impl CsvStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes columns to a CSV file with a header row.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_columns(path: &Path, columns: &[Column]) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record(columns.iter().map(|c| c.name.as_str()))?;

        let rows = columns.first().map_or(0, |c| c.values.len());
        for row in 0..rows {
            writer.write_record(columns.iter().map(|c| c.values.cell(row)))?;
        }

        writer.flush()?;
        Ok(())
    }

    fn path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }
}

impl DatasetSink for CsvStorage {
    fn write_panel(
        &mut self,
        table: &str,
        rows: &[PanelRow],
        fundamental_columns: &[String],
    ) -> Result<()> {
        Self::write_columns(&self.path(table), &panel_columns(rows, fundamental_columns))
    }

    fn write_synthetic(
        &mut self,
        table: &str,
        rows: &[SyntheticRecord],
        auxiliary_columns: &[String],
    ) -> Result<()> {
        Self::write_columns(&self.path(table), &synthetic_columns(rows, auxiliary_columns))
    }
}

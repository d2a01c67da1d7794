//! Per-table coverage of loaded source data.

use chrono::NaiveDate;
use optionset_core::{EntityId, SourceTables};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table: String,
    pub rows: usize,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    /// Distinct securities; `None` for tables keyed by date only.
    pub entities: Option<usize>,
}

impl TableStatus {
    fn new<T>(table: &str, rows: &[T], date: impl Fn(&T) -> Option<NaiveDate>) -> Self {
        Self {
            table: table.to_string(),
            rows: rows.len(),
            earliest: rows.iter().filter_map(&date).min(),
            latest: rows.iter().filter_map(&date).max(),
            entities: None,
        }
    }

    fn with_entities<T>(mut self, rows: &[T], entity: impl Fn(&T) -> EntityId) -> Self {
        self.entities = Some(rows.iter().map(entity).collect::<HashSet<_>>().len());
        self
    }

    fn format_date(date: Option<NaiveDate>) -> String {
        date.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    /// One aligned report line.
    #[must_use]
    pub fn report_line(&self) -> String {
        format!(
            "{:<12} {:>10} rows  {} .. {}  {}",
            self.table,
            self.rows,
            Self::format_date(self.earliest),
            Self::format_date(self.latest),
            self.entities
                .map(|n| format!("{n} entities"))
                .unwrap_or_default()
        )
    }
}

/// Summarizes every loaded table.
#[must_use]
pub fn summarize(tables: &SourceTables) -> Vec<TableStatus> {
    vec![
        TableStatus::new("prices", &tables.prices, |r| Some(r.date))
            .with_entities(&tables.prices, |r| r.permno),
        TableStatus::new("options", &tables.options, |r| Some(r.date))
            .with_entities(&tables.options, |r| r.permno),
        TableStatus::new("treasury", &tables.treasury, |r| Some(r.date)),
        TableStatus::new("vix", &tables.vix, |r| Some(r.date)),
        TableStatus::new("ratios", &tables.fundamentals, |r| Some(r.public_date))
            .with_entities(&tables.fundamentals, |r| r.permno),
        TableStatus::new("names", &tables.names, |r| Some(r.nameenddt))
            .with_entities(&tables.names, |r| r.permno),
        TableStatus::new("dividends", &tables.dividends, |r| r.paydt)
            .with_entities(&tables.dividends, |r| r.permno),
    ]
}

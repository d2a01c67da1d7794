//! Keyed joins of the source tables into one denormalized panel.
//!
//! Join order is fixed: options ⋈ prices, derived series (assignment),
//! treasury and vix (by date), fundamentals (by permno and month end of the
//! trade date), then names. Every join except the derived-series assignment is
//! inner; a key that matches with a missing value is kept and left for the
//! missing-value policy to drop.

use chrono::NaiveDate;
use optionset_core::{
    EntityId, FundamentalRecord, MacroObservation, NameRecord, OptionQuote, PipelineError,
    PriceRecord,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::calendar::{month_end, NextPeriod};
use crate::returns::DerivedSeries;

/// A closing price together with the next period's close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftedPrice {
    pub prc: Option<f64>,
    pub prc_shifted_1: Option<f64>,
}

/// One option quote carrying every joined field. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub date: NaiveDate,
    pub permno: EntityId,
    pub strike_price: f64,
    pub days: i64,
    pub option_price: Option<f64>,
    pub impl_volatility: Option<f64>,
    pub delta: Option<f64>,
    pub prc: Option<f64>,
    pub prc_shifted_1: Option<f64>,
    pub returns: Option<f64>,
    pub v110: Option<f64>,
    pub v60: Option<f64>,
    pub v20: Option<f64>,
    pub v5: Option<f64>,
    pub r: Option<f64>,
    pub vix: Option<f64>,
    pub fundamentals: Vec<Option<f64>>,
    pub industry: Option<usize>,
    pub comnam: Option<String>,
    pub ticker: Option<String>,
}

impl MergedRow {
    fn from_quote(quote: &OptionQuote, price: ShiftedPrice) -> Self {
        Self {
            date: quote.date,
            permno: quote.permno,
            strike_price: quote.strike_price,
            days: quote.days,
            option_price: quote.option_price,
            impl_volatility: quote.impl_volatility,
            delta: quote.delta,
            prc: price.prc,
            prc_shifted_1: price.prc_shifted_1,
            returns: None,
            v110: None,
            v60: None,
            v20: None,
            v5: None,
            r: None,
            vix: None,
            fundamentals: Vec::new(),
            industry: None,
            comnam: None,
            ticker: None,
        }
    }
}

fn non_empty(rows: Vec<MergedRow>, stage: &str) -> Result<Vec<MergedRow>, PipelineError> {
    tracing::info!(stage, rows = rows.len(), "Join complete");
    if rows.is_empty() {
        Err(PipelineError::empty_panel(stage))
    } else {
        Ok(rows)
    }
}

/// Attaches the next period's close to every price, per security.
///
/// A repeated (date, permno) keeps the last record.
#[must_use]
pub fn shift_prices(
    prices: &[PriceRecord],
    next: &NextPeriod<'_>,
) -> HashMap<(NaiveDate, EntityId), ShiftedPrice> {
    let mut by_entity: HashMap<EntityId, Vec<&PriceRecord>> = HashMap::new();
    for p in prices {
        by_entity.entry(p.permno).or_default().push(p);
    }

    let mut shifted = HashMap::with_capacity(prices.len());
    for (permno, mut group) in by_entity {
        group.sort_by_key(|p| p.date);
        for idx in 0..group.len() {
            let current = group[idx];
            let prc_shifted_1 = next.shifted(group.as_slice(), idx, |p| p.date, |p| p.prc);
            shifted.insert(
                (current.date, permno),
                ShiftedPrice {
                    prc: current.prc,
                    prc_shifted_1,
                },
            );
        }
    }
    shifted
}

/// Inner join of option quotes with prices on (date, permno).
///
/// # Errors
///
/// Returns `EmptyPanel` when no quote has a matching price.
pub fn join_prices(
    options: &[OptionQuote],
    prices: &HashMap<(NaiveDate, EntityId), ShiftedPrice>,
) -> Result<Vec<MergedRow>, PipelineError> {
    tracing::info!("Merging with prices data");
    let rows = options
        .iter()
        .filter_map(|q| {
            prices
                .get(&(q.date, q.permno))
                .map(|price| MergedRow::from_quote(q, *price))
        })
        .collect();
    non_empty(rows, "prices")
}

/// Assigns returns and volatilities; rows without history keep `None`.
#[must_use]
pub fn attach_derived(mut rows: Vec<MergedRow>, derived: &DerivedSeries) -> Vec<MergedRow> {
    for row in &mut rows {
        if let Some(values) = derived.get(row.permno, row.date) {
            row.returns = values.returns;
            row.v110 = values.v110;
            row.v60 = values.v60;
            row.v20 = values.v20;
            row.v5 = values.v5;
        }
    }
    rows
}

fn index_by_date(series: &[MacroObservation]) -> HashMap<NaiveDate, Option<f64>> {
    let mut index = HashMap::with_capacity(series.len());
    for obs in series {
        index.entry(obs.date).or_insert(obs.value);
    }
    index
}

/// Inner joins the treasury rate and the volatility index by trade date.
///
/// # Errors
///
/// Returns `EmptyPanel` when a macro series shares no date with the panel.
pub fn join_macro(
    rows: Vec<MergedRow>,
    treasury: &[MacroObservation],
    vix: &[MacroObservation],
) -> Result<Vec<MergedRow>, PipelineError> {
    tracing::info!("Merging with treasury and vix data");
    let treasury = index_by_date(treasury);
    let rows: Vec<MergedRow> = rows
        .into_iter()
        .filter_map(|mut row| {
            row.r = *treasury.get(&row.date)?;
            Some(row)
        })
        .collect();
    let rows = non_empty(rows, "treasury")?;

    let vix = index_by_date(vix);
    let rows = rows
        .into_iter()
        .filter_map(|mut row| {
            row.vix = *vix.get(&row.date)?;
            Some(row)
        })
        .collect();
    non_empty(rows, "vix")
}

/// Inner joins fundamentals on (permno, month end of the trade date).
///
/// Ratios are published as of month end; the first record for a key wins.
///
/// # Errors
///
/// Returns `EmptyPanel` when no row finds its month's ratios.
pub fn join_fundamentals(
    rows: Vec<MergedRow>,
    fundamentals: &[FundamentalRecord],
) -> Result<Vec<MergedRow>, PipelineError> {
    tracing::info!("Merging with fundamentals data");
    let mut index: HashMap<(EntityId, NaiveDate), &FundamentalRecord> = HashMap::new();
    let mut duplicates = 0usize;
    for record in fundamentals {
        match index.entry((record.permno, record.public_date)) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(_) => duplicates += 1,
        }
    }
    if duplicates > 0 {
        tracing::warn!(duplicates, "Ignoring duplicate fundamentals records");
    }

    let rows = rows
        .into_iter()
        .filter_map(|mut row| {
            let record = index.get(&(row.permno, month_end(row.date)))?;
            row.fundamentals.clone_from(&record.values);
            row.industry = record.industry_slot();
            Some(row)
        })
        .collect();
    non_empty(rows, "fundamentals")
}

/// Most recent name interval per security: latest `nameenddt`, then latest `namedt`.
#[must_use]
pub fn latest_names(names: &[NameRecord]) -> HashMap<EntityId, &NameRecord> {
    let mut latest: HashMap<EntityId, &NameRecord> = HashMap::new();
    for name in names {
        match latest.entry(name.permno) {
            Entry::Vacant(slot) => {
                slot.insert(name);
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if (name.nameenddt, name.namedt) > (current.nameenddt, current.namedt) {
                    slot.insert(name);
                }
            }
        }
    }
    latest
}

/// Inner joins the current company name and ticker by permno.
///
/// # Errors
///
/// Returns `EmptyPanel` when no security has a name record.
pub fn join_names(
    rows: Vec<MergedRow>,
    names: &[NameRecord],
) -> Result<Vec<MergedRow>, PipelineError> {
    tracing::info!("Merging with names data");
    let latest = latest_names(names);
    let rows = rows
        .into_iter()
        .filter_map(|mut row| {
            let name = latest.get(&row.permno)?;
            row.comnam.clone_from(&name.comnam);
            row.ticker.clone_from(&name.ticker);
            Some(row)
        })
        .collect();
    non_empty(rows, "names")
}

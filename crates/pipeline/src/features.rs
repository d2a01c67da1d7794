//! Contract-level features: expiry, next-period option price, moneyness,
//! scaled prices and the hindsight perfect hedge.

use chrono::{Duration, NaiveDate};
use optionset_core::{EntityId, PanelRow};
use std::collections::HashMap;

use crate::calendar::NextPeriod;
use crate::merge::MergedRow;

/// A merged row with its contract features. Features stay `None` while any
/// input is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub merged: MergedRow,
    pub expiration_date: NaiveDate,
    pub option_price_shifted_1: Option<f64>,
    pub moneyness: Option<f64>,
    pub scaled_option_price: Option<f64>,
    pub scaled_option_price_shifted_1: Option<f64>,
    pub perfect_hedge_1: Option<f64>,
    pub p_value_change_1: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub rows: Vec<FeatureRow>,
    /// Infinite ratios that were replaced by zero.
    pub infinite_replaced: usize,
}

/// Panel rows that survived the missing-value policy.
#[derive(Debug, Clone, Default)]
pub struct CompletePanel {
    pub rows: Vec<PanelRow>,
    /// Share of input rows dropped, in `[0, 1]`.
    pub dropped_fraction: f64,
}

/// Trade date plus `days` calendar days; `None` when the result is not a
/// representable date.
#[must_use]
pub fn expiration_date(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|d| date.checked_add_signed(d))
}

/// Hedge ratio that cancels the underlying's move with the option's move:
/// `-(Δprice) / (Δoption)`. An unchanged option price gives zero.
#[must_use]
pub fn perfect_hedge(price_change: f64, option_change: f64) -> f64 {
    if option_change == 0.0 {
        0.0
    } else {
        -price_change / option_change
    }
}

/// Residual value change of the hedged position; zero up to rounding unless
/// the hedge was clamped.
#[must_use]
pub fn hedged_value_change(price_change: f64, hedge: f64, option_change: f64) -> f64 {
    price_change + hedge * option_change
}

fn finite_or_zero(value: f64, replaced: &mut usize) -> f64 {
    if value.is_infinite() {
        *replaced += 1;
        0.0
    } else {
        value
    }
}

type ContractKey = (EntityId, u64, NaiveDate);

/// Computes expiry and the next-period option price per contract, then every
/// ratio feature whose inputs are present.
#[must_use]
pub fn derive_features(rows: Vec<MergedRow>, next: &NextPeriod<'_>) -> FeatureSet {
    tracing::info!("Computing expiration date and shifting option_price");

    let total = rows.len();
    let mut rows: Vec<FeatureRow> = rows
        .into_iter()
        .filter_map(|merged| {
            Some(FeatureRow {
                expiration_date: expiration_date(merged.date, merged.days)?,
                merged,
                option_price_shifted_1: None,
                moneyness: None,
                scaled_option_price: None,
                scaled_option_price_shifted_1: None,
                perfect_hedge_1: None,
                p_value_change_1: None,
            })
        })
        .collect();
    if rows.len() < total {
        tracing::warn!(
            dropped = total - rows.len(),
            "Dropping quotes with unrepresentable expiration dates"
        );
    }

    let mut contracts: HashMap<ContractKey, Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let key = (
            row.merged.permno,
            row.merged.strike_price.to_bits(),
            row.expiration_date,
        );
        contracts.entry(key).or_default().push(idx);
    }

    for group in contracts.values_mut() {
        group.sort_by_key(|&idx| rows[idx].merged.date);
        let shifted: Vec<Option<f64>> = (0..group.len())
            .map(|pos| {
                next.shifted(
                    group.as_slice(),
                    pos,
                    |&idx| rows[idx].merged.date,
                    |&idx| rows[idx].merged.option_price,
                )
            })
            .collect();
        for (&idx, value) in group.iter().zip(shifted) {
            rows[idx].option_price_shifted_1 = value;
        }
    }

    let mut infinite_replaced = 0;
    for row in &mut rows {
        let strike = row.merged.strike_price;
        let mut ratio = |numerator: Option<f64>| {
            numerator.map(|n| finite_or_zero(n / strike, &mut infinite_replaced))
        };
        row.moneyness = ratio(row.merged.prc);
        row.scaled_option_price = ratio(row.merged.option_price);
        row.scaled_option_price_shifted_1 = ratio(row.option_price_shifted_1);

        if let (Some(prc), Some(prc_next), Some(opt), Some(opt_next)) = (
            row.merged.prc,
            row.merged.prc_shifted_1,
            row.merged.option_price,
            row.option_price_shifted_1,
        ) {
            let price_change = prc_next - prc;
            let option_change = opt_next - opt;
            if option_change == 0.0 {
                infinite_replaced += 1;
            }
            let hedge = perfect_hedge(price_change, option_change);
            row.perfect_hedge_1 = Some(hedge);
            row.p_value_change_1 = Some(hedged_value_change(price_change, hedge, option_change));
        }
    }

    if infinite_replaced > 0 {
        tracing::warn!(infinite_replaced, "Replaced infinite values with zero");
    }

    FeatureSet {
        rows,
        infinite_replaced,
    }
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Converts a row into a panel row, or `None` if any value is missing.
#[must_use]
pub fn complete(row: FeatureRow) -> Option<PanelRow> {
    let m = row.merged;
    Some(PanelRow {
        date: m.date,
        permno: m.permno,
        strike_price: present(Some(m.strike_price))?,
        expiration_date: row.expiration_date,
        days: m.days,
        option_price: present(m.option_price)?,
        impl_volatility: present(m.impl_volatility)?,
        delta: present(m.delta)?,
        prc: present(m.prc)?,
        prc_shifted_1: present(m.prc_shifted_1)?,
        returns: present(m.returns)?,
        v110: present(m.v110)?,
        v60: present(m.v60)?,
        v20: present(m.v20)?,
        v5: present(m.v5)?,
        r: present(m.r)?,
        vix: present(m.vix)?,
        fundamentals: m
            .fundamentals
            .into_iter()
            .map(present)
            .collect::<Option<Vec<f64>>>()?,
        industry: m.industry,
        comnam: m.comnam?,
        ticker: m.ticker?,
        option_price_shifted_1: present(row.option_price_shifted_1)?,
        moneyness: present(row.moneyness)?,
        scaled_option_price: present(row.scaled_option_price)?,
        scaled_option_price_shifted_1: present(row.scaled_option_price_shifted_1)?,
        perfect_hedge_1: present(row.perfect_hedge_1)?,
        p_value_change_1: present(row.p_value_change_1)?,
    })
}

/// Drops every row with a missing value and sorts the rest by
/// (date, permno, strike, expiry).
#[must_use]
pub fn drop_incomplete(features: FeatureSet) -> CompletePanel {
    let total = features.rows.len();
    let mut rows: Vec<PanelRow> = features.rows.into_iter().filter_map(complete).collect();

    let dropped_fraction = if total == 0 {
        0.0
    } else {
        (total - rows.len()) as f64 / total as f64
    };
    tracing::info!(
        "Dropping NaN values: {:.2}% ({} of {} rows kept)",
        dropped_fraction * 100.0,
        rows.len(),
        total
    );

    rows.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.permno.cmp(&b.permno))
            .then(a.strike_price.total_cmp(&b.strike_price))
            .then(a.expiration_date.cmp(&b.expiration_date))
    });

    CompletePanel {
        rows,
        dropped_fraction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::TradingCalendar;
    use optionset_core::NextPeriodPolicy;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(
        date: NaiveDate,
        days: i64,
        strike: f64,
        option_price: f64,
        prc: f64,
        prc_next: f64,
    ) -> MergedRow {
        MergedRow {
            date,
            permno: 1,
            strike_price: strike,
            days,
            option_price: Some(option_price),
            impl_volatility: Some(0.25),
            delta: Some(0.5),
            prc: Some(prc),
            prc_shifted_1: Some(prc_next),
            returns: Some(0.1),
            v110: Some(0.2),
            v60: Some(0.2),
            v20: Some(0.2),
            v5: Some(0.2),
            r: Some(0.01),
            vix: Some(20.0),
            fundamentals: vec![Some(0.05)],
            industry: None,
            comnam: Some("ACME".to_string()),
            ticker: Some("ACM".to_string()),
        }
    }

    fn calendar() -> TradingCalendar {
        TradingCalendar::from_dates([ymd(2010, 1, 4), ymd(2010, 1, 5), ymd(2010, 1, 6), ymd(2010, 1, 7)])
    }

    // ============================================
    // Formulas
    // ============================================

    #[test]
    fn expiration_date_adds_calendar_days() {
        assert_eq!(expiration_date(ymd(2010, 1, 4), 30), Some(ymd(2010, 2, 3)));
    }

    #[test]
    fn expiration_date_out_of_range_is_none() {
        assert_eq!(expiration_date(ymd(2010, 1, 4), 999_999_999_999), None);
        assert_eq!(expiration_date(ymd(2010, 1, 4), i64::MIN), None);
    }

    #[test]
    fn derive_features_skips_unrepresentable_expiry() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextObservation, &cal);
        let rows = vec![
            row(ymd(2010, 1, 4), 999_999_999_999, 10.0, 1.0, 10.0, 10.5),
            row(ymd(2010, 1, 4), 30, 10.0, 1.0, 10.0, 10.5),
        ];
        let set = derive_features(rows, &next);
        assert_eq!(set.rows.len(), 1);
        assert_eq!(set.rows[0].expiration_date, ymd(2010, 2, 3));
    }

    #[test]
    fn perfect_hedge_neutralizes_value_change() {
        let hedge = perfect_hedge(2.0, 0.8);
        assert!((hedge + 2.5).abs() < 1e-12);
        assert!(hedged_value_change(2.0, hedge, 0.8).abs() < 1e-12);
    }

    #[test]
    fn perfect_hedge_unchanged_option_is_zero() {
        assert_eq!(perfect_hedge(1.0, 0.0), 0.0);
        assert_eq!(perfect_hedge(0.0, 0.0), 0.0);
        assert_eq!(hedged_value_change(1.0, 0.0, 0.0), 1.0);
    }

    // ============================================
    // derive_features
    // ============================================

    #[test]
    fn derive_features_shifts_within_contract() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextTradingDay, &cal);
        // same contract: expiry 2010-02-03 on both days
        let rows = vec![
            row(ymd(2010, 1, 5), 29, 10.0, 1.2, 10.5, 10.8),
            row(ymd(2010, 1, 4), 30, 10.0, 1.0, 10.0, 10.5),
            // different strike, never shifted
            row(ymd(2010, 1, 4), 30, 12.0, 0.4, 10.0, 10.5),
        ];
        let set = derive_features(rows, &next);

        assert_eq!(set.rows[1].option_price_shifted_1, Some(1.2));
        assert_eq!(set.rows[0].option_price_shifted_1, None);
        assert_eq!(set.rows[2].option_price_shifted_1, None);
        assert_eq!(set.rows[1].moneyness, Some(1.0));
        assert_eq!(set.rows[1].scaled_option_price, Some(0.1));
        let hedge = set.rows[1].perfect_hedge_1.unwrap();
        assert!((hedge + 0.5 / 0.2).abs() < 1e-9);
        assert!(set.rows[1].p_value_change_1.unwrap().abs() < 1e-9);
    }

    #[test]
    fn derive_features_gap_leaves_shift_missing() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextTradingDay, &cal);
        let rows = vec![
            row(ymd(2010, 1, 4), 30, 10.0, 1.0, 10.0, 10.5),
            row(ymd(2010, 1, 6), 28, 10.0, 1.3, 10.5, 10.8),
        ];
        let set = derive_features(rows, &next);
        assert_eq!(set.rows[0].option_price_shifted_1, None);
        assert_eq!(set.rows[0].perfect_hedge_1, None);
    }

    #[test]
    fn derive_features_counts_clamped_hedges() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextTradingDay, &cal);
        let rows = vec![
            row(ymd(2010, 1, 4), 30, 10.0, 1.0, 10.0, 10.5),
            row(ymd(2010, 1, 5), 29, 10.0, 1.0, 10.5, 10.8),
        ];
        let set = derive_features(rows, &next);
        assert_eq!(set.rows[0].perfect_hedge_1, Some(0.0));
        assert_eq!(set.infinite_replaced, 1);
    }

    #[test]
    fn derive_features_zero_strike_moneyness_is_zero() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextObservation, &cal);
        let set = derive_features(vec![row(ymd(2010, 1, 4), 30, 0.0, 1.0, 10.0, 10.5)], &next);
        assert_eq!(set.rows[0].moneyness, Some(0.0));
        assert_eq!(set.rows[0].scaled_option_price, Some(0.0));
        assert_eq!(set.infinite_replaced, 2);
    }

    // ============================================
    // drop_incomplete
    // ============================================

    #[test]
    fn drop_incomplete_removes_rows_with_missing_values() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextTradingDay, &cal);
        let mut missing_fundamental = row(ymd(2010, 1, 5), 30, 11.0, 1.0, 10.0, 10.5);
        missing_fundamental.fundamentals = vec![None];
        let rows = vec![
            row(ymd(2010, 1, 5), 29, 10.0, 1.2, 10.5, 10.8),
            row(ymd(2010, 1, 4), 30, 10.0, 1.0, 10.0, 10.5),
            missing_fundamental,
        ];
        let panel = drop_incomplete(derive_features(rows, &next));

        assert_eq!(panel.rows.len(), 1);
        assert_eq!(panel.rows[0].date, ymd(2010, 1, 4));
        assert!((panel.dropped_fraction - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn drop_incomplete_treats_nan_as_missing() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextTradingDay, &cal);
        let mut rows = vec![
            row(ymd(2010, 1, 4), 30, 10.0, 1.0, 10.0, 10.5),
            row(ymd(2010, 1, 5), 29, 10.0, 1.2, 10.5, 10.8),
        ];
        rows[0].delta = Some(f64::NAN);
        let panel = drop_incomplete(derive_features(rows, &next));
        assert!(panel.rows.is_empty());
        assert_eq!(panel.dropped_fraction, 1.0);
    }

    #[test]
    fn drop_incomplete_sorts_by_date_then_contract() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextObservation, &cal);
        let rows = vec![
            row(ymd(2010, 1, 5), 29, 12.0, 1.2, 10.5, 10.8),
            row(ymd(2010, 1, 6), 28, 12.0, 1.4, 10.8, 11.0),
            row(ymd(2010, 1, 4), 30, 12.0, 1.0, 10.0, 10.5),
            row(ymd(2010, 1, 5), 29, 10.0, 1.3, 10.5, 10.8),
            row(ymd(2010, 1, 6), 28, 10.0, 1.5, 10.8, 11.0),
        ];
        let panel = drop_incomplete(derive_features(rows, &next));
        let keys: Vec<(NaiveDate, f64)> = panel.rows.iter().map(|r| (r.date, r.strike_price)).collect();
        assert_eq!(
            keys,
            vec![(ymd(2010, 1, 4), 12.0), (ymd(2010, 1, 5), 10.0), (ymd(2010, 1, 5), 12.0)]
        );
    }

    #[test]
    fn empty_feature_set_drops_nothing() {
        let panel = drop_incomplete(FeatureSet::default());
        assert!(panel.rows.is_empty());
        assert_eq!(panel.dropped_fraction, 0.0);
    }
}

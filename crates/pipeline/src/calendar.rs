//! Calendar helpers: month-end alignment and trading-day adjacency.

use chrono::{Datelike, NaiveDate};
use optionset_core::NextPeriodPolicy;

/// Last calendar day of the month containing `date`.
#[must_use]
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// Sorted set of dates on which the market traded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingCalendar {
    dates: Vec<NaiveDate>,
}

impl TradingCalendar {
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
        dates.sort_unstable();
        dates.dedup();
        Self { dates }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First trading day strictly after `date`.
    #[must_use]
    pub fn next_trading_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        let idx = self.dates.partition_point(|d| *d <= date);
        self.dates.get(idx).copied()
    }
}

/// Decides whether a group's following observation counts as its next period.
#[derive(Debug, Clone, Copy)]
pub struct NextPeriod<'a> {
    policy: NextPeriodPolicy,
    calendar: &'a TradingCalendar,
}

impl<'a> NextPeriod<'a> {
    #[must_use]
    pub const fn new(policy: NextPeriodPolicy, calendar: &'a TradingCalendar) -> Self {
        Self { policy, calendar }
    }

    #[must_use]
    pub fn accepts(&self, current: NaiveDate, following: NaiveDate) -> bool {
        match self.policy {
            NextPeriodPolicy::NextObservation => following > current,
            NextPeriodPolicy::NextTradingDay => {
                self.calendar.next_trading_day(current) == Some(following)
            }
        }
    }

    /// Value of the row after `idx` in a date-sorted group, if it is the next period.
    pub fn shifted<T>(
        &self,
        group: &[T],
        idx: usize,
        date: impl Fn(&T) -> NaiveDate,
        value: impl Fn(&T) -> Option<f64>,
    ) -> Option<f64> {
        let current = group.get(idx)?;
        let following = group.get(idx + 1)?;
        if self.accepts(date(current), date(following)) {
            value(following)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ============================================
    // month_end
    // ============================================

    #[test]
    fn month_end_of_regular_month() {
        assert_eq!(month_end(ymd(2010, 1, 4)), ymd(2010, 1, 31));
        assert_eq!(month_end(ymd(2010, 4, 30)), ymd(2010, 4, 30));
    }

    #[test]
    fn month_end_handles_february_and_leap_years() {
        assert_eq!(month_end(ymd(2010, 2, 1)), ymd(2010, 2, 28));
        assert_eq!(month_end(ymd(2012, 2, 15)), ymd(2012, 2, 29));
    }

    #[test]
    fn month_end_handles_december() {
        assert_eq!(month_end(ymd(2010, 12, 1)), ymd(2010, 12, 31));
    }

    // ============================================
    // TradingCalendar / NextPeriod
    // ============================================

    fn calendar() -> TradingCalendar {
        // Friday, Monday, Tuesday, Thursday (Wednesday missing)
        TradingCalendar::from_dates([
            ymd(2010, 1, 11),
            ymd(2010, 1, 8),
            ymd(2010, 1, 12),
            ymd(2010, 1, 14),
            ymd(2010, 1, 8),
        ])
    }

    #[test]
    fn calendar_dedups_and_sorts() {
        let cal = calendar();
        assert_eq!(cal.len(), 4);
        assert_eq!(cal.next_trading_day(ymd(2010, 1, 8)), Some(ymd(2010, 1, 11)));
        assert_eq!(cal.next_trading_day(ymd(2010, 1, 9)), Some(ymd(2010, 1, 11)));
        assert_eq!(cal.next_trading_day(ymd(2010, 1, 14)), None);
    }

    #[test]
    fn next_trading_day_policy_spans_weekends_only() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextTradingDay, &cal);
        assert!(next.accepts(ymd(2010, 1, 8), ymd(2010, 1, 11)));
        assert!(next.accepts(ymd(2010, 1, 12), ymd(2010, 1, 14)));
        // skipping Monday is a gap
        assert!(!next.accepts(ymd(2010, 1, 8), ymd(2010, 1, 12)));
    }

    #[test]
    fn next_observation_policy_accepts_any_gap() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextObservation, &cal);
        assert!(next.accepts(ymd(2010, 1, 8), ymd(2010, 1, 14)));
        assert!(!next.accepts(ymd(2010, 1, 8), ymd(2010, 1, 8)));
    }

    #[test]
    fn shifted_takes_following_value_or_none() {
        let cal = calendar();
        let next = NextPeriod::new(NextPeriodPolicy::NextTradingDay, &cal);
        let group = [
            (ymd(2010, 1, 8), Some(1.0)),
            (ymd(2010, 1, 11), Some(2.0)),
            (ymd(2010, 1, 14), Some(3.0)),
        ];
        let shift = |i| next.shifted(&group[..], i, |g| g.0, |g| g.1);
        assert_eq!(shift(0), Some(2.0));
        assert_eq!(shift(1), None);
        assert_eq!(shift(2), None);
    }
}

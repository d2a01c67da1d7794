//! Column layout of the output tables.
//!
//! Both the Parquet and the CSV writer consume the same columnar projection so
//! the two formats always carry identical column names and order.

use chrono::NaiveDate;
use optionset_core::{industry_one_hot, PanelRow, SyntheticRecord, INDUSTRY_COUNT};

/// Values of one output column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Date(Vec<NaiveDate>),
    Int(Vec<i64>),
    Float(Vec<Option<f64>>),
    Text(Vec<String>),
}

impl ColumnValues {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Date(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders one cell for text output; missing floats become an empty string.
    #[must_use]
    pub fn cell(&self, row: usize) -> String {
        match self {
            Self::Date(v) => v[row].format("%Y-%m-%d").to_string(),
            Self::Int(v) => v[row].to_string(),
            Self::Float(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
            Self::Text(v) => v[row].clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    fn float<T>(name: &str, rows: &[T], f: impl Fn(&T) -> f64) -> Self {
        Self::new(name, ColumnValues::Float(rows.iter().map(|r| Some(f(r))).collect()))
    }
}

/// Names of the industry one-hot columns, `ff_ind_0 .. ff_ind_48`.
#[must_use]
pub fn industry_columns() -> Vec<String> {
    (0..INDUSTRY_COUNT).map(|i| format!("ff_ind_{i}")).collect()
}

fn industry_dummies(slots: impl Iterator<Item = Option<usize>>) -> Vec<Column> {
    let dense: Vec<[f64; INDUSTRY_COUNT]> = slots.map(industry_one_hot).collect();
    industry_columns()
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            Column::new(
                name,
                ColumnValues::Float(dense.iter().map(|d| Some(d[i])).collect()),
            )
        })
        .collect()
}

/// Projects panel rows onto the panel table layout.
#[must_use]
pub fn panel_columns(rows: &[PanelRow], fundamental_columns: &[String]) -> Vec<Column> {
    let mut columns = vec![
        Column::new("date", ColumnValues::Date(rows.iter().map(|r| r.date).collect())),
        Column::new("permno", ColumnValues::Int(rows.iter().map(|r| r.permno).collect())),
        Column::float("strike_price", rows, |r| r.strike_price),
        Column::new(
            "expiration_date",
            ColumnValues::Date(rows.iter().map(|r| r.expiration_date).collect()),
        ),
        Column::new("days", ColumnValues::Int(rows.iter().map(|r| r.days).collect())),
        Column::float("option_price", rows, |r| r.option_price),
        Column::float("impl_volatility", rows, |r| r.impl_volatility),
        Column::float("delta", rows, |r| r.delta),
        Column::float("prc", rows, |r| r.prc),
        Column::float("prc_shifted_1", rows, |r| r.prc_shifted_1),
        Column::float("returns", rows, |r| r.returns),
        Column::float("v110", rows, |r| r.v110),
        Column::float("v60", rows, |r| r.v60),
        Column::float("v20", rows, |r| r.v20),
        Column::float("v5", rows, |r| r.v5),
        Column::float("r", rows, |r| r.r),
        Column::float("vix", rows, |r| r.vix),
    ];

    for (i, name) in fundamental_columns.iter().enumerate() {
        columns.push(Column::new(
            name.clone(),
            ColumnValues::Float(rows.iter().map(|r| r.fundamentals.get(i).copied()).collect()),
        ));
    }

    columns.extend(industry_dummies(rows.iter().map(|r| r.industry)));

    columns.extend([
        Column::new("comnam", ColumnValues::Text(rows.iter().map(|r| r.comnam.clone()).collect())),
        Column::new("ticker", ColumnValues::Text(rows.iter().map(|r| r.ticker.clone()).collect())),
        Column::float("option_price_shifted_1", rows, |r| r.option_price_shifted_1),
        Column::float("moneyness", rows, |r| r.moneyness),
        Column::float("scaled_option_price", rows, |r| r.scaled_option_price),
        Column::float("scaled_option_price_shifted_1", rows, |r| {
            r.scaled_option_price_shifted_1
        }),
        Column::float("perfect_hedge_1", rows, |r| r.perfect_hedge_1),
        Column::float("P_value_change_1", rows, |r| r.p_value_change_1),
    ]);

    columns
}

/// Projects synthetic records onto the synthetic table layout.
#[must_use]
pub fn synthetic_columns(rows: &[SyntheticRecord], auxiliary_columns: &[String]) -> Vec<Column> {
    let mut columns = vec![
        Column::float("days", rows, |r| r.days),
        Column::float("option_price", rows, |r| r.option_price),
        Column::new(
            "impl_volatility",
            ColumnValues::Float(rows.iter().map(SyntheticRecord::impl_volatility).collect()),
        ),
        Column::float("delta", rows, |r| r.delta),
        Column::float("strike_price", rows, |r| r.strike_price),
        Column::float("prc", rows, |r| r.prc),
        Column::float("returns", rows, |r| r.returns),
        Column::float("v110", rows, |r| r.v110),
        Column::float("v60", rows, |r| r.v60),
        Column::float("v20", rows, |r| r.v20),
        Column::float("v5", rows, |r| r.v5),
        Column::float("r", rows, |r| r.r),
        Column::float("moneyness", rows, |r| r.moneyness),
        Column::float("scaled_option_price", rows, |r| r.scaled_option_price),
        Column::float("vix", rows, |r| r.vix),
    ];

    columns.extend(industry_dummies(rows.iter().map(|r| Some(r.industry))));

    for (i, name) in auxiliary_columns.iter().enumerate() {
        columns.push(Column::new(
            name.clone(),
            ColumnValues::Float(rows.iter().map(|r| r.auxiliary.get(i).copied()).collect()),
        ));
    }

    columns
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_panel_row(permno: i64, industry: Option<usize>) -> PanelRow {
        let date = NaiveDate::from_ymd_opt(2010, 1, 4).unwrap();
        PanelRow {
            date,
            permno,
            strike_price: 20.0,
            expiration_date: NaiveDate::from_ymd_opt(2010, 2, 3).unwrap(),
            days: 30,
            option_price: 2.5,
            impl_volatility: 0.3,
            delta: 0.6,
            prc: 21.0,
            prc_shifted_1: 21.5,
            returns: 0.1,
            v110: 0.2,
            v60: 0.21,
            v20: 0.22,
            v5: 0.23,
            r: 0.05,
            vix: 20.0,
            fundamentals: vec![0.1, 0.02],
            industry,
            comnam: "ACME CORP".to_string(),
            ticker: "ACME".to_string(),
            option_price_shifted_1: 2.8,
            moneyness: 1.05,
            scaled_option_price: 0.125,
            scaled_option_price_shifted_1: 0.14,
            perfect_hedge_1: -0.5 / 0.3,
            p_value_change_1: 0.0,
        }
    }

    pub(crate) fn sample_synthetic_record(industry: usize) -> SyntheticRecord {
        SyntheticRecord {
            days: 0.0,
            option_price: 50.0,
            delta: 1.0,
            strike_price: 50.0,
            prc: 100.0,
            returns: 0.1,
            v110: 0.2,
            v60: 0.2,
            v20: 0.2,
            v5: 0.2,
            r: 0.01,
            moneyness: 2.0,
            scaled_option_price: 1.0,
            vix: 18.0,
            industry,
            auxiliary: vec![0.3],
        }
    }

    fn names(columns: &[Column]) -> Vec<&str> {
        columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn industry_columns_cover_all_categories() {
        let cols = industry_columns();
        assert_eq!(cols.len(), 49);
        assert_eq!(cols.first().map(String::as_str), Some("ff_ind_0"));
        assert_eq!(cols.last().map(String::as_str), Some("ff_ind_48"));
    }

    #[test]
    fn panel_columns_have_expected_order() {
        let fundamentals = vec!["roa".to_string(), "pe_op_dil".to_string()];
        let columns = panel_columns(&[sample_panel_row(10078, Some(3))], &fundamentals);
        let names = names(&columns);

        assert_eq!(&names[..4], &["date", "permno", "strike_price", "expiration_date"]);
        assert_eq!(names[17], "roa");
        assert_eq!(names[18], "pe_op_dil");
        assert_eq!(names[19], "ff_ind_0");
        assert_eq!(names.last().copied(), Some("P_value_change_1"));
        assert_eq!(columns.len(), 17 + 2 + 49 + 8);
        assert!(columns.iter().all(|c| c.values.len() == 1));
    }

    #[test]
    fn panel_industry_dummy_is_set() {
        let columns = panel_columns(&[sample_panel_row(1, Some(3))], &[]);
        let dummy = columns.iter().find(|c| c.name == "ff_ind_3").unwrap();
        assert_eq!(dummy.values, ColumnValues::Float(vec![Some(1.0)]));
        let other = columns.iter().find(|c| c.name == "ff_ind_4").unwrap();
        assert_eq!(other.values, ColumnValues::Float(vec![Some(0.0)]));
    }

    #[test]
    fn synthetic_columns_have_null_implied_volatility() {
        let aux = vec!["roa".to_string()];
        let columns = synthetic_columns(&[sample_synthetic_record(0)], &aux);
        let iv = columns.iter().find(|c| c.name == "impl_volatility").unwrap();
        assert_eq!(iv.values, ColumnValues::Float(vec![None]));
        assert_eq!(columns.len(), 15 + 49 + 1);
        assert_eq!(columns.last().map(|c| c.name.as_str()), Some("roa"));
    }

    #[test]
    fn cell_renders_missing_float_as_empty() {
        let values = ColumnValues::Float(vec![None, Some(1.5)]);
        assert_eq!(values.cell(0), "");
        assert_eq!(values.cell(1), "1.5");
    }
}

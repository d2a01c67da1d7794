//! Row layouts of the source CSV tables.
//!
//! Each raw row deserializes straight from a CSV record and converts into the
//! corresponding `optionset_core` record. Empty numeric cells become `None`.

pub mod macro_series;
pub mod names;
pub mod prices;

pub use macro_series::{TreasuryRow, VixRow};
pub use names::{DividendRow, NameRow};
pub use prices::{OptionRow, PriceRow};

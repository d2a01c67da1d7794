use crate::config::DatasetConfig;
use crate::records::{
    DividendRecord, FundamentalRecord, MacroObservation, NameRecord, OptionQuote, PanelRow,
    PriceRecord, SourceTables, SyntheticRecord,
};
use anyhow::Result;

/// Read access to the persisted source tables.
pub trait SourceStore {
    fn prices(&self) -> Result<Vec<PriceRecord>>;
    fn options(&self, year: i32) -> Result<Vec<OptionQuote>>;
    fn treasury(&self) -> Result<Vec<MacroObservation>>;
    fn vix(&self) -> Result<Vec<MacroObservation>>;
    /// Ratios with `values` aligned to `columns`.
    fn fundamentals(&self, columns: &[String]) -> Result<Vec<FundamentalRecord>>;
    fn names(&self) -> Result<Vec<NameRecord>>;
    fn dividends(&self) -> Result<Vec<DividendRecord>>;

    /// Reads every table a run needs. Any failure aborts the load.
    ///
    /// # Errors
    ///
    /// Returns the first table read error.
    fn load_tables(&self, config: &DatasetConfig) -> Result<SourceTables> {
        let prices = self.prices()?;
        tracing::info!(rows = prices.len(), "Loaded stock prices");

        let mut options = Vec::new();
        for year in config.years() {
            let year_options = self.options(year)?;
            tracing::info!(year, rows = year_options.len(), "Loaded options");
            options.extend(year_options);
        }

        let treasury = self.treasury()?;
        let vix = self.vix()?;
        let fundamentals = self.fundamentals(&config.fundamental_columns)?;
        let names = self.names()?;
        let dividends = self.dividends()?;
        tracing::info!(
            treasury = treasury.len(),
            vix = vix.len(),
            ratios = fundamentals.len(),
            names = names.len(),
            dividends = dividends.len(),
            "Loaded auxiliary tables"
        );

        Ok(SourceTables {
            prices,
            options,
            treasury,
            vix,
            fundamentals,
            fundamental_columns: config.fundamental_columns.clone(),
            names,
            dividends,
        })
    }
}

/// Destination for the finished dataset tables.
pub trait DatasetSink {
    fn write_panel(
        &mut self,
        table: &str,
        rows: &[PanelRow],
        fundamental_columns: &[String],
    ) -> Result<()>;

    fn write_synthetic(
        &mut self,
        table: &str,
        rows: &[SyntheticRecord],
        auxiliary_columns: &[String],
    ) -> Result<()>;
}

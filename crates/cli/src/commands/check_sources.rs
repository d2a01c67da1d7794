//! Source coverage CLI command.
//!
//! Loads every source table the build would read and shows record counts,
//! date ranges and distinct securities. Used to assess data availability
//! before running a full build.

use anyhow::Result;
use clap::Args;
use optionset_core::SourceStore;
use optionset_data::{summarize, CsvSourceStore};
use std::path::PathBuf;

/// Arguments for the check-sources command.
#[derive(Args, Debug, Clone)]
pub struct CheckSourcesArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Config profile overlay
    #[arg(long)]
    pub profile: Option<String>,

    /// Source directory, overrides the config
    #[arg(short, long)]
    pub source_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Runs the check-sources command.
///
/// # Errors
/// Returns an error if the configuration is invalid or any source table
/// cannot be read.
pub fn run_check_sources(args: CheckSourcesArgs) -> Result<()> {
    let mut config = super::load_config(&args.config, args.profile.as_deref())?;
    if let Some(dir) = args.source_dir {
        config.paths.source_dir = dir;
    }

    let store = CsvSourceStore::new(&config.paths.source_dir);
    let tables = store.load_tables(&config.dataset)?;
    let report = summarize(&tables);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n=== Source Tables: {} ===\n", config.paths.source_dir.display());
    for status in &report {
        println!("{}", status.report_line());
    }
    println!(
        "\nOptions years {}..{} ({} fundamental columns)",
        config.dataset.start_year,
        config.dataset.end_year,
        tables.fundamental_columns.len()
    );
    Ok(())
}

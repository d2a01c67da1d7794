//! Dataset build command.
//!
//! Loads every source table, runs the pipeline stages and writes the
//! partitions, the synthetic contracts and a run manifest to the output
//! directory. Nothing is written unless every stage succeeds.

use anyhow::{Context, Result};
use clap::Args;
use optionset_core::{OptionType, PipelineConfig, SourceStore};
use optionset_data::{sink_for, CsvSourceStore};
use optionset_pipeline::{DatasetBundle, DatasetPipeline, SYNTHETIC_TABLE};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the run summary written next to the tables.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Arguments for the build command.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Config profile overlay (loads Config.<profile>.toml next to the config file)
    #[arg(long)]
    pub profile: Option<String>,

    /// Option class to build ("call" or "put"), overrides the config
    #[arg(long)]
    pub option_type: Option<OptionType>,

    /// Output directory, overrides the config
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Skip synthetic boundary contracts
    #[arg(long)]
    pub no_synthetic: bool,

    /// Seed for synthetic noise (process entropy when unset)
    #[arg(long)]
    pub synthetic_seed: Option<u64>,
}

impl BuildArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(option_type) = self.option_type {
            config.dataset.option_type = option_type;
        }
        if let Some(dir) = &self.output_dir {
            config.paths.output_dir.clone_from(dir);
        }
        if self.no_synthetic {
            config.synthetic.enabled = false;
        }
        if self.synthetic_seed.is_some() {
            config.synthetic.seed = self.synthetic_seed;
        }
    }
}

/// Runs the build command.
///
/// # Errors
/// Returns an error if the configuration is invalid, a source table cannot be
/// read, a pipeline stage fails, or the output cannot be written.
pub fn run_build(args: BuildArgs) -> Result<()> {
    let mut config = super::load_config(&args.config, args.profile.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    tracing::info!(
        option_type = %config.dataset.option_type,
        start_year = config.dataset.start_year,
        end_year = config.dataset.end_year,
        source_dir = %config.paths.source_dir.display(),
        "Building options dataset"
    );

    let store = CsvSourceStore::new(&config.paths.source_dir);
    let tables = store.load_tables(&config.dataset)?;

    let bundle = DatasetPipeline::new(&config).run(&tables)?;
    write_bundle(&config, &bundle)?;

    println!(
        "Wrote {} train, {} validate, {} test, {} single, {} synthetic rows to {}",
        bundle.summary.train_rows,
        bundle.summary.validate_rows,
        bundle.summary.test_rows,
        bundle.summary.single_rows,
        bundle.summary.synthetic_rows,
        config.paths.output_dir.display()
    );
    Ok(())
}

fn write_bundle(config: &PipelineConfig, bundle: &DatasetBundle) -> Result<()> {
    let dir = &config.paths.output_dir;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut sink = sink_for(config.output.format, dir);
    for (table, rows) in bundle.panel_tables() {
        sink.write_panel(table, rows, &config.dataset.fundamental_columns)
            .with_context(|| format!("Failed to write table '{table}'"))?;
        tracing::info!(table, rows = rows.len(), format = config.output.format.extension(), "Wrote table");
    }

    if config.synthetic.enabled {
        sink.write_synthetic(
            SYNTHETIC_TABLE,
            &bundle.synthetic,
            &config.synthetic.auxiliary_columns,
        )
        .with_context(|| format!("Failed to write table '{SYNTHETIC_TABLE}'"))?;
        tracing::info!(rows = bundle.synthetic.len(), "Wrote synthetic contracts");
    }

    write_manifest(&dir.join(MANIFEST_FILE), bundle)
}

fn write_manifest(path: &Path, bundle: &DatasetBundle) -> Result<()> {
    let json = serde_json::to_string_pretty(&bundle.summary)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
    tracing::info!(path = %path.display(), "Wrote run manifest");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use optionset_core::OutputFormat;
    use optionset_pipeline::{FeatureStats, RunSummary};
    use serde_json::Value;
    use tempfile::TempDir;

    fn args() -> BuildArgs {
        BuildArgs {
            config: "config/Config.toml".to_string(),
            profile: None,
            option_type: None,
            output_dir: None,
            no_synthetic: false,
            synthetic_seed: None,
        }
    }

    fn bundle(option_type: OptionType, synthetic_seed: Option<u64>) -> DatasetBundle {
        DatasetBundle {
            train: Vec::new(),
            validate: Vec::new(),
            test: Vec::new(),
            single: Vec::new(),
            synthetic: Vec::new(),
            summary: RunSummary {
                option_type,
                merged_rows: 450,
                panel_rows: 435,
                dropped_fraction: 0.0333,
                infinite_replaced: 2,
                partition_seed: 69777,
                train_rows: 261,
                validate_rows: 87,
                test_rows: 87,
                single_entity: Some(10145),
                single_rows: 87,
                synthetic_seed,
                synthetic_rows: 488,
                feature_stats: FeatureStats::default(),
            },
        }
    }

    fn config(output: &Path, synthetic: bool) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.paths.output_dir = output.join("dataset");
        config.output.format = OutputFormat::Csv;
        config.synthetic.enabled = synthetic;
        config
    }

    fn read_manifest(dir: &Path) -> Value {
        let raw = fs::read_to_string(dir.join(MANIFEST_FILE)).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    // ============================================
    // CLI overrides
    // ============================================

    #[test]
    fn apply_without_flags_keeps_config() {
        let mut config = PipelineConfig::default();
        args().apply(&mut config);
        assert_eq!(config.dataset.option_type, OptionType::Call);
        assert!(config.synthetic.enabled);
        assert_eq!(config.synthetic.seed, None);
        assert_eq!(config.paths.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn apply_overrides_config_values() {
        let mut config = PipelineConfig::default();
        config.synthetic.seed = Some(1);
        let args = BuildArgs {
            option_type: Some(OptionType::Put),
            output_dir: Some(PathBuf::from("/tmp/puts")),
            no_synthetic: true,
            synthetic_seed: Some(42),
            ..args()
        };
        args.apply(&mut config);

        assert_eq!(config.dataset.option_type, OptionType::Put);
        assert_eq!(config.paths.output_dir, PathBuf::from("/tmp/puts"));
        assert!(!config.synthetic.enabled);
        assert_eq!(config.synthetic.seed, Some(42));
    }

    // ============================================
    // Output writing
    // ============================================

    #[test]
    fn write_bundle_writes_tables_and_manifest() {
        let tmp = TempDir::new().unwrap();
        let config = config(tmp.path(), true);
        write_bundle(&config, &bundle(OptionType::Put, Some(7))).unwrap();

        let dir = &config.paths.output_dir;
        for table in ["train", "validate", "test", "single", SYNTHETIC_TABLE] {
            assert!(dir.join(format!("{table}.csv")).exists(), "{table} missing");
        }

        let manifest = read_manifest(dir);
        assert_eq!(manifest["option_type"], "put");
        assert_eq!(manifest["merged_rows"], 450);
        assert_eq!(manifest["panel_rows"], 435);
        assert_eq!(manifest["train_rows"], 261);
        assert_eq!(manifest["validate_rows"], 87);
        assert_eq!(manifest["test_rows"], 87);
        assert_eq!(manifest["single_entity"], 10145);
        assert_eq!(manifest["partition_seed"], 69777);
        assert_eq!(manifest["synthetic_seed"], 7);
        assert_eq!(manifest["synthetic_rows"], 488);
        assert!(manifest["feature_stats"]["vix"]["std"].is_number());
    }

    #[test]
    fn write_bundle_skips_synthetic_when_disabled() {
        let tmp = TempDir::new().unwrap();
        let config = config(tmp.path(), false);
        write_bundle(&config, &bundle(OptionType::Call, None)).unwrap();

        let dir = &config.paths.output_dir;
        assert!(dir.join("train.csv").exists());
        assert!(!dir.join(format!("{SYNTHETIC_TABLE}.csv")).exists());

        let manifest = read_manifest(dir);
        assert_eq!(manifest["option_type"], "call");
        assert!(manifest["synthetic_seed"].is_null());
    }
}

//! CLI command implementations.

pub mod build;
pub mod check_sources;

pub use build::{run_build, BuildArgs};
pub use check_sources::{run_check_sources, CheckSourcesArgs};

use anyhow::Result;
use optionset_core::{ConfigLoader, PipelineConfig};

/// Loads the configuration file, layering the profile overlay when given.
fn load_config(path: &str, profile: Option<&str>) -> Result<PipelineConfig> {
    let config = match profile {
        Some(profile) => ConfigLoader::load_with_profile(path, profile)?,
        None => ConfigLoader::load(path)?,
    };
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

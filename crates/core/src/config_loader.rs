use crate::config::PipelineConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Prefix of environment overrides, e.g. `OPTIONSET_DATASET__OPTION_TYPE=put`.
pub const ENV_PREFIX: &str = "OPTIONSET_";

pub struct ConfigLoader;

impl ConfigLoader {
    fn base(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(PipelineConfig::default())).merge(Toml::file(path))
    }

    fn finish(figment: Figment) -> Result<PipelineConfig> {
        let config: PipelineConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads pipeline configuration by layering defaults, the TOML file and
    /// environment variables. A missing file leaves the defaults in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the merged
    /// configuration fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<PipelineConfig> {
        Self::finish(Self::base(path.as_ref()))
    }

    /// Loads configuration with a profile overlay, `Config.<profile>.toml`
    /// next to the base file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the merged
    /// configuration fails validation.
    pub fn load_with_profile(path: impl AsRef<Path>, profile: &str) -> Result<PipelineConfig> {
        let path = path.as_ref();
        let overlay = path.with_file_name(format!("Config.{profile}.toml"));
        Self::finish(Self::base(path).merge(Toml::file(overlay)))
    }
}

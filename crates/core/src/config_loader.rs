use std::path::Path;

use crate::config::ExperimentConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/Experiment.toml";
pub const ENV_PREFIX: &str = "PHASE_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads experiment configuration by layering defaults, a TOML file, and environment variables.
    ///
    /// A missing file is not an error; its layer is simply empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the merged configuration fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<ExperimentConfig> {
        let path = path.as_ref();
        let config: ExperimentConfig = Self::base(path)
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads experiment configuration with a profile overlay (`Experiment.<profile>.toml`
    /// next to the base file).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or validation fails.
    pub fn load_with_profile(path: impl AsRef<Path>, profile: &str) -> Result<ExperimentConfig> {
        let path = path.as_ref();
        let profile_path = Self::profile_path(path, profile);
        let config: ExperimentConfig = Self::file_layer(Self::base(path), &profile_path)
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .with_context(|| {
                format!(
                    "Failed to load config from {} with profile {}",
                    path.display(),
                    profile_path.display()
                )
            })?;

        config.validate()?;
        Ok(config)
    }

    fn base(path: &Path) -> Figment {
        if !path.exists() {
            tracing::warn!("Config file {} not found, using defaults", path.display());
        }
        Self::file_layer(
            Figment::from(Serialized::defaults(ExperimentConfig::default())),
            path,
        )
    }

    /// Merges a `.json` file as JSON and anything else as TOML.
    fn file_layer(figment: Figment, path: &Path) -> Figment {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Toml::file(path)),
        }
    }

    fn profile_path(path: &Path, profile: &str) -> std::path::PathBuf {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Experiment");
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        path.with_file_name(format!("{stem}.{profile}.{ext}"))
    }
}

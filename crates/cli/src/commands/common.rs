//! Arguments and helpers shared by experiment commands.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use clap::Args;

use phase_forecast_core::{ConfigLoader, ExperimentConfig, TimeSeries, DEFAULT_CONFIG_PATH};
use phase_forecast_data::LabCsvLoader;

/// Configuration source and run-level overrides.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Experiment config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Profile overlay, e.g. `quick` merges Experiment.quick.toml over the base file
    #[arg(long)]
    pub profile: Option<String>,

    /// Override the base random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the draw mode: sequential, partitioned
    #[arg(long)]
    pub draw_mode: Option<String>,

    /// Abort on the first failed (pair, band) combination
    #[arg(long)]
    pub fail_fast: bool,
}

impl ConfigArgs {
    /// Loads the layered configuration and applies command-line overrides.
    pub fn load(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.profile {
            Some(profile) => ConfigLoader::load_with_profile(&self.config, profile)?,
            None => ConfigLoader::load(&self.config)?,
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(mode) = &self.draw_mode {
            config.draw_mode = mode.parse()?;
        }
        if self.fail_fast {
            config.fail_fast = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parses an output format from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!(
                "Unknown format: '{}'. Valid formats: text, json",
                s
            )),
        }
    }
}

/// Loads every lab the configured pairs reference.
///
/// Without `fail_fast` a lab that fails to load is logged and left out, so
/// its pairs surface as failed rows instead of aborting the run.
pub fn load_series(config: &ExperimentConfig) -> Result<HashMap<String, TimeSeries>> {
    let wanted = config.referenced_labs();
    if config.fail_fast {
        return LabCsvLoader::load_labs(&config.labs, &wanted);
    }

    let mut series = HashMap::with_capacity(wanted.len());
    for lab in &wanted {
        match LabCsvLoader::load_labs(&config.labs, std::slice::from_ref(lab)) {
            Ok(loaded) => series.extend(loaded),
            Err(e) => tracing::warn!("Skipping lab {}: {:#}", lab, e),
        }
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phase_forecast_core::DrawMode;
    use std::fs;
    use tempfile::TempDir;

    fn args(config: &str) -> ConfigArgs {
        ConfigArgs {
            config: config.to_string(),
            profile: None,
            seed: None,
            draw_mode: None,
            fail_fast: false,
        }
    }

    #[test]
    fn output_format_parse() {
        assert_eq!(OutputFormat::parse("TEXT").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::parse("yaml").is_err());
    }

    #[test]
    fn overrides_apply_after_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Experiment.toml");
        fs::write(&path, "seed = 3\ndraw_mode = \"sequential\"\n").unwrap();

        let mut overridden = args(path.to_str().unwrap());
        overridden.seed = Some(11);
        overridden.draw_mode = Some("partitioned".to_string());
        overridden.fail_fast = true;

        let config = overridden.load().unwrap();
        assert_eq!(config.seed, 11);
        assert_eq!(config.draw_mode, DrawMode::Partitioned);
        assert!(config.fail_fast);

        let plain = args(path.to_str().unwrap()).load().unwrap();
        assert_eq!(plain.seed, 3);
        assert!(!plain.fail_fast);
    }

    #[test]
    fn unknown_draw_mode_is_rejected() {
        let mut bad = args("does/not/exist.toml");
        bad.draw_mode = Some("random".to_string());
        assert!(bad.load().is_err());
    }

    #[test]
    fn unreadable_labs_are_skipped_without_fail_fast() {
        let dir = TempDir::new().unwrap();
        let nist = dir.path().join("nist.csv");
        fs::write(&nist, "mjd,value_ns\n60000,1\n60001,2\n").unwrap();

        let mut config = ExperimentConfig::default();
        config.labs.insert("NIST".to_string(), nist);
        config.labs.insert("PTB".to_string(), dir.path().join("missing.csv"));

        let series = load_series(&config).unwrap();
        assert!(series.contains_key("NIST"));
        assert!(!series.contains_key("PTB"));

        config.fail_fast = true;
        assert!(load_series(&config).is_err());
    }
}

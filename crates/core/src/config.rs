use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// Full configuration of a forecasting experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Lab identifier to CSV path.
    pub labs: BTreeMap<String, PathBuf>,
    /// Series pairs to compare, in run order.
    pub pairs: Vec<PairConfig>,
    /// Frequency bands to analyze, in run order.
    pub bands: Vec<BandConfig>,
    /// Prediction horizon H in samples (days).
    pub horizon: usize,
    /// Trailing estimation window W in samples (days).
    pub window: usize,
    /// Stabilizer added to phasor magnitudes before normalization.
    pub epsilon: f64,
    /// Base random seed.
    pub seed: u64,
    /// How surrogate replicas are built.
    pub null_model: NullModel,
    /// How the random source is shared across draws.
    pub draw_mode: DrawMode,
    /// Abort the whole run on the first failed combination.
    pub fail_fast: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConfig {
    pub a: String,
    pub b: String,
}

impl PairConfig {
    #[must_use]
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    /// Label used in result rows, e.g. `NIST-PTB`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}", self.a, self.b)
    }
}

/// An analysis band in cycles/day, inclusive on both edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    pub label: String,
    pub flo: f64,
    pub fhi: f64,
    /// Surrogate draws for the null distribution.
    pub surrogates: usize,
}

impl BandConfig {
    #[must_use]
    pub fn new(label: impl Into<String>, flo: f64, fhi: f64, surrogates: usize) -> Self {
        Self {
            label: label.into(),
            flo,
            fhi,
            surrogates,
        }
    }
}

/// Null hypothesis construction for surrogate draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NullModel {
    /// Randomize the phase of in-band bins of the second series.
    #[default]
    PhaseRandomized,
    /// Rotate the second series' analytic signal by a random integer lag.
    CircularShift,
}

/// Random stream layout for surrogate draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// One generator threaded through pairs, then bands, then draws.
    #[default]
    Sequential,
    /// One generator per draw, seeded from (seed, pair, band, draw); draws run in parallel.
    Partitioned,
}

impl std::str::FromStr for DrawMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "partitioned" | "parallel" => Ok(Self::Partitioned),
            _ => Err(AnalysisError::InvalidConfig(format!(
                "unknown draw mode '{s}', expected sequential or partitioned"
            ))),
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        let labs = ["NIST", "PTB", "NICT", "VSL"]
            .into_iter()
            .map(|lab| {
                (
                    lab.to_string(),
                    PathBuf::from(format!("circularT_{lab}_extracted.csv")),
                )
            })
            .collect();

        Self {
            labs,
            pairs: vec![
                PairConfig::new("NIST", "PTB"),
                PairConfig::new("NIST", "NICT"),
                PairConfig::new("PTB", "VSL"),
            ],
            bands: vec![
                BandConfig::new("target_8_12d", 1.0 / 12.0, 1.0 / 8.0, 2000),
                BandConfig::new("ctrl_low", 0.05, 0.07, 1000),
                BandConfig::new("ctrl_high", 0.13, 0.15, 1000),
            ],
            horizon: 30,
            window: 730,
            epsilon: 1e-12,
            seed: 0,
            null_model: NullModel::default(),
            draw_mode: DrawMode::default(),
            fail_fast: false,
        }
    }
}

impl ExperimentConfig {
    /// Minimum aligned length that yields at least one walk-forward evaluation.
    #[must_use]
    pub fn min_length(&self) -> usize {
        self.window + self.horizon + 1
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_draw_mode(mut self, draw_mode: DrawMode) -> Self {
        self.draw_mode = draw_mode;
        self
    }

    #[must_use]
    pub fn with_null_model(mut self, null_model: NullModel) -> Self {
        self.null_model = null_model;
        self
    }

    #[must_use]
    pub fn with_windows(mut self, horizon: usize, window: usize) -> Self {
        self.horizon = horizon;
        self.window = window;
        self
    }

    #[must_use]
    pub fn with_pairs(mut self, pairs: Vec<PairConfig>) -> Self {
        self.pairs = pairs;
        self
    }

    #[must_use]
    pub fn with_bands(mut self, bands: Vec<BandConfig>) -> Self {
        self.bands = bands;
        self
    }

    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Checks the configuration for values the analysis cannot run with.
    ///
    /// # Errors
    /// Returns `InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> AnalysisResult<()> {
        let invalid = |msg: String| Err(AnalysisError::InvalidConfig(msg));

        if self.horizon == 0 {
            return invalid("horizon must be at least 1".to_string());
        }
        if self.window < self.horizon {
            return invalid(format!(
                "window ({}) must be at least horizon ({})",
                self.window, self.horizon
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return invalid(format!("epsilon must be positive, got {}", self.epsilon));
        }
        if self.pairs.is_empty() {
            return invalid("no pairs configured".to_string());
        }
        if self.bands.is_empty() {
            return invalid("no bands configured".to_string());
        }

        let mut labels = HashSet::new();
        for band in &self.bands {
            if !(band.flo.is_finite() && band.fhi.is_finite()) || band.flo < 0.0 {
                return invalid(format!(
                    "band '{}' has invalid edges [{}, {}]",
                    band.label, band.flo, band.fhi
                ));
            }
            if band.flo > band.fhi {
                return invalid(format!(
                    "band '{}' has flo {} above fhi {}",
                    band.label, band.flo, band.fhi
                ));
            }
            if band.surrogates == 0 {
                return invalid(format!("band '{}' requests zero surrogates", band.label));
            }
            if !labels.insert(band.label.as_str()) {
                return invalid(format!("duplicate band label '{}'", band.label));
            }
        }

        if !self.labs.is_empty() {
            for pair in &self.pairs {
                for lab in [&pair.a, &pair.b] {
                    if !self.labs.contains_key(lab) {
                        return invalid(format!(
                            "pair {} references lab '{lab}' with no configured path",
                            pair.label()
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Lab identifiers referenced by any pair, deduplicated, in first-use order.
    #[must_use]
    pub fn referenced_labs(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.pairs
            .iter()
            .flat_map(|p| [p.a.clone(), p.b.clone()])
            .filter(|lab| seen.insert(lab.clone()))
            .collect()
    }
}

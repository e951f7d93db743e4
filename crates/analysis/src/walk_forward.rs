//! Walk-forward predictive skill of a phasor sequence.
//!
//! The forecast rule is causal: at evaluation time `t` the mean lag-`H` phase
//! advance is estimated from `prod[t-W ..= t-H]`, where
//! `prod[i] = u[i+H]·conj(u[i])`. Every term in that window only touches
//! `u[..=t]`. The prediction `a·u[t]` is compared with the realized `u[t+H]`.
//!
//! # Walk-Forward Process
//!
//! 1. Build the lag-`H` advance sequence `prod`
//! 2. For each `t` in `[W, len - H)`, average the trailing advances
//! 3. Rotate the current phasor by that average to predict `u[t+H]`
//! 4. Score `Re(pred·conj(true))` and average over all `t`

use num_complex::Complex64;
use phase_forecast_core::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

use crate::phasor::Phasor;

/// Configuration for walk-forward scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    /// Prediction horizon H in samples.
    pub horizon: usize,
    /// Trailing estimation window W in samples.
    pub window: usize,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            horizon: 30,
            window: 730,
        }
    }
}

impl WalkForwardConfig {
    #[must_use]
    pub fn new(horizon: usize, window: usize) -> Self {
        Self { horizon, window }
    }

    /// Shortest sequence with at least one evaluation time.
    #[must_use]
    pub fn min_length(&self) -> usize {
        self.window + self.horizon + 1
    }
}

/// Skill together with the number of evaluation times it averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardScore {
    pub skill: f64,
    pub evaluations: usize,
}

/// Causal lag-based scorer over phasor sequences.
#[derive(Debug, Clone, Copy)]
pub struct WalkForwardScorer {
    config: WalkForwardConfig,
}

impl Default for WalkForwardScorer {
    fn default() -> Self {
        Self::new(WalkForwardConfig::default())
    }
}

impl WalkForwardScorer {
    #[must_use]
    pub fn new(config: WalkForwardConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &WalkForwardConfig {
        &self.config
    }

    /// Checks that the configuration and sequence length admit at least one evaluation.
    ///
    /// # Errors
    /// `InvalidConfig` if `H == 0` or `W < H`; `InsufficientLength` if `len < W + H + 1`.
    pub fn validate_len(&self, len: usize) -> AnalysisResult<()> {
        let WalkForwardConfig { horizon, window } = self.config;
        if horizon == 0 {
            return Err(AnalysisError::InvalidConfig(
                "walk-forward horizon must be at least 1".to_string(),
            ));
        }
        if window < horizon {
            return Err(AnalysisError::InvalidConfig(format!(
                "walk-forward window {window} is shorter than horizon {horizon}"
            )));
        }
        if len < self.config.min_length() {
            return Err(AnalysisError::InsufficientLength {
                actual: len,
                required: self.config.min_length(),
                window,
                horizon,
            });
        }
        Ok(())
    }

    /// Number of evaluation times for a sequence of `len` samples.
    #[must_use]
    pub fn evaluation_count(&self, len: usize) -> usize {
        len.saturating_sub(self.config.window + self.config.horizon)
    }

    /// Per-evaluation agreement `Re(pred·conj(true))`, ordered by evaluation time.
    ///
    /// # Errors
    /// See [`WalkForwardScorer::validate_len`].
    pub fn contributions(&self, u: &Phasor) -> AnalysisResult<Vec<f64>> {
        let u = u.as_slice();
        self.validate_len(u.len())?;

        let WalkForwardConfig { horizon, window } = self.config;

        // prefix[i] = sum of prod[..i]
        let mut prefix = Vec::with_capacity(u.len() - horizon + 1);
        prefix.push(Complex64::new(0.0, 0.0));
        let mut running = Complex64::new(0.0, 0.0);
        for i in 0..u.len() - horizon {
            running += u[i + horizon] * u[i].conj();
            prefix.push(running);
        }

        let span = (window - horizon + 1) as f64;
        let contributions = (window..u.len() - horizon)
            .map(|t| {
                let advance = (prefix[t - horizon + 1] - prefix[t - window]) / span;
                let pred = advance * u[t];
                let truth = u[t + horizon];
                (pred * truth.conj()).re
            })
            .collect();
        Ok(contributions)
    }

    /// Mean walk-forward skill with its evaluation count.
    ///
    /// # Errors
    /// See [`WalkForwardScorer::validate_len`].
    pub fn score_detailed(&self, u: &Phasor) -> AnalysisResult<WalkForwardScore> {
        let contributions = self.contributions(u)?;
        let evaluations = contributions.len();
        let skill = contributions.iter().sum::<f64>() / evaluations as f64;
        Ok(WalkForwardScore { skill, evaluations })
    }

    /// Mean walk-forward skill.
    ///
    /// # Errors
    /// See [`WalkForwardScorer::validate_len`].
    pub fn score(&self, u: &Phasor) -> AnalysisResult<f64> {
        Ok(self.score_detailed(u)?.skill)
    }
}

/// Walk-forward skill of `u` at horizon `horizon` with trailing window `window`.
///
/// # Errors
/// See [`WalkForwardScorer::validate_len`].
pub fn walk_skill(u: &Phasor, horizon: usize, window: usize) -> AnalysisResult<f64> {
    WalkForwardScorer::new(WalkForwardConfig::new(horizon, window)).score(u)
}

//! Relative phase between two analytic signals.

use num_complex::Complex64;
use phase_forecast_core::{AnalysisError, AnalysisResult};

use crate::spectral::AnalyticSignal;

/// Default stabilizer added to the product magnitude before normalizing.
pub const DEFAULT_EPSILON: f64 = 1e-12;

/// Unit-modulus phase difference sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Phasor(Vec<Complex64>);

impl Phasor {
    #[must_use]
    pub fn new(samples: Vec<Complex64>) -> Self {
        Self(samples)
    }

    /// Unit phasors `e^{i·phase}` for the given angles.
    #[must_use]
    pub fn from_phases(phases: &[f64]) -> Self {
        Self(
            phases
                .iter()
                .map(|&p| Complex64::from_polar(1.0, p))
                .collect(),
        )
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Complex64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Computes `u[t] = zA[t]·conj(zB[t]) / (|zA[t]·conj(zB[t])| + epsilon)`.
///
/// Where the raw product vanishes the result tends to zero instead of NaN.
#[derive(Debug, Clone, Copy)]
pub struct PhasorEngine {
    epsilon: f64,
}

impl Default for PhasorEngine {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}

impl PhasorEngine {
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// # Errors
    /// Returns `LengthMismatch` if the signals differ in length.
    pub fn phasor(&self, za: &AnalyticSignal, zb: &AnalyticSignal) -> AnalysisResult<Phasor> {
        if za.len() != zb.len() {
            return Err(AnalysisError::LengthMismatch {
                context: "phasor inputs",
                expected: za.len(),
                actual: zb.len(),
            });
        }

        let u = za
            .as_slice()
            .iter()
            .zip(zb.as_slice())
            .map(|(a, b)| {
                let product = a * b.conj();
                product / (product.norm() + self.epsilon)
            })
            .collect();
        Ok(Phasor(u))
    }
}

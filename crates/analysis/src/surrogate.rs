//! Surrogate replicas for the null distribution.
//!
//! Phase randomization keeps every bin's amplitude and the phase of every bin
//! outside the band mask, and replaces in-band phases with independent
//! uniform draws on `[0, 2π)`. Exactly `mask.count()` uniforms are consumed
//! per call, in ascending bin order.
//!
//! Circular shifting rotates a complex sequence by a uniform random lag,
//! consuming one integer draw per call.

use std::f64::consts::TAU;

use num_complex::Complex64;
use phase_forecast_core::{AnalysisError, AnalysisResult, NullModel};
use rand::Rng;

use crate::spectral::{AnalyticSignal, FrequencyMask, SpectralBander};

/// Counter-based RNG seed generation using SplitMix64.
///
/// Maps a base seed and a counter to a well-mixed 64-bit seed, so independent
/// generators can be created per task without sharing state.
#[inline]
#[must_use]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    // See: https://xoshiro.di.unimi.it/splitmix64.c
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Seed of the independent stream for one (pair, band, draw) task.
#[must_use]
pub fn stream_seed(base_seed: u64, pair: usize, band: usize, draw: usize) -> u64 {
    let pair_seed = counter_rng_seed(base_seed, pair as u64);
    let band_seed = counter_rng_seed(pair_seed, band as u64);
    counter_rng_seed(band_seed, draw as u64)
}

/// Replaces the phase of every masked bin with a uniform draw on `[0, 2π)`.
///
/// # Errors
/// Returns `LengthMismatch` if the mask and spectrum differ in length.
pub fn phase_randomize<R: Rng + ?Sized>(
    spectrum: &[Complex64],
    mask: &FrequencyMask,
    rng: &mut R,
) -> AnalysisResult<Vec<Complex64>> {
    if mask.bins().len() != spectrum.len() {
        return Err(AnalysisError::LengthMismatch {
            context: "surrogate spectrum",
            expected: mask.bins().len(),
            actual: spectrum.len(),
        });
    }

    let surrogate = spectrum
        .iter()
        .zip(mask.bins())
        .map(|(&x, &randomize)| {
            if randomize {
                Complex64::from_polar(x.norm(), rng.gen_range(0.0..TAU))
            } else {
                x
            }
        })
        .collect();
    Ok(surrogate)
}

/// Rolls `z` forward by a uniform random lag `k` in `[0, n)`: `out[i] = z[(i - k) mod n]`.
pub fn circular_shift<R: Rng + ?Sized>(z: &AnalyticSignal, rng: &mut R) -> AnalyticSignal {
    let n = z.len();
    if n == 0 {
        return z.clone();
    }
    let k = rng.gen_range(0..n);
    let mut shifted = z.as_slice().to_vec();
    shifted.rotate_right(k);
    AnalyticSignal::new(shifted)
}

/// Builds surrogate versions of series B for one null model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurrogateGenerator {
    model: NullModel,
}

impl SurrogateGenerator {
    #[must_use]
    pub fn new(model: NullModel) -> Self {
        Self { model }
    }

    #[must_use]
    pub fn model(&self) -> NullModel {
        self.model
    }

    /// Phase-randomized copy of `spectrum` restricted to `mask`.
    ///
    /// # Errors
    /// Returns `LengthMismatch` if the mask and spectrum differ in length.
    pub fn surrogate<R: Rng + ?Sized>(
        &self,
        spectrum: &[Complex64],
        mask: &FrequencyMask,
        rng: &mut R,
    ) -> AnalysisResult<Vec<Complex64>> {
        phase_randomize(spectrum, mask, rng)
    }

    /// One surrogate analytic signal for B.
    ///
    /// Phase randomization rebuilds the signal from a randomized spectrum
    /// through the same band-limiting path as the real data; circular
    /// shifting rotates the real analytic signal `zb`.
    ///
    /// # Errors
    /// Propagates length mismatches and FFT failures.
    pub fn analytic_surrogate<R: Rng + ?Sized>(
        &self,
        bander: &SpectralBander,
        spectrum: &[Complex64],
        mask: &FrequencyMask,
        zb: &AnalyticSignal,
        rng: &mut R,
    ) -> AnalysisResult<AnalyticSignal> {
        match self.model {
            NullModel::PhaseRandomized => {
                let randomized = self.surrogate(spectrum, mask, rng)?;
                bander.analytic_from_spectrum(&randomized, mask)
            }
            NullModel::CircularShift => Ok(circular_shift(zb, rng)),
        }
    }
}

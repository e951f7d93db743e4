//! Frequency-band masks and band-limited analytic signals.
//!
//! The sampling interval is one day, so rfft bin `k` of an `n`-sample series
//! sits at `k / n` cycles/day. A band mask selects bins with frequency in
//! `[flo, fhi]`, both edges inclusive.
//!
//! The analytic signal is built in two stages: the masked half-spectrum is
//! inverse-transformed into a real band-limited series, and that series is
//! then given its quadrature companion with the standard one-sided spectrum
//! weighting (DC and, for even `n`, Nyquist counted once, every other
//! positive bin doubled, negative bins dropped).

use std::sync::Arc;

use num_complex::Complex64;
use phase_forecast_core::{AnalysisError, AnalysisResult};
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

/// Frequency of each rfft bin for `n` samples spaced one day apart.
#[must_use]
pub fn bin_frequencies(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let val = 1.0 / n as f64;
    (0..=n / 2).map(|k| k as f64 * val).collect()
}

/// Boolean selection over the `n / 2 + 1` non-negative frequency bins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyMask {
    n: usize,
    bins: Vec<bool>,
}

impl FrequencyMask {
    /// Wraps an explicit bin selection for a series of length `n`.
    ///
    /// # Errors
    /// Returns `LengthMismatch` if `bins.len() != n / 2 + 1`.
    pub fn from_bins(n: usize, bins: Vec<bool>) -> AnalysisResult<Self> {
        if bins.len() != n / 2 + 1 {
            return Err(AnalysisError::LengthMismatch {
                context: "frequency mask",
                expected: n / 2 + 1,
                actual: bins.len(),
            });
        }
        Ok(Self { n, bins })
    }

    /// Time-domain length this mask was built for.
    #[must_use]
    pub fn series_len(&self) -> usize {
        self.n
    }

    #[must_use]
    pub fn bins(&self) -> &[bool] {
        &self.bins
    }

    /// Number of selected bins.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bins.iter().filter(|&&b| b).count()
    }

    #[must_use]
    pub fn is_selected(&self, k: usize) -> bool {
        self.bins.get(k).copied().unwrap_or(false)
    }

    /// Indices of selected bins in ascending order.
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.bins
            .iter()
            .enumerate()
            .filter_map(|(k, &b)| b.then_some(k))
    }
}

/// Builds the inclusive band mask `[flo, fhi]` for a series of length `n`.
///
/// # Errors
/// Returns `DegenerateMask` if no bin falls inside the band.
pub fn band_mask(n: usize, flo: f64, fhi: f64) -> AnalysisResult<FrequencyMask> {
    let bins: Vec<bool> = bin_frequencies(n)
        .into_iter()
        .map(|f| f >= flo && f <= fhi)
        .collect();

    if !bins.iter().any(|&b| b) {
        return Err(AnalysisError::DegenerateMask { flo, fhi, n });
    }
    FrequencyMask::from_bins(n, bins)
}

/// Complex signal whose real part is a band-limited series and whose
/// imaginary part is its quadrature companion.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticSignal(Vec<Complex64>);

impl AnalyticSignal {
    #[must_use]
    pub fn new(samples: Vec<Complex64>) -> Self {
        Self(samples)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Complex64] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Complex64> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Real part, i.e. the band-limited series.
    #[must_use]
    pub fn real_part(&self) -> Vec<f64> {
        self.0.iter().map(|z| z.re).collect()
    }

    /// Instantaneous amplitude.
    #[must_use]
    pub fn amplitude(&self) -> Vec<f64> {
        self.0.iter().map(|z| z.norm()).collect()
    }

    /// Instantaneous phase in radians.
    #[must_use]
    pub fn phase(&self) -> Vec<f64> {
        self.0.iter().map(|z| z.arg()).collect()
    }
}

/// Planned transforms for one series length.
pub struct SpectralBander {
    len: usize,
    forward_r2c: Arc<dyn RealToComplex<f64>>,
    inverse_c2r: Arc<dyn ComplexToReal<f64>>,
    forward_c2c: Arc<dyn Fft<f64>>,
    inverse_c2c: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for SpectralBander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralBander").field("len", &self.len).finish()
    }
}

impl SpectralBander {
    /// Plans forward and inverse transforms for series of length `len`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for a zero length.
    pub fn new(len: usize) -> AnalysisResult<Self> {
        if len == 0 {
            return Err(AnalysisError::InvalidConfig(
                "spectral length must be positive".to_string(),
            ));
        }

        let mut planner_r2c = RealFftPlanner::<f64>::new();
        let mut planner_c2c = FftPlanner::<f64>::new();

        Ok(Self {
            len,
            forward_r2c: planner_r2c.plan_fft_forward(len),
            inverse_c2r: planner_r2c.plan_fft_inverse(len),
            forward_c2c: planner_c2c.plan_fft_forward(len),
            inverse_c2c: planner_c2c.plan_fft_inverse(len),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the non-negative half-spectrum.
    #[must_use]
    pub fn spectrum_len(&self) -> usize {
        self.len / 2 + 1
    }

    /// Builds the inclusive band mask for this bander's length.
    ///
    /// # Errors
    /// Returns `DegenerateMask` if the band selects no bins.
    pub fn mask(&self, flo: f64, fhi: f64) -> AnalysisResult<FrequencyMask> {
        band_mask(self.len, flo, fhi)
    }

    /// Real-to-complex forward transform (unnormalized).
    ///
    /// # Errors
    /// Returns `LengthMismatch` if `x` has the wrong length.
    pub fn spectrum(&self, x: &[f64]) -> AnalysisResult<Vec<Complex64>> {
        self.check_len("forward transform input", self.len, x.len())?;

        let mut input = x.to_vec();
        let mut output = self.forward_r2c.make_output_vec();
        self.forward_r2c
            .process(&mut input, &mut output)
            .map_err(|e| AnalysisError::Fft(e.to_string()))?;
        Ok(output)
    }

    /// Zeroes bins outside `mask` and inverse-transforms to a real series.
    ///
    /// Imaginary parts of the DC bin, and of the Nyquist bin for even
    /// lengths, carry no information in a real signal and are dropped.
    ///
    /// # Errors
    /// Returns `LengthMismatch` if the spectrum or mask does not match this length.
    pub fn band_limited(
        &self,
        spectrum: &[Complex64],
        mask: &FrequencyMask,
    ) -> AnalysisResult<Vec<f64>> {
        self.check_len("half spectrum", self.spectrum_len(), spectrum.len())?;
        self.check_len("mask series length", self.len, mask.series_len())?;

        let zero = Complex64::new(0.0, 0.0);
        let mut masked: Vec<Complex64> = spectrum
            .iter()
            .zip(mask.bins())
            .map(|(&x, &keep)| if keep { x } else { zero })
            .collect();

        masked[0].im = 0.0;
        if self.len % 2 == 0 {
            let nyquist = masked.len() - 1;
            masked[nyquist].im = 0.0;
        }

        let mut output = self.inverse_c2r.make_output_vec();
        self.inverse_c2r
            .process(&mut masked, &mut output)
            .map_err(|e| AnalysisError::Fft(e.to_string()))?;

        let scale = 1.0 / self.len as f64;
        for value in output.iter_mut() {
            *value *= scale;
        }
        Ok(output)
    }

    /// Analytic representation of a real series.
    ///
    /// # Errors
    /// Returns `LengthMismatch` if `y` has the wrong length.
    pub fn hilbert(&self, y: &[f64]) -> AnalysisResult<AnalyticSignal> {
        self.check_len("analytic transform input", self.len, y.len())?;

        let mut buffer: Vec<Complex64> = y.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.forward_c2c.process(&mut buffer);

        // H[0] = 1, H[1..(n+1)/2] = 2, H[n/2] = 1 for even n, the rest 0
        let n = self.len;
        let positive_end = (n + 1) / 2;
        for value in buffer.iter_mut().take(positive_end).skip(1) {
            *value *= 2.0;
        }
        let negative_start = if n % 2 == 0 { n / 2 + 1 } else { positive_end };
        for value in buffer.iter_mut().skip(negative_start) {
            *value = Complex64::new(0.0, 0.0);
        }

        self.inverse_c2c.process(&mut buffer);
        let scale = 1.0 / n as f64;
        for value in buffer.iter_mut() {
            *value *= scale;
        }
        Ok(AnalyticSignal(buffer))
    }

    /// Band-limited analytic signal from a precomputed half-spectrum.
    ///
    /// # Errors
    /// Propagates length mismatches and FFT failures.
    pub fn analytic_from_spectrum(
        &self,
        spectrum: &[Complex64],
        mask: &FrequencyMask,
    ) -> AnalysisResult<AnalyticSignal> {
        let band = self.band_limited(spectrum, mask)?;
        self.hilbert(&band)
    }

    /// Band-limited analytic signal of a real series.
    ///
    /// # Errors
    /// Propagates length mismatches and FFT failures.
    pub fn analytic_signal(&self, x: &[f64], mask: &FrequencyMask) -> AnalysisResult<AnalyticSignal> {
        let spectrum = self.spectrum(x)?;
        self.analytic_from_spectrum(&spectrum, mask)
    }

    fn check_len(&self, context: &'static str, expected: usize, actual: usize) -> AnalysisResult<()> {
        if expected != actual {
            return Err(AnalysisError::LengthMismatch {
                context,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

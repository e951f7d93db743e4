//! One-sided Monte-Carlo significance of a real skill against surrogate skills.
//!
//! `p = (#{null >= real} + 1) / (Ns + 1)`, so `p` lies in `[1/(Ns+1), 1]`.

use phase_forecast_core::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

/// Skill samples from surrogate draws for one (pair, band).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullDistribution {
    samples: Vec<f64>,
}

impl NullDistribution {
    #[must_use]
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return f64::NAN;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Quantile with linear interpolation between order statistics.
    #[must_use]
    pub fn quantile(&self, q: f64) -> f64 {
        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);
        quantile_sorted(&sorted, q)
    }

    /// Count of samples at or above `value`.
    #[must_use]
    pub fn count_at_or_above(&self, value: f64) -> usize {
        self.samples.iter().filter(|&&s| s >= value).count()
    }
}

/// Linear-interpolation quantile of an ascending slice at position `q·(n-1)`.
#[must_use]
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Conservative one-sided p-value with +1 correction.
#[must_use]
pub fn monte_carlo_p_value(null: &[f64], real: f64) -> f64 {
    let exceed = null.iter().filter(|&&s| s >= real).count();
    (exceed + 1) as f64 / (null.len() + 1) as f64
}

/// Outcome of a significance test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignificanceSummary {
    pub real_skill: f64,
    pub p_value: f64,
    pub null_mean: f64,
    pub null_95: f64,
    pub surrogates: usize,
}

/// Compares a real skill with its null distribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignificanceTester;

impl SignificanceTester {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// # Errors
    /// Returns `ConfigurationMismatch` if the null holds a number of samples
    /// other than `expected_surrogates`.
    pub fn test(
        &self,
        real_skill: f64,
        null: &NullDistribution,
        expected_surrogates: usize,
    ) -> AnalysisResult<SignificanceSummary> {
        if null.len() != expected_surrogates {
            return Err(AnalysisError::ConfigurationMismatch {
                expected: expected_surrogates,
                actual: null.len(),
            });
        }

        Ok(SignificanceSummary {
            real_skill,
            p_value: monte_carlo_p_value(null.samples(), real_skill),
            null_mean: null.mean(),
            null_95: null.quantile(0.95),
            surrogates: null.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn null_0_to_99() -> NullDistribution {
        NullDistribution::new((0..100).map(|i| i as f64 / 100.0).collect())
    }

    #[test]
    fn p_value_counts_ties_as_exceedances() {
        let null = NullDistribution::new(vec![0.1, 0.5, 0.5, 0.9]);
        let summary = SignificanceTester::new().test(0.5, &null, 4).unwrap();
        assert!((summary.p_value - 4.0 / 5.0).abs() < 1e-15);
    }

    #[test]
    fn p_value_floor_is_one_over_ns_plus_one() {
        let null = null_0_to_99();
        let summary = SignificanceTester::new().test(5.0, &null, 100).unwrap();
        assert!((summary.p_value - 1.0 / 101.0).abs() < 1e-15);
    }

    #[test]
    fn p_value_ceiling_is_one() {
        let null = null_0_to_99();
        let summary = SignificanceTester::new().test(-5.0, &null, 100).unwrap();
        assert_eq!(summary.p_value, 1.0);
    }

    #[test]
    fn p_value_never_increases_as_real_skill_grows() {
        let null = null_0_to_99();
        let mut previous = f64::INFINITY;
        for step in 0..=120 {
            let real = -0.1 + step as f64 * 0.01;
            let p = monte_carlo_p_value(null.samples(), real);
            assert!(p <= previous);
            assert!((1.0 / 101.0..=1.0).contains(&p));
            previous = p;
        }
    }

    #[test]
    fn mismatched_count_is_configuration_error() {
        let null = NullDistribution::new(vec![0.0; 9]);
        let err = SignificanceTester::new().test(0.0, &null, 10).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::ConfigurationMismatch {
                expected: 10,
                actual: 9
            }
        );
    }

    #[test]
    fn summary_reports_mean_and_95th_percentile() {
        let null = null_0_to_99();
        let summary = SignificanceTester::new().test(0.5, &null, 100).unwrap();
        assert!((summary.null_mean - 0.495).abs() < 1e-12);
        // position 0.95 * 99 = 94.05 -> 0.94 + 0.05 * 0.01
        assert!((summary.null_95 - 0.9405).abs() < 1e-12);
        assert_eq!(summary.surrogates, 100);
    }

    #[test]
    fn quantile_of_unsorted_samples() {
        let null = NullDistribution::new(vec![3.0, 1.0, 2.0]);
        assert_eq!(null.quantile(0.5), 2.0);
        assert_eq!(null.quantile(0.0), 1.0);
        assert_eq!(null.quantile(1.0), 3.0);
        assert!((null.quantile(0.25) - 1.5).abs() < 1e-15);
    }

    #[test]
    fn quantile_sorted_handles_small_inputs() {
        assert!(quantile_sorted(&[], 0.5).is_nan());
        assert_eq!(quantile_sorted(&[4.0], 0.95), 4.0);
    }
}

//! Time series containers.
//!
//! A [`TimeSeries`] holds irregularly sampled clock-comparison values keyed by
//! fractional day number (MJD). An [`AlignedPair`] holds two series resampled
//! onto a shared integer-day grid.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// Ordered (day, value) samples with strictly increasing, finite timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    label: String,
    days: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Creates a series from parallel timestamp and value vectors.
    ///
    /// # Errors
    /// Returns `InvalidSeries` if the vectors differ in length, are empty,
    /// contain non-finite entries, or timestamps are not strictly increasing.
    pub fn new(label: impl Into<String>, days: Vec<f64>, values: Vec<f64>) -> AnalysisResult<Self> {
        let label = label.into();
        let invalid = |reason: String| AnalysisError::InvalidSeries {
            label: label.clone(),
            reason,
        };

        if days.len() != values.len() {
            return Err(invalid(format!(
                "{} timestamps but {} values",
                days.len(),
                values.len()
            )));
        }
        if days.is_empty() {
            return Err(invalid("no samples".to_string()));
        }
        if let Some(i) = days.iter().position(|d| !d.is_finite()) {
            return Err(invalid(format!("non-finite timestamp at index {i}")));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(invalid(format!("non-finite value at index {i}")));
        }
        if let Some(i) = days.windows(2).position(|w| w[1] <= w[0]) {
            return Err(invalid(format!(
                "timestamps not strictly increasing at index {}",
                i + 1
            )));
        }

        Ok(Self {
            label,
            days,
            values,
        })
    }

    /// Creates a series from `(day, value)` pairs.
    ///
    /// # Errors
    /// Same conditions as [`TimeSeries::new`].
    pub fn from_points(
        label: impl Into<String>,
        points: impl IntoIterator<Item = (f64, f64)>,
    ) -> AnalysisResult<Self> {
        let (days, values) = points.into_iter().unzip();
        Self::new(label, days, values)
    }

    /// Series identifier (lab name).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Sample timestamps in days.
    #[must_use]
    pub fn days(&self) -> &[f64] {
        &self.days
    }

    /// Sample values in nanoseconds.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Always false for a constructed series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First timestamp.
    #[must_use]
    pub fn first_day(&self) -> f64 {
        self.days[0]
    }

    /// Last timestamp.
    #[must_use]
    pub fn last_day(&self) -> f64 {
        self.days[self.days.len() - 1]
    }
}

/// Two detrended sequences sampled on the same integer-day grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPair {
    /// First grid day (inclusive).
    pub start_day: i64,
    /// Last grid day (inclusive).
    pub end_day: i64,
    /// Detrended samples of the first series.
    pub a: Vec<f64>,
    /// Detrended samples of the second series.
    pub b: Vec<f64>,
}

impl AlignedPair {
    /// Grid length shared by both sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// True when the grid holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_sorted_finite_samples() {
        let series = TimeSeries::new("NIST", vec![1.0, 2.5, 3.0], vec![0.1, 0.2, 0.3]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.label(), "NIST");
        assert_eq!(series.first_day(), 1.0);
        assert_eq!(series.last_day(), 3.0);
    }

    #[test]
    fn new_rejects_empty_series() {
        let err = TimeSeries::new("PTB", vec![], vec![]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidSeries { .. }));
    }

    #[test]
    fn new_rejects_length_mismatch() {
        assert!(TimeSeries::new("PTB", vec![1.0, 2.0], vec![0.0]).is_err());
    }

    #[test]
    fn new_rejects_duplicate_timestamps() {
        let err = TimeSeries::new("VSL", vec![1.0, 1.0], vec![0.0, 1.0]).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn new_rejects_nan_values() {
        assert!(TimeSeries::new("NICT", vec![1.0, 2.0], vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn from_points_unzips_pairs() {
        let series = TimeSeries::from_points("A", [(0.0, 5.0), (1.0, 6.0)]).unwrap();
        assert_eq!(series.days(), &[0.0, 1.0]);
        assert_eq!(series.values(), &[5.0, 6.0]);
    }
}

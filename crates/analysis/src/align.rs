//! Integer-grid alignment and linear detrending of two irregular series.
//!
//! Both series are linearly interpolated onto the integer days they both
//! cover, `ceil(max(first)) ..= floor(min(last))`, and each resampled
//! sequence has its ordinary-least-squares line removed.

use phase_forecast_core::{AlignedPair, AnalysisError, AnalysisResult, TimeSeries};

/// Maps pairs of series onto a shared integer-day grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridAligner;

impl GridAligner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Computes the inclusive integer grid both series cover.
    ///
    /// # Errors
    /// Returns `InsufficientOverlap` if the grid is empty.
    pub fn grid_bounds(a: &TimeSeries, b: &TimeSeries) -> AnalysisResult<(i64, i64)> {
        let start = a.first_day().max(b.first_day()).ceil() as i64;
        let end = a.last_day().min(b.last_day()).floor() as i64;
        if end < start {
            return Err(AnalysisError::InsufficientOverlap { start, end });
        }
        Ok((start, end))
    }

    /// Aligns and detrends two series.
    ///
    /// # Errors
    /// Returns `InsufficientOverlap` if the series share no integer day.
    pub fn align(&self, a: &TimeSeries, b: &TimeSeries) -> AnalysisResult<AlignedPair> {
        let (start_day, end_day) = Self::grid_bounds(a, b)?;

        let resampled_a = interpolate_onto_grid(a.days(), a.values(), start_day, end_day);
        let resampled_b = interpolate_onto_grid(b.days(), b.values(), start_day, end_day);

        tracing::debug!(
            "Aligned {} and {} on days {}..={} ({} samples)",
            a.label(),
            b.label(),
            start_day,
            end_day,
            resampled_a.len()
        );

        Ok(AlignedPair {
            start_day,
            end_day,
            a: detrend(&resampled_a),
            b: detrend(&resampled_b),
        })
    }
}

/// Linearly interpolates `(days, values)` at every integer day in `start..=end`.
///
/// Grid days must lie within `[days[0], days[last]]`; values at the edges are
/// held constant otherwise.
#[must_use]
pub fn interpolate_onto_grid(days: &[f64], values: &[f64], start: i64, end: i64) -> Vec<f64> {
    if end < start || days.is_empty() {
        return Vec::new();
    }

    let last = days.len() - 1;
    let mut out = Vec::with_capacity((end - start + 1) as usize);
    let mut j = 0;

    for day in start..=end {
        let x = day as f64;
        while j < last && days[j + 1] < x {
            j += 1;
        }

        let value = if x <= days[0] {
            values[0]
        } else if j == last {
            values[last]
        } else {
            let span = days[j + 1] - days[j];
            let frac = (x - days[j]) / span;
            values[j] + (values[j + 1] - values[j]) * frac
        };
        out.push(value);
    }

    out
}

/// Subtracts the least-squares line fitted against sample index.
#[must_use]
pub fn detrend(x: &[f64]) -> Vec<f64> {
    let (slope, intercept) = linear_fit(x);
    x.iter()
        .enumerate()
        .map(|(i, &v)| v - (slope * i as f64 + intercept))
        .collect()
}

/// Ordinary least-squares `(slope, intercept)` of `x` against `0..len`.
///
/// A single sample has slope 0 and intercept equal to the sample.
#[must_use]
pub fn linear_fit(x: &[f64]) -> (f64, f64) {
    let n = x.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    if n == 1 {
        return (0.0, x[0]);
    }

    let n_f = n as f64;
    let t_mean = (n_f - 1.0) / 2.0;
    let x_mean = x.iter().sum::<f64>() / n_f;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &v) in x.iter().enumerate() {
        let dt = i as f64 - t_mean;
        sxy += dt * (v - x_mean);
        sxx += dt * dt;
    }

    let slope = sxy / sxx;
    (slope, x_mean - slope * t_mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(label: &str, points: &[(f64, f64)]) -> TimeSeries {
        TimeSeries::from_points(label, points.iter().copied()).unwrap()
    }

    // ============================================================
    // grid_bounds Tests
    // ============================================================

    #[test]
    fn grid_bounds_round_inward() {
        let a = series("A", &[(0.4, 0.0), (10.7, 1.0)]);
        let b = series("B", &[(2.2, 0.0), (20.0, 1.0)]);
        assert_eq!(GridAligner::grid_bounds(&a, &b).unwrap(), (3, 10));
    }

    #[test]
    fn grid_bounds_single_shared_day() {
        let a = series("A", &[(0.0, 0.0), (5.0, 1.0)]);
        let b = series("B", &[(5.0, 0.0), (9.0, 1.0)]);
        assert_eq!(GridAligner::grid_bounds(&a, &b).unwrap(), (5, 5));
    }

    #[test]
    fn disjoint_series_fail_with_insufficient_overlap() {
        let a = series("A", &[(0.0, 0.0), (4.0, 1.0)]);
        let b = series("B", &[(6.0, 0.0), (9.0, 1.0)]);
        let err = GridAligner::new().align(&a, &b).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientOverlap { start: 6, end: 4 });
    }

    #[test]
    fn overlap_without_integer_day_fails() {
        let a = series("A", &[(0.1, 0.0), (0.9, 1.0)]);
        let b = series("B", &[(0.2, 0.0), (0.8, 1.0)]);
        assert!(matches!(
            GridAligner::new().align(&a, &b),
            Err(AnalysisError::InsufficientOverlap { .. })
        ));
    }

    // ============================================================
    // Interpolation Tests
    // ============================================================

    #[test]
    fn interpolation_is_linear_between_samples() {
        let days = [0.5, 2.5, 4.5];
        let values = [0.0, 2.0, 0.0];
        let out = interpolate_onto_grid(&days, &values, 1, 4);
        let expected = [0.5, 1.5, 1.5, 0.5];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{got} vs {want}");
        }
    }

    #[test]
    fn interpolation_hits_exact_samples() {
        let days = [0.0, 1.0, 2.0];
        let values = [3.0, -1.0, 7.0];
        let out = interpolate_onto_grid(&days, &values, 0, 2);
        assert_eq!(out.len(), 3);
        for (got, want) in out.iter().zip(values) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    // ============================================================
    // Detrend Tests
    // ============================================================

    #[test]
    fn detrend_removes_pure_line() {
        let x: Vec<f64> = (0..50).map(|i| 3.0 * i as f64 - 7.0).collect();
        for r in detrend(&x) {
            assert!(r.abs() < 1e-9);
        }
    }

    #[test]
    fn detrended_residuals_have_zero_fit() {
        let x: Vec<f64> = (0..200)
            .map(|i| {
                let t = i as f64;
                0.02 * t + (t * 0.7).sin() * 3.0 + (t * 0.13).cos()
            })
            .collect();
        let (slope, intercept) = linear_fit(&detrend(&x));
        assert!(slope.abs() < 1e-12);
        assert!(intercept.abs() < 1e-9);
    }

    #[test]
    fn detrend_single_sample_is_zero() {
        assert_eq!(detrend(&[5.0]), vec![0.0]);
    }

    // ============================================================
    // align Tests
    // ============================================================

    #[test]
    fn aligned_pair_has_equal_lengths_and_zero_trend() {
        let a = series(
            "A",
            &(0..120)
                .map(|i| {
                    let d = i as f64 * 1.3 + 0.25;
                    (d, 0.5 * d + (d / 9.0).sin())
                })
                .collect::<Vec<_>>(),
        );
        let b = series(
            "B",
            &(0..100)
                .map(|i| {
                    let d = i as f64 + 10.0;
                    (d, -2.0 * d + (d / 11.0).cos())
                })
                .collect::<Vec<_>>(),
        );

        let pair = GridAligner::new().align(&a, &b).unwrap();
        assert_eq!(pair.start_day, 10);
        assert_eq!(pair.end_day, 109);
        assert_eq!(pair.a.len(), pair.b.len());
        assert_eq!(pair.len(), 100);

        for seq in [&pair.a, &pair.b] {
            let (slope, intercept) = linear_fit(seq);
            assert!(slope.abs() < 1e-10);
            assert!(intercept.abs() < 1e-8);
        }
    }
}

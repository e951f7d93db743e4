//! Error taxonomy for phase forecasting experiments.
//!
//! Every failure here is local to a single (pair, band) combination. The
//! experiment runner decides whether to record it and continue or to abort.

use thiserror::Error;

/// Errors raised by alignment, spectral banding, scoring, and significance testing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A time series violates its construction invariants.
    #[error("invalid series '{label}': {reason}")]
    InvalidSeries {
        /// Series identifier.
        label: String,
        /// Which invariant failed.
        reason: String,
    },

    /// Two series share no usable integer-day grid.
    #[error("insufficient overlap: integer grid start {start} is after end {end}")]
    InsufficientOverlap {
        /// First integer day both series cover (ceil of max of minima).
        start: i64,
        /// Last integer day both series cover (floor of min of maxima).
        end: i64,
    },

    /// Series too short for the configured estimation window and horizon.
    #[error(
        "insufficient length: {actual} samples, need at least {required} \
         (window {window} + horizon {horizon} + 1)"
    )]
    InsufficientLength {
        /// Samples available.
        actual: usize,
        /// Minimum samples required.
        required: usize,
        /// Estimation window W.
        window: usize,
        /// Prediction horizon H.
        horizon: usize,
    },

    /// A frequency band selects no bins for the given series length.
    #[error("degenerate mask: band [{flo}, {fhi}] cycles/day selects no bins for length {n}")]
    DegenerateMask {
        /// Lower band edge in cycles/day.
        flo: f64,
        /// Upper band edge in cycles/day.
        fhi: f64,
        /// Series length.
        n: usize,
    },

    /// Requested surrogate count differs from the number of null samples produced.
    #[error("configuration mismatch: expected {expected} null samples, got {actual}")]
    ConfigurationMismatch {
        /// Configured surrogate count.
        expected: usize,
        /// Null samples actually supplied.
        actual: usize,
    },

    /// Two buffers that must match in length do not.
    #[error("length mismatch in {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Operation that detected the mismatch.
        context: &'static str,
        /// Expected length.
        expected: usize,
        /// Received length.
        actual: usize,
    },

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A pair references a series that was never loaded.
    #[error("unknown series '{0}'")]
    UnknownSeries(String),

    /// The FFT backend rejected its input.
    #[error("FFT error: {0}")]
    Fft(String),
}

/// Result alias used throughout the analysis crates.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

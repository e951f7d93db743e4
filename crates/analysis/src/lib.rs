//! Walk-forward phase-forecast significance analysis.
//!
//! This crate provides:
//! - Common-grid alignment and detrending of series pairs
//! - Band-limited analytic signals via FFT and Hilbert transform
//! - Relative phasors and causal walk-forward skill
//! - Surrogate null models and Monte-Carlo significance
//! - An experiment runner over configured pairs and bands

pub mod align;
pub mod phasor;
pub mod runner;
pub mod significance;
pub mod spectral;
pub mod surrogate;
pub mod walk_forward;

pub use align::{detrend, interpolate_onto_grid, linear_fit, GridAligner};
pub use phasor::{Phasor, PhasorEngine, DEFAULT_EPSILON};
pub use runner::{BandInspection, ExperimentReport, ExperimentRunner, PairInspection};
pub use significance::{
    monte_carlo_p_value, quantile_sorted, NullDistribution, SignificanceSummary,
    SignificanceTester,
};
pub use spectral::{band_mask, bin_frequencies, AnalyticSignal, FrequencyMask, SpectralBander};
pub use surrogate::{
    circular_shift, counter_rng_seed, phase_randomize, stream_seed, SurrogateGenerator,
};
pub use walk_forward::{walk_skill, WalkForwardConfig, WalkForwardScore, WalkForwardScorer};

//! Experiment orchestration over configured pairs and bands.
//!
//! For every pair the two series are aligned once and transformed once; for
//! every band the real phasor is scored and compared against surrogate
//! draws. Output slots follow pair order, then band order.
//!
//! A failed combination is recorded as [`RowOutcome::Failed`] in its slot and
//! the run continues, unless `fail_fast` is set. Every check that can reject a
//! combination runs before its first surrogate draw, so a rejected
//! combination leaves the shared random stream untouched.

use std::collections::HashMap;

use num_complex::Complex64;
use phase_forecast_core::{
    AlignedPair, AnalysisError, AnalysisResult, BandConfig, DrawMode, ExperimentConfig, PairConfig, ResultRow, RowOutcome, TimeSeries,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::align::GridAligner;
use crate::phasor::PhasorEngine;
use crate::significance::{NullDistribution, SignificanceTester};
use crate::spectral::{band_mask, AnalyticSignal, FrequencyMask, SpectralBander};
use crate::surrogate::{stream_seed, SurrogateGenerator};
use crate::walk_forward::{WalkForwardConfig, WalkForwardScorer};

const PROGRESS_EVERY: usize = 500;

/// Ordered outcomes of one experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub outcomes: Vec<RowOutcome>,
}

impl ExperimentReport {
    /// Completed rows in run order.
    pub fn rows(&self) -> impl Iterator<Item = &ResultRow> {
        self.outcomes.iter().filter_map(RowOutcome::row)
    }

    /// Failed slots in run order.
    pub fn failures(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|o| o.error().is_some())
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.rows().count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// Finds the slot for a pair and band label.
    #[must_use]
    pub fn get(&self, pair: &str, band: &str) -> Option<&RowOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.pair() == pair && o.band() == band)
    }
}

/// Per-band diagnostics from [`ExperimentRunner::inspect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandInspection {
    pub band: String,
    pub flo: f64,
    pub fhi: f64,
    /// Bins selected by the mask, if the band is not degenerate.
    pub selected_bins: Option<usize>,
    pub error: Option<String>,
}

/// Per-pair diagnostics from [`ExperimentRunner::inspect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairInspection {
    pub pair: String,
    pub start_day: Option<i64>,
    pub end_day: Option<i64>,
    pub samples: usize,
    /// Walk-forward evaluation times available at this length.
    pub evaluations: usize,
    pub bands: Vec<BandInspection>,
    pub error: Option<String>,
}

/// Aligned and transformed pair, shared by all bands.
struct PreparedPair {
    label: String,
    aligned: AlignedPair,
    bander: SpectralBander,
    spectrum_a: Vec<Complex64>,
    spectrum_b: Vec<Complex64>,
}

/// Everything one surrogate draw reads.
struct BandContext<'a> {
    bander: &'a SpectralBander,
    spectrum_b: &'a [Complex64],
    mask: &'a FrequencyMask,
    za: &'a AnalyticSignal,
    zb: &'a AnalyticSignal,
}

/// Aligns, bands, scores and tests every configured combination.
pub struct ExperimentRunner {
    config: ExperimentConfig,
    aligner: GridAligner,
    engine: PhasorEngine,
    scorer: WalkForwardScorer,
    generator: SurrogateGenerator,
    tester: SignificanceTester,
}

impl ExperimentRunner {
    /// Creates a runner after validating the configuration.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if validation fails.
    pub fn new(config: ExperimentConfig) -> AnalysisResult<Self> {
        config.validate()?;
        let scorer = WalkForwardScorer::new(WalkForwardConfig::new(config.horizon, config.window));
        Ok(Self {
            aligner: GridAligner::new(),
            engine: PhasorEngine::new(config.epsilon),
            scorer,
            generator: SurrogateGenerator::new(config.null_model),
            tester: SignificanceTester::new(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Runs every (pair, band) combination.
    ///
    /// # Errors
    /// Only with `fail_fast`: the first combination error aborts the run.
    pub fn run(&self, series: &HashMap<String, TimeSeries>) -> AnalysisResult<ExperimentReport> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut outcomes = Vec::with_capacity(self.config.pairs.len() * self.config.bands.len());

        tracing::info!(
            "Running {} pair(s) x {} band(s), H = {}, W = {}, null = {:?}, draws = {:?}, seed = {}",
            self.config.pairs.len(),
            self.config.bands.len(),
            self.config.horizon,
            self.config.window,
            self.config.null_model,
            self.config.draw_mode,
            self.config.seed
        );

        for (pair_idx, pair) in self.config.pairs.iter().enumerate() {
            let prepared = match self.prepare_pair(pair, series) {
                Ok(prepared) => prepared,
                Err(e) => {
                    if self.config.fail_fast {
                        return Err(e);
                    }
                    tracing::warn!("Pair {} failed: {}", pair.label(), e);
                    for band in &self.config.bands {
                        outcomes.push(RowOutcome::Failed {
                            pair: pair.label(),
                            band: band.label.clone(),
                            error: e.to_string(),
                        });
                    }
                    continue;
                }
            };

            for (band_idx, band) in self.config.bands.iter().enumerate() {
                match self.run_band(&prepared, band, pair_idx, band_idx, &mut rng) {
                    Ok(row) => outcomes.push(RowOutcome::Completed(row)),
                    Err(e) => {
                        if self.config.fail_fast {
                            return Err(e);
                        }
                        tracing::warn!("Pair {} band {} failed: {}", prepared.label, band.label, e);
                        outcomes.push(RowOutcome::Failed {
                            pair: prepared.label.clone(),
                            band: band.label.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        let report = ExperimentReport { outcomes };
        tracing::info!(
            "Experiment finished: {} completed, {} failed",
            report.completed_count(),
            report.failed_count()
        );
        Ok(report)
    }

    /// Reports grid and mask sizes without drawing surrogates.
    #[must_use]
    pub fn inspect(&self, series: &HashMap<String, TimeSeries>) -> Vec<PairInspection> {
        self.config
            .pairs
            .iter()
            .map(|pair| self.inspect_pair(pair, series))
            .collect()
    }

    fn inspect_pair(&self, pair: &PairConfig, series: &HashMap<String, TimeSeries>) -> PairInspection {
        let aligned = lookup(series, &pair.a)
            .and_then(|a| lookup(series, &pair.b).map(|b| (a, b)))
            .and_then(|(a, b)| self.aligner.align(a, b));

        let aligned = match aligned {
            Ok(aligned) => aligned,
            Err(e) => {
                return PairInspection {
                    pair: pair.label(),
                    start_day: None,
                    end_day: None,
                    samples: 0,
                    evaluations: 0,
                    bands: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };

        let n = aligned.len();
        let bands = self
            .config
            .bands
            .iter()
            .map(|band| match band_mask(n, band.flo, band.fhi) {
                Ok(mask) => BandInspection {
                    band: band.label.clone(),
                    flo: band.flo,
                    fhi: band.fhi,
                    selected_bins: Some(mask.count()),
                    error: None,
                },
                Err(e) => BandInspection {
                    band: band.label.clone(),
                    flo: band.flo,
                    fhi: band.fhi,
                    selected_bins: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        PairInspection {
            pair: pair.label(),
            start_day: Some(aligned.start_day),
            end_day: Some(aligned.end_day),
            samples: n,
            evaluations: self.scorer.evaluation_count(n),
            bands,
            error: self.scorer.validate_len(n).err().map(|e| e.to_string()),
        }
    }

    fn prepare_pair(
        &self,
        pair: &PairConfig,
        series: &HashMap<String, TimeSeries>,
    ) -> AnalysisResult<PreparedPair> {
        let a = lookup(series, &pair.a)?;
        let b = lookup(series, &pair.b)?;

        let aligned = self.aligner.align(a, b)?;
        self.scorer.validate_len(aligned.len())?;

        let bander = SpectralBander::new(aligned.len())?;
        let spectrum_a = bander.spectrum(&aligned.a)?;
        let spectrum_b = bander.spectrum(&aligned.b)?;

        tracing::info!(
            "Pair {}: {} samples on days {}..={}",
            pair.label(),
            aligned.len(),
            aligned.start_day,
            aligned.end_day
        );

        Ok(PreparedPair {
            label: pair.label(),
            aligned,
            bander,
            spectrum_a,
            spectrum_b,
        })
    }

    fn run_band(
        &self,
        prepared: &PreparedPair,
        band: &BandConfig,
        pair_idx: usize,
        band_idx: usize,
        rng: &mut ChaCha8Rng,
    ) -> AnalysisResult<ResultRow> {
        let bander = &prepared.bander;
        let mask = bander.mask(band.flo, band.fhi)?;

        let za = bander.analytic_from_spectrum(&prepared.spectrum_a, &mask)?;
        let zb = bander.analytic_from_spectrum(&prepared.spectrum_b, &mask)?;
        let u = self.engine.phasor(&za, &zb)?;
        let real_skill = self.scorer.score(&u)?;

        tracing::debug!(
            "Pair {} band {}: {} bins selected of {}, real skill {:.6}",
            prepared.label,
            band.label,
            mask.count(),
            prepared.aligned.len(),
            real_skill
        );

        let ctx = BandContext {
            bander,
            spectrum_b: &prepared.spectrum_b,
            mask: &mask,
            za: &za,
            zb: &zb,
        };

        let samples = match self.config.draw_mode {
            DrawMode::Sequential => (0..band.surrogates)
                .map(|draw| {
                    if (draw + 1) % PROGRESS_EVERY == 0 {
                        tracing::debug!("{} {}: draw {}/{}", prepared.label, band.label, draw + 1, band.surrogates);
                    }
                    self.surrogate_skill(&ctx, &mut *rng)
                })
                .collect::<AnalysisResult<Vec<f64>>>()?,
            DrawMode::Partitioned => (0..band.surrogates)
                .into_par_iter()
                .map(|draw| {
                    let seed = stream_seed(self.config.seed, pair_idx, band_idx, draw);
                    let mut draw_rng = ChaCha8Rng::seed_from_u64(seed);
                    self.surrogate_skill(&ctx, &mut draw_rng)
                })
                .collect::<AnalysisResult<Vec<f64>>>()?,
        };

        let summary = self
            .tester
            .test(real_skill, &NullDistribution::new(samples), band.surrogates)?;

        tracing::info!(
            "Pair {} band {} [{:.4}, {:.4}]: real skill {:.4}, null mean {:.4}, null 95% {:.4}, p = {:.4}",
            prepared.label,
            band.label,
            band.flo,
            band.fhi,
            summary.real_skill,
            summary.null_mean,
            summary.null_95,
            summary.p_value
        );

        Ok(ResultRow {
            pair: prepared.label.clone(),
            band: band.label.clone(),
            real_skill: summary.real_skill,
            null_mean: summary.null_mean,
            null_95: summary.null_95,
            p_value: summary.p_value,
            surrogates: summary.surrogates,
        })
    }

    fn surrogate_skill<R: Rng + ?Sized>(&self, ctx: &BandContext<'_>, rng: &mut R) -> AnalysisResult<f64> {
        let zb_null = self
            .generator
            .analytic_surrogate(ctx.bander, ctx.spectrum_b, ctx.mask, ctx.zb, rng)?;
        let u = self.engine.phasor(ctx.za, &zb_null)?;
        self.scorer.score(&u)
    }
}

fn lookup<'a>(series: &'a HashMap<String, TimeSeries>, label: &str) -> AnalysisResult<&'a TimeSeries> {
    series
        .get(label)
        .ok_or_else(|| AnalysisError::UnknownSeries(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use phase_forecast_core::NullModel;

    fn noise_series(label: &str, len: usize, seed: u64) -> TimeSeries {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        TimeSeries::from_points(label, (0..len).map(|i| (i as f64, rng.gen_range(-1.0..1.0))))
            .unwrap()
    }

    fn small_config(surrogates: usize) -> ExperimentConfig {
        let mut config = ExperimentConfig::default()
            .with_windows(10, 60)
            .with_pairs(vec![PairConfig::new("A", "B")])
            .with_bands(vec![
                BandConfig::new("mid", 0.08, 0.13, surrogates),
                BandConfig::new("high", 0.2, 0.3, surrogates),
            ]);
        config.labs.clear();
        config
    }

    fn two_series(len: usize) -> HashMap<String, TimeSeries> {
        HashMap::from([
            ("A".to_string(), noise_series("A", len, 1)),
            ("B".to_string(), noise_series("B", len, 2)),
        ])
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = small_config(10).with_windows(0, 10);
        assert!(ExperimentRunner::new(config).is_err());
    }

    #[test]
    fn run_produces_one_row_per_pair_and_band() {
        let runner = ExperimentRunner::new(small_config(20)).unwrap();
        let report = runner.run(&two_series(300)).unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.completed_count(), 2);
        let row = report.get("A-B", "high").unwrap().row().unwrap();
        assert_eq!(row.surrogates, 20);
        assert!((1.0 / 21.0..=1.0).contains(&row.p_value));
    }

    #[test]
    fn sequential_runs_are_reproducible() {
        let runner = ExperimentRunner::new(small_config(15)).unwrap();
        let series = two_series(250);
        assert_eq!(runner.run(&series).unwrap(), runner.run(&series).unwrap());
    }

    #[test]
    fn partitioned_runs_are_reproducible() {
        let config = small_config(15).with_draw_mode(DrawMode::Partitioned);
        let runner = ExperimentRunner::new(config).unwrap();
        let series = two_series(250);
        assert_eq!(runner.run(&series).unwrap(), runner.run(&series).unwrap());
    }

    #[test]
    fn different_seeds_change_the_null() {
        let series = two_series(250);
        let a = ExperimentRunner::new(small_config(15).with_seed(1))
            .unwrap()
            .run(&series)
            .unwrap();
        let b = ExperimentRunner::new(small_config(15).with_seed(2))
            .unwrap()
            .run(&series)
            .unwrap();
        let row_a = a.get("A-B", "mid").unwrap().row().unwrap();
        let row_b = b.get("A-B", "mid").unwrap().row().unwrap();
        assert_eq!(row_a.real_skill, row_b.real_skill);
        assert_ne!(row_a.null_mean, row_b.null_mean);
    }

    #[test]
    fn unknown_series_marks_every_band_failed() {
        let config = small_config(5).with_pairs(vec![
            PairConfig::new("A", "missing"),
            PairConfig::new("A", "B"),
        ]);
        let report = ExperimentRunner::new(config).unwrap().run(&two_series(200)).unwrap();
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.failed_count(), 2);
        assert!(report
            .get("A-missing", "mid")
            .unwrap()
            .error()
            .unwrap()
            .contains("missing"));
        assert!(report.get("A-B", "mid").unwrap().row().is_some());
    }

    #[test]
    fn degenerate_band_fails_alone() {
        let config = small_config(5).with_bands(vec![
            BandConfig::new("empty", 0.1001, 0.1002, 5),
            BandConfig::new("ok", 0.08, 0.13, 5),
        ]);
        let report = ExperimentRunner::new(config).unwrap().run(&two_series(200)).unwrap();
        assert!(report.get("A-B", "empty").unwrap().error().unwrap().contains("degenerate"));
        assert!(report.get("A-B", "ok").unwrap().row().is_some());
    }

    #[test]
    fn failed_band_does_not_consume_randomness() {
        let with_failure = small_config(8).with_bands(vec![
            BandConfig::new("empty", 0.1001, 0.1002, 8),
            BandConfig::new("ok", 0.08, 0.13, 8),
        ]);
        let without = small_config(8).with_bands(vec![BandConfig::new("ok", 0.08, 0.13, 8)]);
        let series = two_series(200);

        let a = ExperimentRunner::new(with_failure).unwrap().run(&series).unwrap();
        let b = ExperimentRunner::new(without).unwrap().run(&series).unwrap();
        assert_eq!(a.get("A-B", "ok"), b.get("A-B", "ok"));
    }

    #[test]
    fn short_series_fail_with_insufficient_length() {
        let report = ExperimentRunner::new(small_config(5))
            .unwrap()
            .run(&two_series(70))
            .unwrap();
        assert_eq!(report.failed_count(), 2);
        assert!(report.outcomes[0].error().unwrap().contains("insufficient length"));
    }

    #[test]
    fn fail_fast_aborts_on_first_error() {
        let config = small_config(5).with_fail_fast(true);
        let err = ExperimentRunner::new(config).unwrap().run(&two_series(70)).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientLength { .. }));
    }

    #[test]
    fn report_serializes_with_status_tags() {
        let report = ExperimentRunner::new(small_config(5))
            .unwrap()
            .run(&two_series(70))
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "failed");
        assert_eq!(json["outcomes"][1]["band"], "high");
    }

    #[test]
    fn circular_shift_null_runs() {
        let config = small_config(12).with_null_model(NullModel::CircularShift);
        let report = ExperimentRunner::new(config).unwrap().run(&two_series(240)).unwrap();
        assert_eq!(report.completed_count(), 2);
    }

    #[test]
    fn inspect_reports_grid_and_bins() {
        let runner = ExperimentRunner::new(small_config(5)).unwrap();
        let inspections = runner.inspect(&two_series(200));
        assert_eq!(inspections.len(), 1);
        let pair = &inspections[0];
        assert_eq!(pair.samples, 200);
        assert_eq!(pair.start_day, Some(0));
        assert_eq!(pair.end_day, Some(199));
        assert_eq!(pair.evaluations, 130);
        assert!(pair.error.is_none());
        assert!(pair.bands.iter().all(|b| b.selected_bins.unwrap() > 0));
    }

    #[test]
    fn inspect_flags_short_pairs() {
        let runner = ExperimentRunner::new(small_config(5)).unwrap();
        let inspections = runner.inspect(&two_series(50));
        assert!(inspections[0].error.as_ref().unwrap().contains("insufficient length"));
    }
}

//! Ingestion of per-lab clock-comparison CSV files.
//!
//! Each file carries at least the columns `mjd` (fractional Modified Julian
//! Date) and `value_ns` (clock offset in nanoseconds). Other columns are
//! ignored. Incomplete rows are dropped, samples are sorted by `mjd`, and
//! duplicate timestamps are averaged into a single sample.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use phase_forecast_core::TimeSeries;

pub const MJD_COLUMN: &str = "mjd";
pub const VALUE_COLUMN: &str = "value_ns";

pub struct LabCsvLoader;

impl LabCsvLoader {
    /// Loads one lab series, labelled with the file stem.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, a required column is missing,
    /// or no usable rows remain.
    pub fn load(path: impl AsRef<Path>) -> Result<TimeSeries> {
        let path = path.as_ref();
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::load_labelled(path, label)
    }

    /// Loads one lab series under an explicit label.
    ///
    /// # Errors
    /// See [`LabCsvLoader::load`].
    pub fn load_labelled(path: impl AsRef<Path>, label: impl Into<String>) -> Result<TimeSeries> {
        let path = path.as_ref();
        let label = label.into();
        let file = File::open(path)
            .with_context(|| format!("Failed to open lab CSV file: {}", path.display()))?;
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("Missing column '{}' in {}", name, path.display()))
        };
        let mjd_idx = column(MJD_COLUMN)?;
        let value_idx = column(VALUE_COLUMN)?;

        let mut points = Vec::new();
        let mut dropped = 0usize;
        for (line, record) in reader.records().enumerate() {
            let record = record
                .with_context(|| format!("Failed to read row {} of {}", line + 1, path.display()))?;
            match (
                parse_field(record.get(mjd_idx)),
                parse_field(record.get(value_idx)),
            ) {
                (Some(mjd), Some(value)) => points.push((mjd, value)),
                _ => dropped += 1,
            }
        }

        let raw = points.len();
        let points = collapse_duplicates(points);
        tracing::debug!(
            "Loaded {} from {}: {} rows kept, {} dropped, {} after merging duplicate mjd",
            label,
            path.display(),
            raw,
            dropped,
            points.len()
        );

        TimeSeries::from_points(label, points)
            .with_context(|| format!("No usable samples in {}", path.display()))
    }

    /// Loads every lab in `wanted` from its configured path.
    ///
    /// # Errors
    /// Returns error if a wanted lab has no configured path or fails to load.
    pub fn load_labs(
        labs: &BTreeMap<String, PathBuf>,
        wanted: &[String],
    ) -> Result<HashMap<String, TimeSeries>> {
        let mut series = HashMap::with_capacity(wanted.len());
        for lab in wanted {
            let path = labs
                .get(lab)
                .with_context(|| format!("No CSV path configured for lab '{lab}'"))?;
            let loaded = Self::load_labelled(path, lab.as_str())
                .with_context(|| format!("Failed to load lab '{lab}'"))?;
            tracing::info!(
                "Lab {}: {} samples, MJD {:.3} to {:.3}",
                lab,
                loaded.len(),
                loaded.first_day(),
                loaded.last_day()
            );
            series.insert(lab.clone(), loaded);
        }
        Ok(series)
    }
}

/// Parses a numeric field, treating empty, unparsable and non-finite as missing.
fn parse_field(field: Option<&str>) -> Option<f64> {
    field
        .filter(|f| !f.is_empty())
        .and_then(|f| f.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Sorts by timestamp and averages values that share one.
fn collapse_duplicates(mut points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    let mut count = 0usize;
    for (day, value) in points {
        match merged.last_mut() {
            Some(last) if last.0 == day => {
                // running mean
                count += 1;
                last.1 += (value - last.1) / count as f64;
            }
            _ => {
                merged.push((day, value));
                count = 1;
            }
        }
    }
    merged
}

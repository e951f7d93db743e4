use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use phase_forecast_core::RowOutcome;
use serde::{Deserialize, Serialize};

pub const RESULT_COLUMNS: [&str; 8] = [
    "pair",
    "band",
    "real_skill",
    "null_mean",
    "null_95",
    "p_value",
    "surrogates",
    "error",
];

/// Flat export record; numeric fields are empty for failed combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub pair: String,
    pub band: String,
    pub real_skill: Option<f64>,
    pub null_mean: Option<f64>,
    pub null_95: Option<f64>,
    pub p_value: Option<f64>,
    pub surrogates: Option<usize>,
    pub error: Option<String>,
}

impl From<&RowOutcome> for ResultRecord {
    fn from(outcome: &RowOutcome) -> Self {
        match outcome {
            RowOutcome::Completed(row) => Self {
                pair: row.pair.clone(),
                band: row.band.clone(),
                real_skill: Some(row.real_skill),
                null_mean: Some(row.null_mean),
                null_95: Some(row.null_95),
                p_value: Some(row.p_value),
                surrogates: Some(row.surrogates),
                error: None,
            },
            RowOutcome::Failed { pair, band, error } => Self {
                pair: pair.clone(),
                band: band.clone(),
                real_skill: None,
                null_mean: None,
                null_95: None,
                p_value: None,
                surrogates: None,
                error: Some(error.clone()),
            },
        }
    }
}

pub struct ResultWriter;

impl ResultWriter {
    /// Writes experiment outcomes to CSV, one record per (pair, band) in run order.
    ///
    /// Format: pair,band,real_skill,null_mean,null_95,p_value,surrogates,error
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_csv(path: impl AsRef<Path>, outcomes: &[RowOutcome]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        // Header is written explicitly so an empty run still yields one
        writer.write_record(RESULT_COLUMNS)?;
        for outcome in outcomes {
            writer.serialize(ResultRecord::from(outcome))?;
        }

        writer.flush()?;
        tracing::info!("Wrote {} result records to {}", outcomes.len(), path.display());
        Ok(())
    }

    /// Reads records previously written by [`ResultWriter::write_csv`].
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a record fails to parse.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<ResultRecord>> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
        reader
            .deserialize()
            .collect::<std::result::Result<Vec<ResultRecord>, _>>()
            .with_context(|| format!("Failed to parse result records in {}", path.display()))
    }

    /// Renders outcomes as a pretty-printed JSON array of export records.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(outcomes: &[RowOutcome]) -> Result<String> {
        let records: Vec<ResultRecord> = outcomes.iter().map(ResultRecord::from).collect();
        serde_json::to_string_pretty(&records).context("Failed to serialize results to JSON")
    }
}

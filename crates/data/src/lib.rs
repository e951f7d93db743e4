//! Data ingestion and result export for the phase-forecast experiment.
//!
//! This crate provides:
//! - Loading of per-lab `mjd,value_ns` CSV series
//! - CSV and JSON export of experiment outcomes

pub mod csv_storage;
pub mod lab_csv;

pub use csv_storage::{ResultRecord, ResultWriter, RESULT_COLUMNS};
pub use lab_csv::{LabCsvLoader, MJD_COLUMN, VALUE_COLUMN};

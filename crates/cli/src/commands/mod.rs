//! CLI commands for the phase-forecast experiment.

pub mod common;
pub mod inspect;
pub mod run_experiment;

pub use inspect::{run_inspect, InspectArgs};
pub use run_experiment::{run_experiment, RunExperimentArgs};

//! Run experiment CLI command.
//!
//! Loads the configured lab series, runs every (pair, band) combination
//! against its surrogate null, writes the result table and prints a summary.

use anyhow::Result;
use clap::Args;

use phase_forecast_analysis::{ExperimentReport, ExperimentRunner};
use phase_forecast_data::ResultWriter;

use super::common::{load_series, ConfigArgs, OutputFormat};

/// Arguments for the run command.
#[derive(Args, Debug, Clone)]
pub struct RunExperimentArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Result CSV path
    #[arg(short, long, default_value = "final_results.csv")]
    pub output: String,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Significance level used to flag rows in the text summary
    #[arg(long, default_value = "0.05")]
    pub alpha: f64,
}

/// Runs the experiment command.
pub fn run_experiment(args: RunExperimentArgs) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let config = args.config.load()?;

    tracing::info!(
        "Loaded config {}: {} lab(s), {} pair(s), {} band(s)",
        args.config.config,
        config.labs.len(),
        config.pairs.len(),
        config.bands.len()
    );

    let series = load_series(&config)?;
    let runner = ExperimentRunner::new(config)?;
    let report = runner.run(&series)?;

    ResultWriter::write_csv(&args.output, &report.outcomes)?;

    match format {
        OutputFormat::Text => println!("{}", render_text(&report, args.alpha)),
        OutputFormat::Json => println!("{}", ResultWriter::to_json(&report.outcomes)?),
    }

    Ok(())
}

/// Renders the report as a fixed-width table.
pub fn render_text(report: &ExperimentReport, alpha: f64) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("╔════════════════════════════════════════════════════════════════════════════════╗\n");
    output.push_str("║                     PHASE FORECAST SIGNIFICANCE RESULTS                        ║\n");
    output.push_str("╚════════════════════════════════════════════════════════════════════════════════╝\n");
    output.push_str(&format!(
        "  {:<12} {:<16} {:>10} {:>10} {:>10} {:>9} {:>6}\n",
        "PAIR", "BAND", "SKILL", "NULL MEAN", "NULL 95%", "P", "NS"
    ));

    for outcome in &report.outcomes {
        match outcome.row() {
            Some(row) => {
                let marker = if row.is_significant(alpha) { " *" } else { "" };
                output.push_str(&format!(
                    "  {:<12} {:<16} {:>10.4} {:>10.4} {:>10.4} {:>9.5} {:>6}{}\n",
                    row.pair,
                    row.band,
                    row.real_skill,
                    row.null_mean,
                    row.null_95,
                    row.p_value,
                    row.surrogates,
                    marker
                ));
            }
            None => {
                output.push_str(&format!(
                    "  {:<12} {:<16} FAILED: {}\n",
                    outcome.pair(),
                    outcome.band(),
                    outcome.error().unwrap_or_default()
                ));
            }
        }
    }

    output.push_str(&format!(
        "\n  {} completed, {} failed; * marks p < {}\n",
        report.completed_count(),
        report.failed_count(),
        alpha
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use phase_forecast_core::{ResultRow, RowOutcome};

    #[test]
    fn text_marks_significant_and_failed_rows() {
        let report = ExperimentReport {
            outcomes: vec![
                RowOutcome::Completed(ResultRow {
                    pair: "NIST-PTB".to_string(),
                    band: "target_8_12d".to_string(),
                    real_skill: 0.31,
                    null_mean: 0.02,
                    null_95: 0.11,
                    p_value: 0.0005,
                    surrogates: 2000,
                }),
                RowOutcome::Failed {
                    pair: "PTB-VSL".to_string(),
                    band: "ctrl_low".to_string(),
                    error: "degenerate mask".to_string(),
                },
            ],
        };

        let text = render_text(&report, 0.05);
        let significant = text.lines().find(|l| l.contains("NIST-PTB")).unwrap();
        assert!(significant.ends_with(" *"));
        assert!(text.contains("FAILED: degenerate mask"));
        assert!(text.contains("1 completed, 1 failed"));
    }
}

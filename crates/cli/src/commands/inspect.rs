//! Inspect CLI command.
//!
//! Reports the aligned grid of every configured pair and the bin count of
//! every band on that grid, without drawing any surrogates.

use anyhow::Result;
use clap::Args;

use phase_forecast_analysis::{ExperimentRunner, PairInspection};

use super::common::{load_series, ConfigArgs, OutputFormat};

/// Arguments for the inspect command.
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let config = args.config.load()?;
    let series = load_series(&config)?;

    let runner = ExperimentRunner::new(config)?;
    let inspections = runner.inspect(&series);

    match format {
        OutputFormat::Text => println!("{}", render_text(&inspections)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&inspections)?),
    }
    Ok(())
}

pub fn render_text(inspections: &[PairInspection]) -> String {
    let mut output = String::new();
    for pair in inspections {
        output.push_str(&format!("Pair {}\n", pair.pair));
        if let (Some(start), Some(end)) = (pair.start_day, pair.end_day) {
            output.push_str(&format!(
                "  grid MJD {}..={} ({} samples, {} evaluations)\n",
                start, end, pair.samples, pair.evaluations
            ));
        }
        for band in &pair.bands {
            match band.selected_bins {
                Some(bins) => output.push_str(&format!(
                    "  {:<16} [{:.4}, {:.4}] {:>5} bins\n",
                    band.band, band.flo, band.fhi, bins
                )),
                None => output.push_str(&format!(
                    "  {:<16} [{:.4}, {:.4}] {}\n",
                    band.band,
                    band.flo,
                    band.fhi,
                    band.error.as_deref().unwrap_or("no bins")
                )),
            }
        }
        if let Some(error) = &pair.error {
            output.push_str(&format!("  ! {error}\n"));
        }
    }
    output
}

use clap::{Parser, Subcommand};

mod commands;

use commands::{InspectArgs, RunExperimentArgs};

#[derive(Parser)]
#[command(name = "phase-forecast")]
#[command(
    about = "Walk-forward phase forecasting significance tests for clock comparisons",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured pair and band against its surrogate null
    Run(RunExperimentArgs),
    /// Report aligned grids and band bin counts without drawing surrogates
    Inspect(InspectArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => commands::run_experiment(args)?,
        Commands::Inspect(args) => commands::run_inspect(args)?,
    }

    Ok(())
}

//! Batch step: expand every goal in a calendar file into sub-goal slots.

use std::path::PathBuf;
use std::process::ExitCode;

use campusflow::{
    HourWindow, SchedulerConfig, expand, load_calendars_from_json, load_scheduler_config,
    save_calendars_to_json,
};
use chrono::Local;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "expand-goals",
    version,
    about = "Expand goals into scheduled sub-goal slots"
)]
struct Cli {
    /// Calendar file to read.
    #[arg(long, default_value = "events_data.json")]
    input: PathBuf,

    /// File to write the expanded calendars to.
    #[arg(long, default_value = "events_dataPRO.json")]
    output: PathBuf,

    /// JSON scheduler configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monday-Friday hour window, e.g. 16-22.
    #[arg(long)]
    weekday: Option<HourWindow>,

    /// Saturday hour window, e.g. 10-16.
    #[arg(long)]
    saturday: Option<HourWindow>,
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_scheduler_config(path)?,
        None => SchedulerConfig::default(),
    };
    if let Some(window) = cli.weekday {
        config.weekday_window = window;
    }
    if let Some(window) = cli.saturday {
        config.saturday_window = window;
    }
    config.validate()?;

    let calendars = load_calendars_from_json(&cli.input)
        .map_err(|err| format!("failed to read '{}': {err}", cli.input.display()))?;
    tracing::info!(
        input = %cli.input.display(),
        calendars = calendars.len(),
        weekday = %config.weekday_window,
        saturday = %config.saturday_window,
        "expanding goals"
    );

    let report = expand(&calendars, &config, Local::now().naive_local());

    save_calendars_to_json(&report.collection, &cli.output)
        .map_err(|err| format!("failed to write '{}': {err}", cli.output.display()))?;

    println!(
        "Processing complete. Output saved to '{}'.",
        cli.output.display()
    );
    println!("{}", report.to_cli_summary());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

//! proctor-replay
//!
//! Usage:
//!   proctor-replay scenario.json                      # Sink events as JSON lines
//!   proctor-replay scenario.json --config proctor.toml
//!   proctor-replay scenario.json --summary --json-logs

use anyhow::{Context, Result};
use clap::Parser;
use replay::{init_logging, run_scenario, Scenario};
use session::ProctorConfig;
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(
    name = "proctor-replay",
    version,
    about = "Replay a recorded proctoring scenario through the violation engine",
    long_about = "Runs a scenario (frames, scripted detector outputs, timed environment\n\
                  events) through a proctoring session in virtual time and prints every\n\
                  event the violation sink receives, one JSON object per line.\n\n\
                  Configuration comes from --config and PROCTOR__SECTION__FIELD\n\
                  environment variables."
)]
struct Args {
    /// Scenario file (JSON)
    scenario: PathBuf,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print the score summary after the events
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level, args.json_logs)?;

    info!("=== Proctor replay v{} ===", env!("CARGO_PKG_VERSION"));
    let config = ProctorConfig::load(args.config.as_deref())?;
    let scenario = Scenario::from_file(&args.scenario)?;

    // Paused clock: timers fire in order without waiting in real time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .context("Failed to build runtime")?;
    let report = runtime.block_on(run_scenario(config, &scenario))?;

    for event in &report.events {
        println!("{}", serde_json::to_string(event)?);
    }
    if args.summary {
        println!("{}", serde_json::to_string(&report.summary)?);
    }

    info!(
        "Replay finished: {} sink events, {} host directives, final mode {}",
        report.events.len(),
        report.directives.len(),
        report.final_mode
    );
    Ok(())
}

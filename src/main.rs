use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use seepackets::cli::Cli;
use seepackets::{
    ConsoleReporter, PnetSource, RunConfig, RunController, ShutdownSignal, StopReason,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<StopReason> {
    let config = RunConfig::load(cli).context("Invalid configuration")?;

    let source = PnetSource::open(&config.interface)
        .with_context(|| format!("Failed to open capture on {}", config.interface))?;

    let shutdown = ShutdownSignal::new();
    let handler_signal = shutdown.clone();
    ctrlc::set_handler(move || handler_signal.trigger())
        .context("Failed to install Ctrl+C handler")?;

    let reporter = Arc::new(ConsoleReporter::new(config.trace).with_payloads(config.show_payloads));

    let report = RunController::new(source, config.run_options())
        .with_shutdown_signal(shutdown)
        .run(reporter)
        .context("Capture run failed")?;

    Ok(report.stop_reason)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(reason) => {
            if let StopReason::CaptureFailed(cause) = &reason {
                eprintln!("error: capture failed: {}", cause);
            }
            ExitCode::from(reason.exit_code())
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

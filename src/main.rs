use std::process::ExitCode;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use colored::*;
use eyre::{Result, WrapErr};
use tokio_util::sync::CancellationToken;

use robot::engine::ensure_not_cancelled;
use robot::{Engine, EngineError, Robot};

mod cli;

use cli::Cli;

/// Step size for the simulated work; cancellation is checked between steps.
const SLICE: Duration = Duration::from_millis(100);

/// Demo engine: sleeps in slices and honours cancellation between them.
struct SleepEngine {
    work: Duration,
    fail: Option<String>,
}

#[async_trait]
impl Engine for SleepEngine {
    async fn run(&self, cancel: CancellationToken) -> std::result::Result<(), EngineError> {
        let mut remaining = self.work;
        while !remaining.is_zero() {
            ensure_not_cancelled(&cancel)?;
            let step = remaining.min(SLICE);
            tokio::select! {
                _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                _ = tokio::time::sleep(step) => {}
            }
            remaining -= step;
            tracing::debug!(remaining_ms = remaining.as_millis() as u64, "working");
        }

        match &self.fail {
            Some(message) => Err(EngineError::fail(message.clone())),
            None => Ok(()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut robot = Robot::new(&cli.job).mode(cli.host_mode());
    if let Some(operation) = &cli.operation {
        robot = robot.operation(operation);
    }
    if let Some(path) = &cli.config {
        robot = robot.config_file(path);
    }

    let work = Duration::from_millis(cli.work_ms);
    let fail = cli.fail.clone();
    let outcome = robot
        .execute(move |_config, _settings| Ok(SleepEngine { work, fail }))
        .await
        .wrap_err_with(|| format!("{} {}", "Robot could not start:".red(), cli.job))?;

    match outcome.error() {
        Some(report) => eprintln!("{} {}: {:#}", "Robot failed:".red(), cli.job, report),
        None => eprintln!("{} {} ({})", "Robot finished:".green(), cli.job, outcome.label()),
    }
    Ok(ExitCode::from(outcome.exit_code()))
}

//! CLI definitions using clap.
//!
//! The demo robot runs a single simulated job:
//! - `--job` / `--operation`: run identity
//! - `--work-ms`: how long the simulated work takes
//! - `--fail`: make the job fail with a message
//! - `--hosted`: run under the background-task host

use clap::Parser;
use std::path::PathBuf;

use robot::HostMode;

/// Robot - run one background job to completion and exit
#[derive(Parser, Debug)]
#[command(name = "robot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Job name attached to every log line and telemetry record
    #[arg(short, long, default_value = "demo-robot")]
    pub job: String,

    /// Operation name (defaults to the job name)
    #[arg(short, long)]
    pub operation: Option<String>,

    /// Optional config file layered over appsettings*.json
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run under the background-task host instead of returning directly
    #[arg(long)]
    pub hosted: bool,

    /// Simulated work duration in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    pub work_ms: u64,

    /// Fail the job with this message after the work is done
    #[arg(short, long)]
    pub fail: Option<String>,
}

impl Cli {
    pub fn host_mode(&self) -> HostMode {
        if self.hosted { HostMode::Hosted } else { HostMode::Direct }
    }
}

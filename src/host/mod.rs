//! Host shell - wires configuration, logging, telemetry, signals and the
//! runner around one engine.
//!
//! Startup order:
//! 1. Load layered configuration and bind [`Settings`]
//! 2. Check startup preconditions (fatal, before any engine exists)
//! 3. Install the console log pipeline
//! 4. Select the telemetry client
//! 5. Build the engine
//! 6. Arm the signal bridge
//! 7. Hand over to the [`LifecycleRunner`]

mod lifetime;

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ConfigSources, Configuration, HostEnvironment, Settings, check_startup};
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::engine::Engine;
use crate::error::{Result, RobotError};
use crate::identity::RunIdentity;
use crate::logging;
use crate::outcome::Outcome;
use crate::runner::LifecycleRunner;
use crate::signals::SignalBridge;
use crate::telemetry::{self, Telemetry};

pub use lifetime::HostLifetime;

const TARGET: &str = "robot::host";

/// How the runner is composed into the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostMode {
    /// Run once and return straight to the caller
    #[default]
    Direct,
    /// Run as a background task under a [`HostLifetime`]; the runner stops the
    /// host once the engine reaches a terminal state
    Hosted,
}

/// Builder for one robot process.
///
/// ```no_run
/// use robot::{EngineError, EngineFn, Robot};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> robot::Result<()> {
/// Robot::new("billing-sync")
///     .operation("nightly-run")
///     .run(|_config, _settings| {
///         Ok(EngineFn::new(|_cancel: CancellationToken| async {
///             Ok::<(), EngineError>(())
///         }))
///     })
///     .await
/// # }
/// ```
pub struct Robot {
    identity: RunIdentity,
    sources: ConfigSources,
    environment: HostEnvironment,
    mode: HostMode,
    telemetry: Option<Arc<dyn Telemetry>>,
    diagnostics: Arc<dyn Diagnostics>,
    cancel: CancellationToken,
    init_logging: bool,
    install_signals: bool,
}

impl Robot {
    pub fn new(job_name: impl Into<String>) -> Self {
        let identity = RunIdentity::new(job_name);
        Self {
            sources: ConfigSources::for_job(identity.job_name()),
            identity,
            environment: HostEnvironment::from_env(),
            mode: HostMode::default(),
            telemetry: None,
            diagnostics: Arc::new(TracingDiagnostics),
            cancel: CancellationToken::new(),
            init_logging: true,
            install_signals: true,
        }
    }

    pub fn operation(mut self, operation_name: impl Into<String>) -> Self {
        self.identity = RunIdentity::with_operation(self.identity.job_name(), operation_name);
        self
    }

    /// Adds an explicit configuration file as the last layer.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.explicit = Some(path.into());
        self
    }

    pub fn config_sources(mut self, sources: ConfigSources) -> Self {
        self.sources = sources;
        self
    }

    pub fn environment(mut self, environment: HostEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn mode(mut self, mode: HostMode) -> Self {
        self.mode = mode;
        self
    }

    /// Uses `telemetry` instead of the client selected from configuration.
    pub fn telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Shares an existing token instead of creating a fresh one.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn skip_logging_init(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Does not register OS signal listeners.
    pub fn without_signal_handlers(mut self) -> Self {
        self.install_signals = false;
        self
    }

    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Builds the engine with `build` and runs it once.
    ///
    /// Startup errors are returned before `build` is called. An engine failure
    /// comes back as [`RobotError::Engine`] after it has been logged and
    /// telemetry has been flushed; cancellation is `Ok(())`.
    pub async fn run<E, F>(self, build: F) -> Result<()>
    where
        E: Engine + 'static,
        F: FnOnce(&Configuration, &Settings) -> eyre::Result<E>,
    {
        self.execute(build).await?.into_result()
    }

    /// Like [`run`](Self::run), but hands back the [`Outcome`] of the run.
    ///
    /// Only startup errors are returned as `Err`.
    pub async fn execute<E, F>(self, build: F) -> Result<Outcome>
    where
        E: Engine + 'static,
        F: FnOnce(&Configuration, &Settings) -> eyre::Result<E>,
    {
        let config = Configuration::load(&self.sources)?;
        let settings = config.settings()?;
        check_startup(&settings, &self.environment)?;

        if self.init_logging {
            logging::init(&settings.logging)?;
        }
        info!(
            target: TARGET,
            job = self.identity.job_name(),
            operation = self.identity.operation_name(),
            container = self.environment.running_in_container,
            mode = ?self.mode,
            "starting robot"
        );

        let telemetry = match self.telemetry {
            Some(telemetry) => telemetry,
            None => telemetry::from_settings(&settings.telemetry),
        };

        let engine = build(&config, &settings).map_err(RobotError::Build)?;

        // Listener stays armed until the run returns
        let bridge = if self.install_signals {
            Some(SignalBridge::install(self.cancel.clone())?)
        } else {
            None
        };

        let runner = LifecycleRunner::new(self.identity, self.cancel, self.diagnostics, telemetry)
            .flush_wait(settings.telemetry.flush_wait());

        let outcome = match self.mode {
            HostMode::Direct => runner.execute(&engine).await,
            HostMode::Hosted => run_hosted(runner, engine).await?,
        };

        if bridge.as_ref().is_some_and(|b| !b.is_active()) {
            warn!(target: TARGET, "signal listener stopped before the run finished");
        }
        Ok(outcome)
    }
}

/// Runs the engine as a background task and waits for the host to be stopped.
async fn run_hosted<E: Engine + 'static>(runner: LifecycleRunner, engine: E) -> Result<Outcome> {
    let lifetime = HostLifetime::new();
    let runner = runner.stop_host_on_exit(lifetime.clone());
    let guard = lifetime.stop_on_drop();
    let task = tokio::spawn(async move {
        let _guard = guard;
        runner.execute(&engine).await
    });

    lifetime.stopping().await;
    debug!(target: TARGET, "host stop requested, waiting for run to finish");

    task.await
        .map_err(|e| RobotError::Engine(eyre::eyre!("hosted run aborted: {}", e)))
}

//! Lifecycle runner implementation.
//!
//! ```text
//! NotStarted → Running → Completed | Cancelled | Failed
//! ```
//!
//! Side effects happen in a fixed order once the engine returns:
//! 1. Classify the result into an [`Outcome`]
//! 2. Emit exactly one lifecycle diagnostic
//! 3. Flush telemetry (always attempted and bounded by the flush wait, failures
//!    never change the outcome)
//! 4. Ask an attached host to stop
//! 5. Return the outcome to the caller

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DEFAULT_FLUSH_WAIT;
use crate::diagnostics::{DiagnosticEvent, Diagnostics};
use crate::engine::Engine;
use crate::error::Result;
use crate::host::HostLifetime;
use crate::identity::RunIdentity;
use crate::outcome::Outcome;
use crate::telemetry::{Telemetry, TelemetryError};

const TARGET: &str = "robot::runner";

/// State of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Cancelled | RunState::Failed)
    }
}

impl From<&Outcome> for RunState {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Completed => RunState::Completed,
            Outcome::Cancelled => RunState::Cancelled,
            Outcome::Failed(_) => RunState::Failed,
        }
    }
}

/// Runs a single engine once.
///
/// The runner is consumed by [`execute`](Self::execute), so each instance
/// produces exactly one [`Outcome`].
pub struct LifecycleRunner {
    identity: RunIdentity,
    cancel: CancellationToken,
    diagnostics: Arc<dyn Diagnostics>,
    telemetry: Arc<dyn Telemetry>,
    flush_wait: Duration,
    lifetime: Option<HostLifetime>,
}

impl LifecycleRunner {
    pub fn new(
        identity: RunIdentity,
        cancel: CancellationToken,
        diagnostics: Arc<dyn Diagnostics>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            identity,
            cancel,
            diagnostics,
            telemetry,
            flush_wait: DEFAULT_FLUSH_WAIT,
            lifetime: None,
        }
    }

    /// Bounds the final telemetry flush.
    pub fn flush_wait(mut self, wait: Duration) -> Self {
        self.flush_wait = wait;
        self
    }

    /// Stops `lifetime` after the run reaches a terminal state.
    pub fn stop_host_on_exit(mut self, lifetime: HostLifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Runs `engine` and returns its outcome after diagnostics and flush.
    pub async fn execute<E: Engine + ?Sized>(self, engine: &E) -> Outcome {
        self.transition(RunState::NotStarted, RunState::Running);

        let work = async {
            let result = AssertUnwindSafe(engine.run(self.cancel.clone()))
                .catch_unwind()
                .await;
            let outcome = match result {
                Ok(result) => Outcome::classify(result),
                Err(payload) => Outcome::Failed(eyre::eyre!(
                    "engine panicked: {}",
                    panic_message(payload.as_ref())
                )),
            };
            self.diagnostics
                .emit(&DiagnosticEvent::for_outcome(&outcome, &self.identity));
            outcome
        };
        let outcome = self
            .telemetry
            .track_operation(&self.identity, work.boxed())
            .await;
        self.transition(RunState::Running, RunState::from(&outcome));

        self.flush_telemetry().await;

        if let Some(lifetime) = &self.lifetime {
            debug!(target: TARGET, "requesting host stop");
            lifetime.stop_application();
        }

        outcome
    }

    /// Like [`execute`](Self::execute), but re-raises a failure as an error.
    pub async fn run<E: Engine + ?Sized>(self, engine: &E) -> Result<()> {
        self.execute(engine).await.into_result()
    }

    async fn flush_telemetry(&self) {
        let wait = self.flush_wait;
        let flush = AssertUnwindSafe(tokio::time::timeout(wait, self.telemetry.flush()))
            .catch_unwind()
            .await
            .map(|timed| timed.unwrap_or(Err(TelemetryError::Timeout(wait))));

        let error = match flush {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("flush panicked: {}", panic_message(payload.as_ref())),
        };
        warn!(
            target: "robot::telemetry",
            job = self.identity.job_name(),
            operation = self.identity.operation_name(),
            error = %error,
            "telemetry flush failed"
        );
    }

    fn transition(&self, from: RunState, to: RunState) {
        debug!(
            target: TARGET,
            job = self.identity.job_name(),
            operation = self.identity.operation_name(),
            from = ?from,
            to = ?to,
            "run state changed"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

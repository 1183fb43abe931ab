//! Signal bridge - turns OS shutdown signals into job cancellation.
//!
//! ## Unix
//! - **SIGINT** (Ctrl-C in terminal)
//! - **SIGTERM** (default kill signal, used by systemd/Kubernetes)
//!
//! ## Windows
//! Only [`tokio::signal::ctrl_c`] is awaited.
//!
//! Listeners are registered synchronously by [`SignalBridge::install`], so a
//! signal arriving right after installation is never missed. Repeated signals
//! collapse into the single cancellation of the shared token.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Result, RobotError};

const TARGET: &str = "robot::signals";

/// Handle to the background listener that cancels the job token.
///
/// The listener stays active for as long as the handle is alive.
#[derive(Debug)]
pub struct SignalBridge {
    listener: JoinHandle<()>,
}

impl SignalBridge {
    /// Registers SIGINT/SIGTERM listeners and arms `cancel`.
    ///
    /// Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn install(cancel: CancellationToken) -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt()).map_err(RobotError::Signal)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(RobotError::Signal)?;

        let listener = tokio::spawn(async move {
            loop {
                let name = tokio::select! {
                    received = sigint.recv() => match received {
                        Some(()) => "SIGINT",
                        None => break,
                    },
                    received = sigterm.recv() => match received {
                        Some(()) => "SIGTERM",
                        None => break,
                    },
                };
                request_cancel(&cancel, name);
            }
        });

        debug!(target: TARGET, "signal bridge armed");
        Ok(Self { listener })
    }

    /// Registers a Ctrl-C listener and arms `cancel`.
    #[cfg(not(unix))]
    pub fn install(cancel: CancellationToken) -> Result<Self> {
        let listener = tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    debug!(target: TARGET, error = %e, "ctrl-c listener stopped");
                    break;
                }
                request_cancel(&cancel, "CTRL_C");
            }
        });

        debug!(target: TARGET, "signal bridge armed");
        Ok(Self { listener })
    }

    pub fn is_active(&self) -> bool {
        !self.listener.is_finished()
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Cancels `cancel` on behalf of `signal`.
///
/// Returns `true` only for the call that actually flipped the token; later
/// calls are logged and otherwise ignored.
pub fn request_cancel(cancel: &CancellationToken, signal: &str) -> bool {
    if cancel.is_cancelled() {
        debug!(target: TARGET, signal, "shutdown signal received again, cancellation already requested");
        return false;
    }
    info!(target: TARGET, signal, "shutdown signal received, cancelling job");
    cancel.cancel();
    true
}

//! Diagnostics sink - where lifecycle events go.
//!
//! The runner emits exactly one [`DiagnosticEvent`] per run. Sinks decide what
//! happens to it: [`TracingDiagnostics`] forwards it to the `tracing` pipeline,
//! [`RecordingDiagnostics`] keeps it in memory.

use std::fmt;
use std::sync::Mutex;

use crate::identity::RunIdentity;
use crate::outcome::Outcome;

const TARGET: &str = "robot::lifecycle";

pub const COMPLETED_TEMPLATE: &str = "Job completed. Robot: {JobName}. Operation: {OperationName}";
pub const CANCELLED_TEMPLATE: &str =
    "Job was cancelled. Robot: {JobName}. Operation: {OperationName}";
pub const FAILED_TEMPLATE: &str = "Job run failed. Robot: {JobName}. Operation: {OperationName}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// One structured lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub severity: Severity,
    pub template: &'static str,
    pub identity: RunIdentity,
    pub error: Option<String>,
}

impl DiagnosticEvent {
    /// The lifecycle event for a terminal outcome.
    pub fn for_outcome(outcome: &Outcome, identity: &RunIdentity) -> Self {
        let (severity, template) = match outcome {
            Outcome::Completed => (Severity::Info, COMPLETED_TEMPLATE),
            Outcome::Cancelled => (Severity::Warning, CANCELLED_TEMPLATE),
            Outcome::Failed(_) => (Severity::Error, FAILED_TEMPLATE),
        };
        Self {
            severity,
            template,
            identity: identity.clone(),
            // {:#} keeps the whole eyre context chain on one line
            error: outcome.error().map(|report| format!("{:#}", report)),
        }
    }

    /// Template with the identity placeholders filled in.
    pub fn render(&self) -> String {
        self.template
            .replace("{JobName}", self.identity.job_name())
            .replace("{OperationName}", self.identity.operation_name())
    }
}

/// Receives lifecycle events.
pub trait Diagnostics: Send + Sync {
    fn emit(&self, event: &DiagnosticEvent);
}

/// Forwards events to `tracing` with `job`, `operation` and `error` fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, event: &DiagnosticEvent) {
        let message = event.render();
        let job = event.identity.job_name();
        let operation = event.identity.operation_name();
        let error = event.error.as_deref();

        match event.severity {
            Severity::Debug => tracing::debug!(target: TARGET, job, operation, error, "{}", message),
            Severity::Info => tracing::info!(target: TARGET, job, operation, error, "{}", message),
            Severity::Warning => tracing::warn!(target: TARGET, job, operation, error, "{}", message),
            Severity::Error => tracing::error!(target: TARGET, job, operation, error, "{}", message),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.events().iter().filter(|e| e.severity == severity).count()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn emit(&self, event: &DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_event() {
        let id = RunIdentity::new("billing-sync");
        let event = DiagnosticEvent::for_outcome(&Outcome::Completed, &id);

        assert_eq!(event.severity, Severity::Info);
        assert_eq!(event.error, None);
        assert_eq!(
            event.render(),
            "Job completed. Robot: billing-sync. Operation: billing-sync"
        );
    }

    #[test]
    fn test_cancelled_event_names_both_identities() {
        let id = RunIdentity::with_operation("billing-sync", "nightly-run");
        let event = DiagnosticEvent::for_outcome(&Outcome::Cancelled, &id);

        assert_eq!(event.severity, Severity::Warning);
        let rendered = event.render();
        assert!(rendered.contains("billing-sync"));
        assert!(rendered.contains("nightly-run"));
    }

    #[test]
    fn test_failed_event_carries_error_chain() {
        let id = RunIdentity::new("billing-sync");
        let report = eyre::eyre!("attempt to divide by zero").wrap_err("computing ratio");
        let event = DiagnosticEvent::for_outcome(&Outcome::Failed(report), &id);

        assert_eq!(event.severity, Severity::Error);
        let error = event.error.unwrap();
        assert!(error.contains("computing ratio"));
        assert!(error.contains("attempt to divide by zero"));
    }

    #[test]
    fn test_recording_diagnostics_counts_by_severity() {
        let sink = RecordingDiagnostics::new();
        let id = RunIdentity::new("job");

        sink.emit(&DiagnosticEvent::for_outcome(&Outcome::Completed, &id));
        sink.emit(&DiagnosticEvent::for_outcome(&Outcome::Cancelled, &id));

        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.count(Severity::Info), 1);
        assert_eq!(sink.count(Severity::Warning), 1);
        assert_eq!(sink.count(Severity::Error), 0);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
        assert!(Severity::Error > Severity::Info);
    }
}

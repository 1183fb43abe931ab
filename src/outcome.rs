//! Run outcome types.
//!
//! [`Outcome::classify`] is the single place where an engine result is sorted
//! into completed, cancelled or failed.

use crate::engine::EngineError;
use crate::error::RobotError;

/// Terminal classification of one run.
#[derive(Debug)]
pub enum Outcome {
    /// The engine returned normally
    Completed,
    /// The engine observed the cancellation token and stopped
    Cancelled,
    /// The engine raised any other error
    Failed(eyre::Report),
}

impl Outcome {
    pub fn classify(result: Result<(), EngineError>) -> Self {
        match result {
            Ok(()) => Outcome::Completed,
            Err(EngineError::Cancelled) => Outcome::Cancelled,
            Err(EngineError::Failed(report)) => Outcome::Failed(report),
        }
    }

    /// Stable label for logs and telemetry result codes.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Cancelled => "cancelled",
            Outcome::Failed(_) => "failed",
        }
    }

    /// Cancellation is a graceful exit; only failures are unsuccessful.
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }

    /// Process exit status: `0` unless the run failed.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn error(&self) -> Option<&eyre::Report> {
        match self {
            Outcome::Failed(report) => Some(report),
            _ => None,
        }
    }

    /// Re-raise a failure; completion and cancellation are both `Ok`.
    pub fn into_result(self) -> Result<(), RobotError> {
        match self {
            Outcome::Completed | Outcome::Cancelled => Ok(()),
            Outcome::Failed(report) => Err(RobotError::Engine(report)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ok() {
        let outcome = Outcome::classify(Ok(()));
        assert!(matches!(outcome, Outcome::Completed));
        assert_eq!(outcome.label(), "completed");
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn test_classify_cancelled() {
        let outcome = Outcome::classify(Err(EngineError::Cancelled));
        assert!(matches!(outcome, Outcome::Cancelled));
        assert!(outcome.is_success());
        assert_eq!(outcome.exit_code(), 0);
        assert!(outcome.into_result().is_ok());
    }

    #[test]
    fn test_classify_failure_mentioning_cancellation_is_still_failure() {
        let outcome = Outcome::classify(Err(EngineError::fail("operation was cancelled")));
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn test_failure_reraises_engine_error() {
        let outcome = Outcome::classify(Err(EngineError::fail("attempt to divide by zero")));
        assert_eq!(
            outcome.error().map(|e| e.to_string()).as_deref(),
            Some("attempt to divide by zero")
        );

        match outcome.into_result() {
            Err(RobotError::Engine(report)) => {
                assert_eq!(report.to_string(), "attempt to divide by zero")
            }
            other => panic!("expected engine error, got {:?}", other),
        }
    }
}

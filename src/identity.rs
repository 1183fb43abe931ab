//! Run identity - the (job, operation) pair attached to every diagnostic.

use std::fmt;

use serde::Serialize;

/// Identifies one run of a robot.
///
/// Set once at startup and never mutated. The operation name defaults to the
/// job name when none is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RunIdentity {
    job_name: String,
    operation_name: String,
}

impl RunIdentity {
    /// Identity whose operation name equals the job name.
    pub fn new(job_name: impl Into<String>) -> Self {
        let job_name = job_name.into();
        Self {
            operation_name: job_name.clone(),
            job_name,
        }
    }

    /// Identity with an explicit operation name.
    pub fn with_operation(job_name: impl Into<String>, operation_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            operation_name: operation_name.into(),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.job_name == self.operation_name {
            write!(f, "{}", self.job_name)
        } else {
            write!(f, "{}/{}", self.job_name, self.operation_name)
        }
    }
}

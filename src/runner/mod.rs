//! Lifecycle runner - runs one engine and turns the result into an outcome.
//!
//! This module provides the core run orchestration, including:
//! - LifecycleRunner for executing a single engine
//! - RunState for the run's state machine
//! - Diagnostics and telemetry ordering around the terminal state

mod lifecycle;

pub use lifecycle::{LifecycleRunner, RunState};

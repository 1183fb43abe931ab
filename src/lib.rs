//! Robot - a bootstrap harness for single-shot background jobs
//!
//! A robot process builds its configuration, logging and telemetry, constructs
//! one [`Engine`], runs it to completion under a cancellation token wired to
//! OS signals, records the outcome, flushes telemetry and exits.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod host;
pub mod identity;
pub mod logging;
pub mod outcome;
pub mod runner;
pub mod signals;
pub mod telemetry;

pub use engine::{Engine, EngineError, EngineFn};
pub use error::{Result, RobotError};
pub use host::{HostLifetime, HostMode, Robot};
pub use identity::RunIdentity;
pub use outcome::Outcome;
pub use runner::LifecycleRunner;

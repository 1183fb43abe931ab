//! Error types for the robot harness
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::telemetry::TelemetryError;

/// All error types that can surface from the harness
#[derive(Debug, Error)]
pub enum RobotError {
    /// Fatal startup precondition; raised before any engine is built
    #[error("Startup configuration error: {0}")]
    StartupConfiguration(String),

    /// A required configuration key had no value
    #[error("Missing required configuration value for key: {key}")]
    MissingConfiguration { key: String },

    /// Configuration could not be loaded or bound
    #[error("Configuration error: {0}")]
    Config(String),

    /// The engine could not be constructed
    #[error("Failed to build engine: {0}")]
    Build(eyre::Report),

    /// The engine failed; carries the engine's own error
    #[error("Job run failed: {0}")]
    Engine(eyre::Report),

    /// Telemetry export or flush error
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// Log pipeline could not be installed
    #[error("Logging error: {0}")]
    Logging(String),

    /// OS signal handlers could not be registered
    #[error("Signal registration failed: {0}")]
    Signal(#[source] std::io::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RobotError {
    /// Whether this error was raised before the engine ever ran
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            RobotError::StartupConfiguration(_)
                | RobotError::MissingConfiguration { .. }
                | RobotError::Config(_)
                | RobotError::Build(_)
                | RobotError::Logging(_)
                | RobotError::Signal(_)
        )
    }
}

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, RobotError>;

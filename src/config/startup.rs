//! Startup preconditions checked before any engine is built.

use super::settings::Settings;
use crate::error::{Result, RobotError};

/// Environment indicator set by container images.
pub const CONTAINER_ENV: &str = "RUNNING_IN_CONTAINER";

/// Facts about the process environment the host cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostEnvironment {
    pub running_in_container: bool,
}

impl HostEnvironment {
    pub fn from_env() -> Self {
        let running_in_container = std::env::var(CONTAINER_ENV)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self { running_in_container }
    }

    pub fn container() -> Self {
        Self {
            running_in_container: true,
        }
    }
}

/// Refuses to start inside a container without telemetry connection details.
pub fn check_startup(settings: &Settings, env: &HostEnvironment) -> Result<()> {
    if env.running_in_container && !settings.telemetry.has_connection() {
        return Err(RobotError::StartupConfiguration(
            "Telemetry:ConnectionString is missing. It must be configured when running in a container."
                .to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelemetrySettings;

    #[test]
    fn test_outside_container_needs_nothing() {
        assert!(check_startup(&Settings::default(), &HostEnvironment::default()).is_ok());
    }

    #[test]
    fn test_container_without_connection_is_fatal() {
        let err = check_startup(&Settings::default(), &HostEnvironment::container()).unwrap_err();
        assert!(matches!(err, RobotError::StartupConfiguration(_)));
        assert!(err.is_startup());
    }

    #[test]
    fn test_container_with_connection_starts() {
        let settings = Settings {
            telemetry: TelemetrySettings {
                connection_string: Some("InstrumentationKey=abc".to_string()),
                ..TelemetrySettings::default()
            },
            ..Settings::default()
        };
        assert!(check_startup(&settings, &HostEnvironment::container()).is_ok());
    }
}

//! Typed settings for the harness's own configuration sections.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Flush bound used when `Telemetry:FlushWaitMs` is not configured.
pub const DEFAULT_FLUSH_WAIT: Duration = Duration::from_secs(5);

/// Harness settings bound from the `Logging` and `Telemetry` sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    pub logging: LoggingSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LoggingSettings {
    /// Level per category; `Default` applies to everything else
    pub log_level: BTreeMap<String, String>,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    #[serde(alias = "Compact")]
    Compact,
    #[serde(alias = "Json")]
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TelemetrySettings {
    pub connection_string: Option<String>,
    pub exporter: ExporterSettings,
    /// Upper bound on the final flush; [`DEFAULT_FLUSH_WAIT`] when unset
    pub flush_wait_ms: Option<u64>,
}

impl TelemetrySettings {
    pub fn has_connection(&self) -> bool {
        self.connection_string
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    pub fn flush_wait(&self) -> Duration {
        self.flush_wait_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_FLUSH_WAIT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ExporterSettings {
    pub protocol: ExportProtocol,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportProtocol {
    /// Request records are written to the log
    #[default]
    #[serde(alias = "Log")]
    Log,
    /// Request records are POSTed as JSON
    #[serde(alias = "Http")]
    Http,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.logging.log_level.is_empty());
        assert_eq!(settings.logging.format, LogFormat::Compact);
        assert_eq!(settings.telemetry.exporter.protocol, ExportProtocol::Log);
        assert!(!settings.telemetry.has_connection());
        assert_eq!(settings.telemetry.flush_wait(), DEFAULT_FLUSH_WAIT);
    }

    #[test]
    fn test_bind_from_configuration() {
        let config = Configuration::from_value(json!({
            "Logging": {
                "LogLevel": { "Default": "Debug", "hyper": "Error" },
                "Format": "json"
            },
            "Telemetry": {
                "ConnectionString": "InstrumentationKey=abc",
                "Exporter": { "Protocol": "Http", "Endpoint": "http://collector:4318/v1/requests" },
                "FlushWaitMs": 2500
            }
        }));

        let settings = config.settings().unwrap();
        assert_eq!(settings.logging.log_level.get("Default").map(String::as_str), Some("Debug"));
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert!(settings.telemetry.has_connection());
        assert_eq!(settings.telemetry.exporter.protocol, ExportProtocol::Http);
        assert_eq!(
            settings.telemetry.exporter.endpoint.as_deref(),
            Some("http://collector:4318/v1/requests")
        );
        assert_eq!(settings.telemetry.flush_wait(), Duration::from_millis(2500));
    }

    #[test]
    fn test_blank_connection_string_is_not_a_connection() {
        let settings = TelemetrySettings {
            connection_string: Some("   ".to_string()),
            ..TelemetrySettings::default()
        };
        assert!(!settings.has_connection());
    }

    #[test]
    fn test_unknown_protocol_is_config_error() {
        let config = Configuration::from_value(json!({
            "Telemetry": { "Exporter": { "Protocol": "grpc" } }
        }));
        assert!(config.settings().is_err());
    }
}

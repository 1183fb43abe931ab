//! Console log pipeline.
//!
//! Filters come from the `Logging:LogLevel` section only; `RUST_LOG` is not
//! consulted. Chatty transport categories are turned down to `warn` unless the
//! configuration names them explicitly.

use std::io::{self, IsTerminal};
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingSettings};
use crate::error::{Result, RobotError};

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Categories that default to `warn` unless configured.
pub const QUIET_CATEGORIES: [&str; 2] = ["hyper", "reqwest"];

const DEFAULT_KEY: &str = "Default";

/// Maps a configured level name onto a tracing filter level.
///
/// Accepts both tracing names (`warn`) and the longer forms (`Warning`,
/// `Information`, `Critical`, `None`).
pub fn parse_level(level: &str) -> Result<&'static str> {
    let parsed = match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" | "information" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        "off" | "none" => "off",
        other => return Err(RobotError::Logging(format!("unknown log level: {}", other))),
    };
    Ok(parsed)
}

/// Builds the `EnvFilter` directive string for `settings`.
///
/// The `Default` key and the quiet categories match case-insensitively and are
/// written with their canonical lowercase names.
pub fn filter_directives(settings: &LoggingSettings) -> Result<String> {
    let mut default = "info";
    let mut quiet = QUIET_CATEGORIES.map(|category| (category, "warn"));
    let mut extra = Vec::new();

    for (category, level) in &settings.log_level {
        let level = parse_level(level)?;
        if category.eq_ignore_ascii_case(DEFAULT_KEY) {
            default = level;
        } else if let Some(slot) = quiet.iter_mut().find(|(name, _)| category.eq_ignore_ascii_case(name)) {
            slot.1 = level;
        } else {
            extra.push(format!("{}={}", category, level));
        }
    }

    let mut directives = vec![default.to_string()];
    directives.extend(quiet.iter().map(|(category, level)| format!("{}={}", category, level)));
    directives.extend(extra);
    Ok(directives.join(","))
}

/// Installs the global subscriber once; later calls are no-ops.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_new(filter_directives(settings)?)
        .map_err(|e| RobotError::Logging(format!("invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal());

    let installed = match settings.format {
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    if installed.is_err() {
        // Embedding application already owns the global subscriber
        tracing::debug!("global subscriber already installed, keeping it");
    }

    let _ = INSTALLED.set(());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn settings(levels: &[(&str, &str)]) -> LoggingSettings {
        LoggingSettings {
            log_level: levels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            ..LoggingSettings::default()
        }
    }

    #[test]
    fn test_parse_level_aliases() {
        assert_eq!(parse_level("Information").unwrap(), "info");
        assert_eq!(parse_level("Warning").unwrap(), "warn");
        assert_eq!(parse_level("Critical").unwrap(), "error");
        assert_eq!(parse_level("None").unwrap(), "off");
        assert_eq!(parse_level(" debug ").unwrap(), "debug");
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_default_directives_quiet_transport_categories() {
        let directives = filter_directives(&LoggingSettings::default()).unwrap();
        assert_eq!(directives, "info,hyper=warn,reqwest=warn");
    }

    #[test]
    fn test_configured_category_overrides_quiet_default() {
        let directives =
            filter_directives(&settings(&[("Default", "Debug"), ("reqwest", "Trace")])).unwrap();
        assert_eq!(directives, "debug,hyper=warn,reqwest=trace");
    }

    #[test]
    fn test_extra_categories_are_appended() {
        let directives = filter_directives(&settings(&[("billing", "Error")])).unwrap();
        assert_eq!(directives, "info,hyper=warn,reqwest=warn,billing=error");
    }

    #[test]
    fn test_keys_are_normalised_to_canonical_names() {
        let directives =
            filter_directives(&settings(&[("default", "Warning"), ("Reqwest", "Trace")])).unwrap();
        assert_eq!(directives, "warn,hyper=warn,reqwest=trace");
    }

    #[test]
    fn test_invalid_level_is_error() {
        assert!(filter_directives(&settings(&[("Default", "chatty")])).is_err());
    }

    #[test]
    fn test_init_is_idempotent() {
        assert!(init(&LoggingSettings::default()).is_ok());
        assert!(init(&LoggingSettings::default()).is_ok());
    }
}

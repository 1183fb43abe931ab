//! Configuration system for robots.
//!
//! Layered sources, later layers override earlier ones:
//! 1. appsettings.json, appsettings.Development.json, appsettings.Production.json
//!    in the working directory
//! 2. ~/.config/robot/<job>.yml (user config)
//! 3. Explicit file (builder or `--config`)
//!
//! Keys are colon-separated paths into the merged tree, e.g.
//! `Telemetry:ConnectionString`.

pub use self::layered::{ConfigSources, Configuration};
pub use self::settings::{
    DEFAULT_FLUSH_WAIT, ExportProtocol, ExporterSettings, LogFormat, LoggingSettings, Settings,
    TelemetrySettings,
};
pub use self::startup::{CONTAINER_ENV, HostEnvironment, check_startup};

mod layered;
mod settings;
mod startup;

/// Base settings files, in the order they are layered.
pub const BASE_FILES: [&str; 3] = [
    "appsettings.json",
    "appsettings.Development.json",
    "appsettings.Production.json",
];

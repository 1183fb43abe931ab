//! Layered key/value configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::BASE_FILES;
use super::settings::Settings;
use crate::error::{Result, RobotError};

/// Where configuration layers are read from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Directory holding the `appsettings*.json` files
    pub base_dir: PathBuf,
    /// Optional per-user file; skipped when absent
    pub user_file: Option<PathBuf>,
    /// Explicit file; must exist when given
    pub explicit: Option<PathBuf>,
}

impl ConfigSources {
    /// Standard sources for `job_name` rooted at the working directory.
    pub fn for_job(job_name: &str) -> Self {
        Self {
            base_dir: PathBuf::from("."),
            user_file: dirs::config_dir().map(|dir| dir.join("robot").join(format!("{}.yml", job_name))),
            explicit: None,
        }
    }

    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }
}

/// Merged configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    root: Value,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl Configuration {
    pub fn from_value(root: Value) -> Self {
        let mut config = Self::default();
        config.merge(root);
        config
    }

    /// Reads every available layer from `sources`.
    pub fn load(sources: &ConfigSources) -> Result<Self> {
        let mut config = Self::default();

        for name in BASE_FILES {
            let path = sources.base_dir.join(name);
            if path.exists() {
                config.merge(read_file(&path)?);
                tracing::debug!(path = %path.display(), "loaded configuration layer");
            }
        }

        if let Some(path) = sources.user_file.as_ref().filter(|p| p.exists()) {
            config.merge(read_file(path)?);
            tracing::debug!(path = %path.display(), "loaded user configuration");
        }

        if let Some(path) = &sources.explicit {
            if !path.exists() {
                return Err(RobotError::Config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            config.merge(read_file(path)?);
            tracing::debug!(path = %path.display(), "loaded explicit configuration");
        }

        Ok(config)
    }

    /// Deep-merges `layer` over the current tree.
    pub fn merge(&mut self, layer: Value) {
        merge_values(&mut self.root, layer);
    }

    /// Looks up a colon-separated key. Section names match case-insensitively.
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split(':').try_fold(&self.root, |node, segment| match node {
            Value::Object(map) => map
                .get(segment)
                .or_else(|| map.iter().find(|(k, _)| k.eq_ignore_ascii_case(segment)).map(|(_, v)| v)),
            _ => None,
        })
    }

    /// Scalar value rendered as a string; `None` for missing, null or structured values.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn get_required_value(&self, key: &str) -> Result<String> {
        self.get_str(key).ok_or_else(|| RobotError::MissingConfiguration { key: key.to_string() })
    }

    /// Binds the value at `key` to `T`; missing values are an error.
    pub fn get_required<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| RobotError::MissingConfiguration { key: key.to_string() })?;
        serde_json::from_value(value.clone())
            .map_err(|e| RobotError::Config(format!("cannot bind {}: {}", key, e)))
    }

    /// Binds a section to `T`, falling back to `T::default()` when it is absent.
    pub fn section<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.get(key) {
            Some(value) if !value.is_null() => serde_json::from_value(value.clone())
                .map_err(|e| RobotError::Config(format!("cannot bind section {}: {}", key, e))),
            _ => Ok(T::default()),
        }
    }

    /// Typed view of the harness's own sections.
    pub fn settings(&self) -> Result<Settings> {
        Ok(Settings {
            logging: self.section("Logging")?,
            telemetry: self.section("Telemetry")?,
        })
    }
}

fn read_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext == "yml" || ext == "yaml");

    let value: Value = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(value)
}

fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                let existing = base_map
                    .keys()
                    .find(|k| k.eq_ignore_ascii_case(&key))
                    .cloned()
                    .unwrap_or(key);
                merge_values(base_map.entry(existing).or_insert(Value::Null), value);
            }
        }
        (base, layer) => *base = layer,
    }
}

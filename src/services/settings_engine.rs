//! `settings.json` handling.
//!
//! The file is a serialized [`AppSettings`]. Single values are changed through
//! [`SettingsEngineTrait::set_value`] with one of the dotted names in
//! [`SETTINGS_KEYS`], e.g. `pastecrop config set storage.quota_bytes 1048576`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

/// Settings that can be changed one at a time.
pub const SETTINGS_KEYS: &[&str] = &[
    "storage.database_path",
    "storage.quota_bytes",
    "history.consistency",
    "crop.default_aspect",
    "logging.level",
];

pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &Path;
}

pub struct SettingsEngine {
    path: PathBuf,
    settings: AppSettings,
}

impl SettingsEngine {
    /// Uses `path_override`, or `settings.json` in the platform config
    /// directory. Nothing is read until [`SettingsEngineTrait::load`].
    pub fn new(path_override: Option<String>) -> Self {
        let path = path_override
            .map(PathBuf::from)
            .unwrap_or_else(|| platform::get_config_dir().join("settings.json"));
        Self {
            path,
            settings: AppSettings::default(),
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// A missing file means defaults. A file that does not parse is an error
    /// and leaves the current settings in place.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        self.settings = match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                SettingsError::SerializationError(format!("{}: {}", self.path.display(), e))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => AppSettings::default(),
            Err(e) => {
                return Err(SettingsError::IoError(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        Ok(self.settings.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                SettingsError::IoError(format!("creating {}: {}", dir.display(), e))
            })?;
        }
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| {
            SettingsError::IoError(format!("writing {}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Changes one setting and saves the file. Rejected values leave both the
    /// in-memory settings and the file untouched.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut next = self.settings.clone();
        match key {
            "storage.database_path" => next.storage.database_path = value_as(key, value)?,
            "storage.quota_bytes" => next.storage.quota_bytes = value_as(key, value)?,
            "history.consistency" => next.history.consistency = value_as(key, value)?,
            "crop.default_aspect" => {
                let aspect: f64 = value_as(key, value)?;
                if !(aspect.is_finite() && aspect > 0.0) {
                    return Err(SettingsError::InvalidValue(format!(
                        "{key}: aspect ratio must be positive, got {aspect}"
                    )));
                }
                next.crop.default_aspect = aspect;
            }
            "logging.level" => {
                let level: String = value_as(key, value)?;
                if level.trim().is_empty() {
                    return Err(SettingsError::InvalidValue(format!(
                        "{key}: filter cannot be empty"
                    )));
                }
                next.logging.level = level;
            }
            _ => {
                return Err(SettingsError::InvalidKey(format!(
                    "'{}' (known settings: {})",
                    key,
                    SETTINGS_KEYS.join(", ")
                )))
            }
        }
        self.settings = next;
        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &Path {
        &self.path
    }
}

fn value_as<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, SettingsError> {
    serde_json::from_value(value).map_err(|e| SettingsError::InvalidValue(format!("{key}: {e}")))
}

use serde::{Deserialize, Serialize};

use super::history::HistoryConsistency;

/// Roughly what browsers allot to one origin's local storage.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Top-level application settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    pub storage: StorageSettings,
    pub history: HistorySettings,
    pub crop: CropSettings,
    pub logging: LoggingSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            history: HistorySettings::default(),
            crop: CropSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Where history is persisted and how much room it gets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// SQLite file path. `None` means `<data dir>/pastecrop.db`.
    pub database_path: Option<String>,
    /// Byte budget for all stored keys and values. `None` disables the limit.
    pub quota_bytes: Option<usize>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }
}

/// History behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HistorySettings {
    #[serde(default)]
    pub consistency: HistoryConsistency,
}

/// Crop defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropSettings {
    /// Aspect ratio of the initial centered crop.
    pub default_aspect: f64,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            default_aspect: 16.0 / 9.0,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

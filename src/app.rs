//! App Core for PasteCrop.
//!
//! Composes settings, the SQLite-backed key-value store and the history
//! store, and runs the acquire → crop → record workflow.

use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{DynamicImage, GenericImageView};
use tracing::info;

use crate::managers::history_store::{HistoryStore, HistoryStoreTrait};
use crate::platform;
use crate::services::crop_transform;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::storage::SqliteStore;
use crate::types::crop::{CropRect, Dimensions};

/// Central application struct owning settings and history.
pub struct App {
    pub settings_engine: SettingsEngine,
    pub history: HistoryStore<SqliteStore>,
    database_path: PathBuf,
}

impl App {
    /// Loads settings from `settings_path` (or the platform default) and opens
    /// the history database they point at.
    ///
    /// Malformed settings are reported and replaced by defaults rather than
    /// preventing startup.
    pub fn new(settings_path: Option<String>) -> anyhow::Result<Self> {
        let mut settings_engine = SettingsEngine::new(settings_path);
        if let Err(e) = settings_engine.load() {
            tracing::warn!(error = %e, "Failed to load settings, using defaults");
        }
        Self::with_settings(settings_engine)
    }

    /// Opens the history database described by already loaded settings and
    /// hydrates the history store from it.
    pub fn with_settings(settings_engine: SettingsEngine) -> anyhow::Result<Self> {
        let settings = settings_engine.get_settings().clone();
        let database_path = settings
            .storage
            .database_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(platform::default_database_path);

        let storage = SqliteStore::open(&database_path, settings.storage.quota_bytes)
            .with_context(|| format!("opening history database {}", database_path.display()))?;

        let mut history = HistoryStore::with_consistency(storage, settings.history.consistency);
        history.initialize();
        info!(database = %database_path.display(), "PasteCrop ready");

        Ok(Self {
            settings_engine,
            history,
            database_path,
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// The crop offered before the user draws one, in natural pixels.
    pub fn default_crop(&self, source: &DynamicImage) -> CropRect {
        let aspect = self.settings_engine.get_settings().crop.default_aspect;
        crop_transform::centered_aspect_crop(source.dimensions().into(), aspect)
    }

    /// Crops `source` and records the result in history.
    ///
    /// `rect` is in `displayed` coordinates; when `displayed` is `None` the
    /// rectangle is taken to be in natural pixels. Returns the crop's data URL.
    /// A failed crop never touches history.
    pub fn crop_and_record(
        &mut self,
        source: &DynamicImage,
        rect: CropRect,
        displayed: Option<Dimensions>,
    ) -> anyhow::Result<String> {
        let natural: Dimensions = source.dimensions().into();
        let displayed = displayed.unwrap_or(natural);
        let url = crop_transform::produce_crop(source, rect, displayed, natural)?;
        self.history.add(&url)?;
        Ok(url)
    }

    /// Loads `path` and runs [`App::crop_and_record`] on it. Without a `rect`
    /// the default centered crop is used.
    pub fn crop_file(
        &mut self,
        path: &Path,
        rect: Option<CropRect>,
        displayed: Option<Dimensions>,
    ) -> anyhow::Result<String> {
        let source = crop_transform::load_image_from_path(path)?;
        match rect {
            Some(rect) => self.crop_and_record(&source, rect, displayed),
            // The default crop is already in natural pixels.
            None => {
                let rect = self.default_crop(&source);
                self.crop_and_record(&source, rect, None)
            }
        }
    }
}

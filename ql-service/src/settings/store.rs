//! Persistent settings store
//!
//! One JSON document on disk, replaced atomically on every successful save.
//! The store keeps no in-memory copy: every read goes back to disk, so the
//! value a caller sees is always whatever the last completed save produced,
//! across process restarts and across processes.

use crate::error::{ServiceError, ServiceResult};
use crate::settings::model::Settings;
use crate::settings::validate;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

/// Settings store bound to one document path
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store for the given document path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The document path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current settings from disk
    ///
    /// Never fails: a missing, unreadable, or malformed document yields the
    /// built-in defaults. Keys missing from a valid document fill from the
    /// defaults, so old documents survive new fields.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Settings {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Settings file not found, using defaults");
                return Settings::default();
            }
            Err(e) => {
                warn!(error = %e, "Failed to read settings file, using defaults");
                return Settings::default();
            }
        };

        match parse_with_defaults(&bytes) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Malformed settings document, using defaults");
                Settings::default()
            }
        }
    }

    /// Validate and atomically save a complete settings document
    ///
    /// The document is serialized to a temporary file in the destination
    /// directory, forced to durable storage, then renamed over the target.
    /// On any failure the temporary file is removed and the existing
    /// document is left byte-for-byte unchanged.
    #[instrument(skip(self, settings), fields(path = %self.path.display()))]
    pub fn save(&self, settings: &Settings) -> ServiceResult<()> {
        validate::validate(settings)?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_error)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_error)?;
        serde_json::to_writer_pretty(&mut tmp, settings).map_err(|e| ServiceError::Configuration {
            message: format!("failed to serialize settings: {e}"),
            field: None,
        })?;
        tmp.flush().map_err(io_error)?;
        tmp.as_file().sync_all().map_err(io_error)?;

        // Dropping the PersistError removes the temporary file.
        tmp.persist(&self.path)
            .map_err(|e| io_error(e.error))?;

        info!("Settings saved");
        Ok(())
    }

    /// Merge a partial update over the freshest on-disk state and save
    ///
    /// Keys in `partial` replace the corresponding document keys; everything
    /// else keeps its current value. A key whose value does not type-check
    /// against the document schema rejects the whole update.
    ///
    /// Two concurrent updates each read-merge-write independently and the
    /// later write wins; there is deliberately no cross-call isolation.
    #[instrument(skip(self, partial), fields(path = %self.path.display(), keys = partial.len()))]
    pub fn update(&self, partial: &Map<String, Value>) -> ServiceResult<Settings> {
        let current = self.load();

        let mut merged_value = serde_json::to_value(&current).map_err(|e| {
            ServiceError::Configuration {
                message: format!("failed to serialize settings: {e}"),
                field: None,
            }
        })?;
        if let Value::Object(base) = &mut merged_value {
            for (key, value) in partial {
                base.insert(key.clone(), value.clone());
            }
        }

        let merged: Settings =
            serde_json::from_value(merged_value).map_err(|e| ServiceError::Configuration {
                message: format!("invalid settings update: {e}"),
                field: None,
            })?;

        self.save(&merged)?;
        Ok(merged)
    }
}

fn io_error(e: std::io::Error) -> ServiceError {
    ServiceError::Configuration {
        message: format!("settings I/O failed: {e}"),
        field: None,
    }
}

/// Parse a stored document, overlaying its keys onto the defaults
fn parse_with_defaults(bytes: &[u8]) -> Result<Settings, serde_json::Error> {
    use serde::de::Error;

    let loaded: Value = serde_json::from_slice(bytes)?;
    let Value::Object(loaded) = loaded else {
        return Err(serde_json::Error::custom("settings document is not an object"));
    };

    let mut merged = serde_json::to_value(Settings::default())?;
    if let Value::Object(base) = &mut merged {
        for (key, value) in loaded {
            base.insert(key, value);
        }
    }
    serde_json::from_value(merged)
}

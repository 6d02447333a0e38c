//! # Versioned persisted settings store.
//!
//! [`SettingsStore`] owns the on-disk settings document: a JSON file holding
//! a schema `version`, the startup-application reference and the array of
//! [`AppConfig`] records.
//!
//! ## Rules
//! - Writes are atomic: serialize to a sibling temp file, then rename.
//! - Identical content is not rewritten; `save` reports whether it wrote.
//! - A missing file loads as empty defaults.
//! - An unrecognized `version` is a **fatal** configuration error
//!   ([`SettingsError::UnsupportedVersion`]): guessing a migration could
//!   corrupt user data. Known older versions apply forward transformations
//!   in sequence in [`migrate`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::apps::AppConfig;
use crate::error::SettingsError;

/// Current settings schema version.
pub const SETTINGS_VERSION: u32 = 1;

/// The persisted settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Schema version; gates migrations.
    pub version: u32,
    /// Name of the application launched when none is foreground.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_application: Option<String>,
    /// One record per registered application.
    #[serde(default)]
    pub applications: Vec<AppConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            startup_application: None,
            applications: Vec::new(),
        }
    }
}

/// Owns the settings file and deduplicates identical writes.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    last: Mutex<Option<Vec<u8>>>,
    writes: AtomicU64,
}

impl SettingsStore {
    /// Creates a store over the given file path. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: Mutex::new(None),
            writes: AtomicU64::new(0),
        }
    }

    /// Path of the settings document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of writes performed so far (identical-content saves excluded).
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Loads and migrates the settings document.
    ///
    /// A missing file yields [`Settings::default`]. An unsupported schema
    /// version is fatal and must halt supervisor initialization.
    pub async fn load(&self) -> Result<Settings, SettingsError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };
        let doc: Settings = serde_json::from_slice(&raw)?;
        let doc = migrate(doc)?;
        // Prime the dedup cache so an unchanged save after load is a no-op.
        if let Ok(body) = serde_json::to_vec_pretty(&doc) {
            *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(body);
        }
        Ok(doc)
    }

    /// Persists the document atomically. Returns `true` when a write
    /// actually happened, `false` when the content was unchanged.
    pub async fn save(&self, doc: &Settings) -> Result<bool, SettingsError> {
        let body = serde_json::to_vec_pretty(doc)?;
        {
            // The cache holds plain bytes, so a poisoned lock is still usable.
            let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            if last.as_deref() == Some(body.as_slice()) {
                return Ok(false);
            }
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, &body).await?;
        fs::rename(&tmp, &self.path).await?;

        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(body);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }
}

/// Applies forward migrations to a loaded document.
///
/// Versions other than the known set have no defined transformation; a gap
/// is an explicit error rather than an inferred migration.
fn migrate(doc: Settings) -> Result<Settings, SettingsError> {
    match doc.version {
        SETTINGS_VERSION => Ok(doc),
        found => Err(SettingsError::UnsupportedVersion {
            found,
            supported: SETTINGS_VERSION,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::AppType;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("applications.json"))
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let doc = store_in(&dir).load().await.unwrap();
        assert_eq!(doc, Settings::default());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let doc = Settings {
            version: SETTINGS_VERSION,
            startup_application: Some("reader".into()),
            applications: vec![AppConfig::new("reader", "/bin/sh", AppType::Foreground)],
        };
        assert!(store.save(&doc).await.unwrap());
        let loaded = store_in(&dir).load().await.unwrap();
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn identical_saves_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let doc = Settings::default();
        assert!(store.save(&doc).await.unwrap());
        assert!(!store.save(&doc).await.unwrap());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn unknown_version_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("applications.json");
        tokio::fs::write(&path, br#"{"version": 7, "applications": []}"#)
            .await
            .unwrap();
        let err = SettingsStore::new(&path).load().await.unwrap_err();
        assert_eq!(err.as_label(), "settings_unsupported_version");
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn unchanged_save_after_load_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let doc = Settings::default();
        store.save(&doc).await.unwrap();

        let reopened = store_in(&dir);
        let loaded = reopened.load().await.unwrap();
        assert!(!reopened.save(&loaded).await.unwrap());
        assert_eq!(reopened.write_count(), 0);
    }
}

//! Error types used by the appvisor registry and settings store.
//!
//! This module defines two main error enums:
//!
//! - [`RegistryError`]: errors raised by registry operations (validation,
//!   resolution, process spawning). Protection failures (`system` apps) are
//!   reported as a boolean outcome, not an error.
//! - [`SettingsError`]: errors raised while loading or persisting the
//!   settings store; [`SettingsError::UnsupportedVersion`] is the one fatal
//!   startup condition.
//!
//! Both types provide `as_label` helpers for logging/metrics.

use std::io;

use thiserror::Error;

/// # Errors produced by registry operations.
///
/// Validation failures are rejected synchronously with no state change;
/// spawn failures leave the application `Inactive`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Registration input was malformed (missing name/binary, nonexistent binary).
    #[error("invalid application config: {reason}")]
    InvalidConfig {
        /// What was wrong with the input.
        reason: String,
    },

    /// The referenced application is not registered.
    #[error("no application registered at {path:?}")]
    UnknownApplication {
        /// The object path that failed to resolve.
        path: String,
    },

    /// Spawning the application binary failed.
    #[error("failed to spawn {bin:?} for {name:?}: {source}")]
    Spawn {
        /// Application name.
        name: String,
        /// Binary path that failed to start.
        bin: String,
        /// Underlying OS error.
        source: io::Error,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use appvisor::RegistryError;
    ///
    /// let err = RegistryError::InvalidConfig { reason: "empty name".into() };
    /// assert_eq!(err.as_label(), "registry_invalid_config");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::InvalidConfig { .. } => "registry_invalid_config",
            RegistryError::UnknownApplication { .. } => "registry_unknown_application",
            RegistryError::Spawn { .. } => "registry_spawn_failed",
        }
    }
}

/// # Errors produced by the settings store.
///
/// [`SettingsError::UnsupportedVersion`] halts supervisor initialization:
/// silently guessing a migration could corrupt user data. Everything else is
/// an ordinary I/O or parse failure.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("settings io error: {0}")]
    Io(#[from] io::Error),

    /// The settings file is not a valid settings document.
    #[error("malformed settings document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The persisted schema version has no known migration path.
    #[error("unsupported settings version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Highest version this build understands.
        supported: u32,
    },
}

impl SettingsError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SettingsError::Io(_) => "settings_io",
            SettingsError::Malformed(_) => "settings_malformed",
            SettingsError::UnsupportedVersion { .. } => "settings_unsupported_version",
        }
    }

    /// True if this error must abort supervisor startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SettingsError::UnsupportedVersion { .. })
    }
}

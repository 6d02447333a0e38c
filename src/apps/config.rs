//! # Application configuration record.
//!
//! [`AppConfig`] is the persisted, serde-serialized record describing one
//! registered application: identity, binary, type, flags, lifecycle hooks
//! and spawn environment. Field names on disk are camelCase
//! (`displayName`, `onPause`, `workingDirectory`, ...).
//!
//! ## Rules
//! - `name` is the unique registry key and immutable after registration.
//! - `display_name`/`description` default to `name` when unset.
//! - The `"system"` flag marks a descriptor-sourced application protected
//!   from user unregistration and reconciliation removal.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Flag marking a descriptor-sourced, unregistration-protected application.
pub const SYSTEM_FLAG: &str = "system";

/// Governs whether an application may keep running outside the foreground.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    /// Stopped whenever it loses the foreground.
    #[default]
    Foreground,
    /// Runs without ever taking the foreground.
    Background,
    /// May keep its process alive off-foreground.
    Backgroundable,
}

impl AppType {
    /// Parses a descriptor `type` string case-insensitively.
    ///
    /// Unrecognized or absent values default to [`AppType::Foreground`] with
    /// a diagnostic, never a failure.
    pub(crate) fn parse_lenient(value: Option<&str>, app: &str) -> AppType {
        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ => return AppType::Foreground,
        };
        match value.to_ascii_lowercase().as_str() {
            "foreground" => AppType::Foreground,
            "background" => AppType::Background,
            "backgroundable" => AppType::Backgroundable,
            other => {
                tracing::warn!(app, r#type = other, "invalid type string, using foreground");
                AppType::Foreground
            }
        }
    }
}

/// Persisted configuration of one application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Unique registry key. Immutable after registration.
    pub name: String,

    /// Display string; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Longer display string; defaults to `display_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Filesystem path to the executable. Must exist at registration time.
    pub bin: String,

    /// Foreground/background classification.
    #[serde(rename = "type", default)]
    pub app_type: AppType,

    /// Free-form flags; `"system"` is the protection flag.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    /// Icon identifier or path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Command run when the application is paused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_pause: Option<String>,

    /// Command run when the application is resumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_resume: Option<String>,

    /// Command run when the application is stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_stop: Option<String>,

    /// Environment variables applied to the spawned process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Working directory of the spawned process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// Run the process as this user (privilege de-escalation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Run the process with this group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl AppConfig {
    /// Minimal record for the given identity; everything else defaulted.
    pub fn new(name: impl Into<String>, bin: impl Into<String>, app_type: AppType) -> Self {
        Self {
            name: name.into(),
            bin: bin.into(),
            app_type,
            ..Self::default()
        }
    }

    /// Display string, falling back to `name`.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Description, falling back to the display string.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| self.display_name())
    }

    /// True if the `"system"` protection flag is set.
    pub fn is_system(&self) -> bool {
        self.flags.iter().any(|f| f == SYSTEM_FLAG)
    }

    /// Validates registration input: non-empty name and binary, and the
    /// binary must exist on disk. Rejected input constructs nothing.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.name.is_empty() {
            return Err(RegistryError::InvalidConfig {
                reason: "empty application name".into(),
            });
        }
        if self.bin.is_empty() {
            return Err(RegistryError::InvalidConfig {
                reason: format!("application {:?} has no binary", self.name),
            });
        }
        if !Path::new(&self.bin).exists() {
            return Err(RegistryError::InvalidConfig {
                reason: format!("binary {:?} does not exist", self.bin),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_parses_case_insensitively_with_foreground_default() {
        assert_eq!(AppType::parse_lenient(Some("Background"), "a"), AppType::Background);
        assert_eq!(AppType::parse_lenient(Some("BACKGROUNDABLE"), "a"), AppType::Backgroundable);
        assert_eq!(AppType::parse_lenient(Some("foreground"), "a"), AppType::Foreground);
        assert_eq!(AppType::parse_lenient(Some("bogus"), "a"), AppType::Foreground);
        assert_eq!(AppType::parse_lenient(None, "a"), AppType::Foreground);
        assert_eq!(AppType::parse_lenient(Some(""), "a"), AppType::Foreground);
    }

    #[test]
    fn validation_rejects_missing_fields() {
        let err = AppConfig::new("", "/bin/sh", AppType::Foreground)
            .validate()
            .unwrap_err();
        assert_eq!(err.as_label(), "registry_invalid_config");

        let err = AppConfig::new("app", "", AppType::Foreground)
            .validate()
            .unwrap_err();
        assert_eq!(err.as_label(), "registry_invalid_config");

        let err = AppConfig::new("app", "/no/such/binary", AppType::Foreground)
            .validate()
            .unwrap_err();
        assert_eq!(err.as_label(), "registry_invalid_config");

        assert!(AppConfig::new("app", "/bin/sh", AppType::Foreground).validate().is_ok());
    }

    #[test]
    fn display_strings_fall_back_to_name() {
        let mut cfg = AppConfig::new("reader", "/bin/sh", AppType::Foreground);
        assert_eq!(cfg.display_name(), "reader");
        assert_eq!(cfg.description(), "reader");
        cfg.display_name = Some("Reader".into());
        assert_eq!(cfg.description(), "Reader");
    }

    #[test]
    fn record_round_trips_with_camel_case_keys() {
        let mut cfg = AppConfig::new("clock", "/bin/sh", AppType::Backgroundable);
        cfg.on_pause = Some("touch /tmp/paused".into());
        cfg.working_directory = Some("/tmp".into());

        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["type"], "backgroundable");
        assert!(json.get("onPause").is_some());
        assert!(json.get("workingDirectory").is_some());

        let back: AppConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, cfg);
    }
}

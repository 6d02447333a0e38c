//! # Declarative system-application descriptors.
//!
//! One static system application per `*.oxide` JSON file in the descriptor
//! directory. The application name is the file stem
//! (`codes.eeems.erode.oxide` → `codes.eeems.erode`); the `"system"` flag is
//! injected into whatever flags the descriptor declares; `type` parses
//! case-insensitively and defaults to foreground; the `events` mapping
//! supplies the stop/pause/resume hooks.
//!
//! ## Rules
//! - A bad descriptor (unreadable, invalid JSON, missing or nonexistent
//!   binary) skips that candidate with a diagnostic; scanning always
//!   completes.
//! - Output is sorted by name so a rescan of unchanged files is
//!   deterministic.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tokio::fs;

use crate::apps::{AppConfig, AppType, SYSTEM_FLAG};

/// File extension of descriptor files.
pub(crate) const DESCRIPTOR_EXTENSION: &str = "oxide";

/// On-disk descriptor schema. `name` comes from the filename, never the body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Descriptor {
    #[serde(rename = "type")]
    app_type: Option<String>,
    bin: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    #[serde(default)]
    flags: Vec<String>,
    user: Option<String>,
    group: Option<String>,
    working_directory: Option<String>,
    #[serde(default)]
    environment: BTreeMap<String, String>,
    #[serde(default)]
    events: BTreeMap<String, String>,
}

/// Scans the descriptor directory into normalized, system-flagged candidates.
pub(crate) async fn scan(dir: &Path) -> Vec<AppConfig> {
    let mut out = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %dir.display(), %err, "descriptor directory not readable");
            return out;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(DESCRIPTOR_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
            continue;
        };
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(app = %name, %err, "unreadable descriptor, skipping");
                continue;
            }
        };
        let desc: Descriptor = match serde_json::from_slice(&raw) {
            Ok(desc) => desc,
            Err(err) => {
                tracing::warn!(app = %name, %err, "malformed descriptor, skipping");
                continue;
            }
        };
        if let Some(config) = normalize(name, desc) {
            out.push(config);
        }
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Converts one parsed descriptor into a registration candidate.
fn normalize(name: String, desc: Descriptor) -> Option<AppConfig> {
    let bin = match desc.bin {
        Some(bin) if !bin.is_empty() => bin,
        _ => {
            tracing::warn!(app = %name, "descriptor declares no binary, skipping");
            return None;
        }
    };
    if !Path::new(&bin).exists() {
        tracing::warn!(app = %name, bin = %bin, "can't find application binary, skipping");
        return None;
    }

    let app_type = AppType::parse_lenient(desc.app_type.as_deref(), &name);

    let mut flags = vec![SYSTEM_FLAG.to_string()];
    flags.extend(
        desc.flags
            .into_iter()
            .filter(|f| !f.is_empty() && f != SYSTEM_FLAG),
    );

    let hook = |key: &str| desc.events.get(key).filter(|c| !c.is_empty()).cloned();

    Some(AppConfig {
        name,
        display_name: desc.display_name,
        description: desc.description,
        bin,
        app_type,
        flags,
        icon: desc.icon,
        on_stop: hook("stop"),
        on_pause: hook("pause"),
        on_resume: hook("resume"),
        environment: desc.environment,
        working_directory: desc.working_directory,
        user: desc.user,
        group: desc.group,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_descriptor(dir: &Path, file: &str, body: &str) {
        fs::write(dir.join(file), body).await.unwrap();
    }

    #[tokio::test]
    async fn name_comes_from_file_stem_and_system_flag_is_injected() {
        let dir = tempfile::tempdir().unwrap();
        write_descriptor(
            dir.path(),
            "codes.eeems.erode.oxide",
            r#"{"bin": "/bin/sh", "type": "background", "flags": ["hidden", "system"]}"#,
        )
        .await;

        let found = scan(dir.path()).await;
        assert_eq!(found.len(), 1);
        let app = &found[0];
        assert_eq!(app.name, "codes.eeems.erode");
        assert_eq!(app.app_type, AppType::Background);
        // system first, declared extras kept, duplicate system dropped
        assert_eq!(app.flags, vec!["system".to_string(), "hidden".to_string()]);
    }

    #[tokio::test]
    async fn bad_type_defaults_to_foreground() {
        let dir = tempfile::tempdir().unwrap();
        write_descriptor(dir.path(), "app.oxide", r#"{"bin": "/bin/sh", "type": "Daemon"}"#).await;

        let found = scan(dir.path()).await;
        assert_eq!(found[0].app_type, AppType::Foreground);
    }

    #[tokio::test]
    async fn missing_binary_skips_candidate() {
        let dir = tempfile::tempdir().unwrap();
        write_descriptor(dir.path(), "ghost.oxide", r#"{"bin": "/no/such/bin"}"#).await;
        write_descriptor(dir.path(), "real.oxide", r#"{"bin": "/bin/sh"}"#).await;

        let found = scan(dir.path()).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "real");
    }

    #[tokio::test]
    async fn malformed_descriptor_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_descriptor(dir.path(), "broken.oxide", "{ not json").await;
        write_descriptor(dir.path(), "ok.oxide", r#"{"bin": "/bin/sh"}"#).await;
        write_descriptor(dir.path(), "ignored.txt", "not a descriptor").await;

        let found = scan(dir.path()).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ok");
    }

    #[tokio::test]
    async fn events_map_becomes_hooks() {
        let dir = tempfile::tempdir().unwrap();
        write_descriptor(
            dir.path(),
            "hooked.oxide",
            r#"{"bin": "/bin/sh", "events": {"stop": "echo stop", "pause": "echo pause", "resume": "echo resume"}}"#,
        )
        .await;

        let found = scan(dir.path()).await;
        let app = &found[0];
        assert_eq!(app.on_stop.as_deref(), Some("echo stop"));
        assert_eq!(app.on_pause.as_deref(), Some("echo pause"));
        assert_eq!(app.on_resume.as_deref(), Some("echo resume"));
    }
}

//! # Deterministic object paths.
//!
//! Every application is addressable over IPC at a stable object path
//! derived from its name: a UUIDv5 of the name under a fixed namespace,
//! appended to the service path. The same name always yields the same
//! path, so external references survive restarts, and distinct names can
//! never collide.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Root path of the supervisor's IPC object tree.
pub const SERVICE_PATH: &str = "/codes/eeems/oxide1";

/// Fixed namespace for application path derivation.
const APPS_NAMESPACE: Uuid = Uuid::from_u128(0xd736_a9e1_10a9_4258_9634_4b0f_a911_89d5);

/// Stable, name-derived IPC address of one application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Derives the path for an application name.
    pub fn for_app(name: &str) -> Self {
        let id = Uuid::new_v5(&APPS_NAMESPACE, name.as_bytes());
        ObjectPath(format!("{SERVICE_PATH}/apps/{}", id.simple()))
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ObjectPath> for String {
    fn from(path: ObjectPath) -> String {
        path.0
    }
}

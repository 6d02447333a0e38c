//! Supervisor core: the application registry and its persistence.
//!
//! This module contains the registry that owns all [`Application`]s and the
//! reconciliation machinery keeping it in sync with the settings store and
//! the descriptor directory.
//!
//! Internal modules:
//! - [`registry`]: foreground arbitration, registration, teardown;
//! - [`reconcile`]: the idempotent three-way merge;
//! - [`settings`]: versioned persisted settings store;
//! - [`descriptor`]: declarative system-application descriptors.
//!
//! [`Application`]: crate::Application

mod descriptor;
mod reconcile;
mod registry;
mod settings;

pub use registry::Registry;
pub use settings::{Settings, SettingsStore, SETTINGS_VERSION};

//! The managed application entity.
//!
//! This module contains everything one [`Application`] owns: its persisted
//! configuration record, its lifecycle state machine, its deterministic
//! object path, and its OS process handle.
//!
//! Internal modules:
//! - [`config`]: the [`AppConfig`] record and [`AppType`] classification;
//! - [`state`]: the explicit lifecycle transition table;
//! - [`path`]: deterministic object-path derivation;
//! - [`process`]: spawn/signal/join plumbing for the owned child process;
//! - [`application`]: the entity tying the above together.

mod application;
mod config;
mod path;
mod process;
mod state;

pub use application::Application;
pub use config::{AppConfig, AppType, SYSTEM_FLAG};
pub use path::{ObjectPath, SERVICE_PATH};
pub use state::AppState;

pub(crate) use state::AppEvent;

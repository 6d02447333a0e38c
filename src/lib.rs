//! # appvisor
//!
//! Application supervisor for a single-user embedded device: owns every
//! launchable application on the system, arbitrates the single foreground
//! slot, reconciles the registry against persisted settings and declarative
//! descriptors, and routes foreground/background notifications to the
//! processes it spawns.
//!
//! ## Architecture
//! ```text
//!          RPC dispatch / buttons / suspend-resume
//!                          │
//!                          ▼
//!                      Registry ── owns ──► Application (config, state, process)
//!                       │    ▲                   │
//!              persist  │    │ resolve           │ spawn / signal / hooks
//!                       ▼    │ foreground        ▼
//!              SettingsStore SignalRouter   tokio::process
//!                                ▲
//!                        OS: SIGUSR1 / SIGUSR2
//!
//!          every lifecycle transition ──► Bus ──► SubscriberSet ──► Subscribe impls
//! ```
//!
//! ## Quick start
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use appvisor::{Bus, Config, LogWriter, Registry, Subscribe, SubscriberSet};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let bus = Bus::new(cfg.bus_capacity_clamped());
//!
//!     let registry = Registry::new(cfg, bus.clone());
//!     registry.startup().await?;
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let set = Arc::new(SubscriberSet::new(subs));
//!     set.spawn_listener(&bus, &registry.cancellation_token());
//!
//!     let router = registry.signal_router();
//!     tokio::spawn(router.run(registry.cancellation_token()));
//!
//!     tokio::signal::ctrl_c().await?;
//!     registry.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//! - At most one application is in the foreground at any instant.
//! - Object paths are deterministic functions of application names.
//! - Reconciliation is idempotent: a second `reload` with unchanged inputs
//!   performs zero settings writes and publishes zero events.
//! - `system`-flagged applications cannot be unregistered over RPC; only
//!   descriptor removal retires them.

mod apps;
mod config;
mod error;
mod events;
mod registry;
mod router;
mod rpc;
mod subscribers;

pub use apps::{AppConfig, AppState, AppType, Application, ObjectPath, SERVICE_PATH, SYSTEM_FLAG};
pub use config::{Config, PROCESS_MANAGER};
pub use error::{RegistryError, SettingsError};
pub use events::{Bus, Event, EventKind};
pub use registry::{Registry, Settings, SettingsStore, SETTINGS_VERSION};
pub use router::SignalRouter;
pub use rpc::{dispatch, Request, Response};
pub use subscribers::{Subscribe, SubscriberSet};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

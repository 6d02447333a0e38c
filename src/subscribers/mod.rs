//! # Event subscribers for the supervisor runtime.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out for handling lifecycle events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Registry / Application / waiter ── publish(Event) ──► Bus
//!                                                          │
//!                                    SubscriberSet::spawn_listener
//!                                                          │
//!                                     ┌────────────────────┼───────────────┐
//!                                     ▼                    ▼               ▼
//!                                 [queue S1]           [queue S2]      [queue SN]
//!                                     ▼                    ▼               ▼
//!                               sub1.on_event        sub2.on_event   subN.on_event
//! ```
//!
//! ## Implementing custom subscribers
//! ```rust
//! use appvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct CrashCounter;
//!
//! #[async_trait]
//! impl Subscribe for CrashCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::ApplicationExited && event.exit_code != Some(0) {
//!             // increment crash counter
//!         }
//!     }
//!     fn name(&self) -> &'static str { "crash-counter" }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;

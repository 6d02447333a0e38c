//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the registry,
//! applications, process waiters and the signal router.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Registry`, `Application`, process exit waiters,
//!   `SignalRouter`.
//! - **Consumers**: the registry's exit listener, and
//!   `SubscriberSet::spawn_listener` (fans out to user subscribers).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};

//! # Broadcast channel carrying lifecycle [`Event`]s.
//!
//! One [`Bus`] connects every publisher (registry mutations, process exit
//! waiters, signal delivery) to every consumer (the registry's exit
//! listener, the subscriber fan-out). Publishing is fire-and-forget: there
//! is no acknowledgement, no replay, and an event published while nobody
//! listens is simply gone.
//!
//! Recent events live in one bounded ring shared by all receivers. A
//! receiver that falls more than the capacity behind observes
//! `RecvError::Lagged(n)` once and then continues from the oldest retained
//! event; publishers never wait on it.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
///
/// Cloning is cheap (the sender is `Arc`-backed internally) and every clone
/// publishes into the same ring.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus retaining up to `capacity` recent events (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes one event to all active receivers, without blocking.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Opens an independent receiver.
    ///
    /// It observes only events published after this call; earlier ring
    /// contents are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

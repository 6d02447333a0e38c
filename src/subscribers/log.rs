//! # Built-in logging subscriber.
//!
//! [`LogWriter`] emits every lifecycle event through `tracing`, one line per
//! transition. Enabled via the `logging` feature; useful as-is on a device
//! console, or as a reference for custom subscribers.

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Tracing-backed event logger.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates the logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let app = e.app.as_deref().unwrap_or("-");
        let path = e.path.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::ApplicationRegistered => {
                tracing::info!(app, path, seq = e.seq, "application registered");
            }
            EventKind::ApplicationUnregistered => {
                tracing::info!(app, path, seq = e.seq, "application unregistered");
            }
            EventKind::ApplicationLaunched => {
                tracing::info!(app, path, seq = e.seq, "application launched");
            }
            EventKind::ApplicationPaused => {
                tracing::info!(app, path, seq = e.seq, "application paused");
            }
            EventKind::ApplicationResumed => {
                tracing::info!(app, path, seq = e.seq, "application resumed");
            }
            EventKind::ApplicationSignaled => {
                tracing::info!(path, signal = e.signal, seq = e.seq, "application signaled");
            }
            EventKind::ApplicationExited => {
                tracing::info!(app, path, exit_code = e.exit_code, seq = e.seq, "application exited");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}

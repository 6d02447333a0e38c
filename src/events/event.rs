//! # Lifecycle events emitted by the registry and applications.
//!
//! The [`EventKind`] enum mirrors the supervisor's external event surface:
//! registration, launch/pause/resume, signal delivery and process exit.
//! The [`Event`] struct carries additional metadata such as the object path,
//! application name, exit code and forwarded signal number.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use appvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::ApplicationExited)
//!     .with_app("reader")
//!     .with_path("/codes/eeems/oxide1/apps/abc")
//!     .with_exit_code(0);
//!
//! assert_eq!(ev.kind, EventKind::ApplicationExited);
//! assert_eq!(ev.app.as_deref(), Some("reader"));
//! assert_eq!(ev.exit_code, Some(0));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A new application was registered.
    ///
    /// Sets:
    /// - `path`: object path of the new application
    /// - `app`: application name
    ApplicationRegistered,

    /// An application was unregistered and removed from the registry.
    ///
    /// Sets:
    /// - `path`: object path of the removed application
    /// - `app`: application name
    ApplicationUnregistered,

    /// An application entered the foreground (freshly spawned).
    ///
    /// Sets:
    /// - `path`: object path
    /// - `app`: application name
    ApplicationLaunched,

    /// An application was paused (moved to background or suspended).
    ///
    /// Sets:
    /// - `path`: object path
    /// - `app`: application name
    ApplicationPaused,

    /// A backgrounded or suspended application was resumed to the foreground.
    ///
    /// Sets:
    /// - `path`: object path
    /// - `app`: application name
    ApplicationResumed,

    /// A foreground-entry/background-entry signal was forwarded to the
    /// current foreground application.
    ///
    /// Sets:
    /// - `path`: object path
    /// - `signal`: forwarded signal number (SIGUSR1/SIGUSR2)
    ApplicationSignaled,

    /// An application's OS process exited.
    ///
    /// Sets:
    /// - `path`: object path
    /// - `app`: application name
    /// - `exit_code`: process exit code (128+signal when killed by signal)
    ApplicationExited,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Object path of the application, if applicable.
    pub path: Option<Arc<str>>,
    /// Name of the application, if applicable.
    pub app: Option<Arc<str>>,
    /// Process exit code (for [`EventKind::ApplicationExited`]).
    pub exit_code: Option<i32>,
    /// Forwarded signal number (for [`EventKind::ApplicationSignaled`]).
    pub signal: Option<i32>,
    /// Human-readable reason (diagnostics).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            path: None,
            app: None,
            exit_code: None,
            signal: None,
            reason: None,
        }
    }

    /// Attaches an object path.
    #[inline]
    pub fn with_path(mut self, path: impl Into<Arc<str>>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attaches an application name.
    #[inline]
    pub fn with_app(mut self, app: impl Into<Arc<str>>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Attaches a process exit code.
    #[inline]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Attaches a forwarded signal number.
    #[inline]
    pub fn with_signal(mut self, signal: i32) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::now(EventKind::ApplicationRegistered);
        let b = Event::now(EventKind::ApplicationRegistered);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_set_fields() {
        let ev = Event::now(EventKind::ApplicationSignaled)
            .with_path("/p")
            .with_signal(10);
        assert_eq!(ev.path.as_deref(), Some("/p"));
        assert_eq!(ev.signal, Some(10));
        assert_eq!(ev.exit_code, None);
    }
}

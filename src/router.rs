//! # Signal router: cooperative yielding between processes.
//!
//! The session daemon receives two process-directed OS notifications:
//! SIGUSR1 ("about to become foreground") and SIGUSR2 ("about to become
//! background"). [`SignalRouter`] resolves the current foreground
//! application at delivery time and forwards the notification through it,
//! never to anything else.
//!
//! ## Delivery path
//! ```text
//! OS ── SIGUSR1/SIGUSR2 ──► SignalRouter
//!                                │
//!                                ▼
//!                 Registry::signal_foreground(sig)
//!                                │  resolves the unique InForeground app
//!                                ▼
//!                 Application::sig_usr1 / sig_usr2
//!                                │
//!                                ├─► kill(pid, sig)
//!                                └─► Bus: ApplicationSignaled(path, sig)
//! ```
//!
//! Resolution happens under the registry lock at each delivery, so a
//! removed or exited application can never be a stale delivery target.

use std::io;
use std::sync::Arc;

use nix::sys::signal::Signal;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

use crate::registry::Registry;

/// Routes SIGUSR1/SIGUSR2 to the current foreground application.
pub struct SignalRouter {
    registry: Arc<Registry>,
}

impl SignalRouter {
    /// Created by [`Registry::signal_router`](crate::Registry::signal_router).
    pub(crate) fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Listens for the two user signals until cancelled.
    ///
    /// Returns `Err` only if signal listener registration fails.
    pub async fn run(self, token: CancellationToken) -> io::Result<()> {
        let mut usr1 = signal(SignalKind::user_defined1())?;
        let mut usr2 = signal(SignalKind::user_defined2())?;
        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                received = usr1.recv() => {
                    if received.is_none() { return Ok(()); }
                    self.registry.signal_foreground(Signal::SIGUSR1).await;
                }
                received = usr2.recv() => {
                    if received.is_none() { return Ok(()); }
                    self.registry.signal_foreground(Signal::SIGUSR2).await;
                }
            }
        }
    }
}

//! # Owned OS process handle.
//!
//! [`ProcessHandle`] wraps one spawned child: signal delivery, liveness, and
//! an async join primitive. Spawning applies the application's environment,
//! working directory and optional user/group de-escalation.
//!
//! ## Exit notification
//! A detached waiter task owns the [`tokio::process::Child`]; when the
//! process exits it records the exit code on a watch channel and publishes
//! [`EventKind::ApplicationExited`] on the bus. The registry reacts to that
//! event; the handle itself never mutates registry state.
//!
//! ## Rules
//! - A handle is exclusively owned by one [`Application`](super::Application);
//!   it is never shared or cloned.
//! - Signals are delivered by pid via `nix`; a dead process is a no-op error
//!   (`ESRCH`), not a panic.

use std::io;
use std::os::unix::process::ExitStatusExt;

use nix::sys::signal::{kill, Signal};
use nix::unistd::{Group, Pid, User};
use tokio::process::Command;
use tokio::sync::watch;

use crate::events::{Bus, Event, EventKind};

use super::config::AppConfig;
use super::path::ObjectPath;

/// Handle to one spawned application process.
#[derive(Debug)]
pub(crate) struct ProcessHandle {
    pid: Pid,
    exit: watch::Receiver<Option<i32>>,
}

impl ProcessHandle {
    /// Spawns the application's binary and wires exit notification.
    ///
    /// The waiter task publishes `ApplicationExited(path, code)` once the
    /// process terminates; a process killed by a signal reports `128 + n`.
    pub(crate) fn spawn(config: &AppConfig, path: &ObjectPath, bus: &Bus) -> io::Result<Self> {
        let mut cmd = Command::new(&config.bin);
        cmd.envs(&config.environment);
        if let Some(dir) = &config.working_directory {
            cmd.current_dir(dir);
        }
        if let Some(user) = &config.user {
            cmd.uid(resolve_uid(user)?);
        }
        if let Some(group) = &config.group {
            cmd.gid(resolve_gid(group)?);
        }
        cmd.kill_on_drop(false);

        let mut child = cmd.spawn()?;
        let pid = child
            .id()
            .ok_or_else(|| io::Error::other("spawned process exited before pid was read"))?;

        let (tx, rx) = watch::channel(None);
        let bus = bus.clone();
        let name = config.name.clone();
        let path = path.clone();
        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status
                    .code()
                    .or_else(|| status.signal().map(|s| 128 + s))
                    .unwrap_or(-1),
                Err(err) => {
                    tracing::warn!(app = %name, %err, "waiting on child failed");
                    -1
                }
            };
            let _ = tx.send(Some(code));
            bus.publish(
                Event::now(EventKind::ApplicationExited)
                    .with_path(path.as_str())
                    .with_app(name)
                    .with_exit_code(code),
            );
        });

        Ok(Self {
            pid: Pid::from_raw(pid as i32),
            exit: rx,
        })
    }

    /// Raw pid of the child.
    pub(crate) fn pid(&self) -> i32 {
        self.pid.as_raw()
    }

    /// True while the process has not been observed to exit.
    pub(crate) fn is_alive(&self) -> bool {
        self.exit.borrow().is_none()
    }

    /// Delivers a signal to the process.
    pub(crate) fn signal(&self, sig: Signal) -> nix::Result<()> {
        kill(self.pid, sig)
    }

    /// Suspends the caller until the process has exited; returns the exit
    /// code once known.
    pub(crate) async fn wait_for_finished(&mut self) -> Option<i32> {
        match self.exit.wait_for(|code| code.is_some()).await {
            Ok(code) => *code,
            // Waiter gone without reporting: nothing left to join.
            Err(_) => None,
        }
    }
}

fn resolve_uid(user: &str) -> io::Result<u32> {
    User::from_name(user)
        .map_err(|e| io::Error::other(format!("looking up user {user:?}: {e}")))?
        .map(|u| u.uid.as_raw())
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("unknown user {user:?}")))
}

fn resolve_gid(group: &str) -> io::Result<u32> {
    Group::from_name(group)
        .map_err(|e| io::Error::other(format!("looking up group {group:?}: {e}")))?
        .map(|g| g.gid.as_raw())
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("unknown group {group:?}")))
}

//! # Application: one managed process entity.
//!
//! An [`Application`] owns its configuration, its lifecycle state and its OS
//! process handle, and publishes lifecycle events on the bus. All mutation
//! goes through the registry, which holds the only mutable reference; the
//! entity itself never reaches back into the registry.
//!
//! ## Lifecycle
//! ```text
//! launch():
//!   ├─ process alive (InBackground) ──► on-resume hook ─► InForeground (ApplicationResumed)
//!   ├─ process alive (Paused) ────────► SIGCONT + on-resume hook ─► InForeground (ApplicationResumed)
//!   └─ no process ────────────────────► spawn(bin, env, cwd, uid/gid) ─► InForeground (ApplicationLaunched)
//!
//! pause(stopping):
//!   ├─ Backgroundable ──► on-pause hook ─► InBackground (ApplicationPaused)
//!   ├─ stopping ────────► SIGSTOP ─► Paused (ApplicationPaused)
//!   └─ otherwise ───────► stop() ─► Inactive
//!
//! stop():
//!   on-stop hook ─► SIGTERM ─► Inactive   (ApplicationExited arrives from the waiter)
//! ```
//!
//! ## Rules
//! - Spawn failure leaves the application `Inactive` and surfaces an error
//!   to the caller; it is never silently retried here.
//! - Repeated `launch()`/`stop()` converge on the target state.
//! - Hooks run fire-and-forget through `/bin/sh -c`; a failing hook is a
//!   diagnostic, not a lifecycle failure.

use nix::sys::signal::Signal;
use tokio::process::Command;

use crate::error::RegistryError;
use crate::events::{Bus, Event, EventKind};

use super::config::AppConfig;
use super::path::ObjectPath;
use super::process::ProcessHandle;
use super::state::{AppEvent, AppState};

/// One managed, launchable process entity.
#[derive(Debug)]
pub struct Application {
    config: AppConfig,
    path: ObjectPath,
    state: AppState,
    process: Option<ProcessHandle>,
    bus: Bus,
}

impl Application {
    /// Creates the entity in the `Inactive` state. The config is assumed to
    /// be validated by the registry.
    pub(crate) fn new(config: AppConfig, path: ObjectPath, bus: Bus) -> Self {
        Self {
            config,
            path,
            state: AppState::Inactive,
            process: None,
            bus,
        }
    }

    /// Unique registry key.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AppState {
        self.state
    }

    /// Stable object path.
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Current configuration record.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// True if protected by the `"system"` flag.
    pub fn is_system(&self) -> bool {
        self.config.is_system()
    }

    /// Pid of the owned process, while one is alive.
    pub fn pid(&self) -> Option<i32> {
        self.process.as_ref().filter(|p| p.is_alive()).map(|p| p.pid())
    }

    /// Replaces the configuration in place. `name` is immutable: the
    /// incoming record's name is ignored in favor of the registered one.
    pub(crate) fn set_config(&mut self, mut config: AppConfig) {
        config.name = self.config.name.clone();
        self.config = config;
    }

    /// Brings the application to the foreground.
    ///
    /// Spawns a process when none is alive; otherwise resumes the existing
    /// one (SIGCONT first when parked in `Paused`) via the on-resume hook.
    /// The registry pauses the previous foreground holder before calling
    /// this.
    pub(crate) async fn launch(&mut self) -> Result<(), RegistryError> {
        if self.state == AppState::InForeground && self.alive() {
            return Ok(());
        }

        if self.alive() {
            if self.state == AppState::Paused {
                if let Some(p) = &self.process {
                    if let Err(err) = p.signal(Signal::SIGCONT) {
                        tracing::warn!(app = self.name(), %err, "resuming suspended process failed");
                    }
                }
            }
            self.run_hook(self.config.on_resume.clone(), "resume");
            self.state = self.state.next(self.config.app_type, AppEvent::Launch);
            self.bus.publish(
                Event::now(EventKind::ApplicationResumed)
                    .with_path(self.path.as_str())
                    .with_app(self.name()),
            );
            return Ok(());
        }

        let handle =
            ProcessHandle::spawn(&self.config, &self.path, &self.bus).map_err(|source| {
                RegistryError::Spawn {
                    name: self.config.name.clone(),
                    bin: self.config.bin.clone(),
                    source,
                }
            })?;
        self.process = Some(handle);
        self.state = self.state.next(self.config.app_type, AppEvent::Launch);
        self.bus.publish(
            Event::now(EventKind::ApplicationLaunched)
                .with_path(self.path.as_str())
                .with_app(self.name()),
        );
        Ok(())
    }

    /// Yields the foreground.
    ///
    /// `stopping = true` marks a mass device-suspend pause: non-Backgroundable
    /// applications are parked with SIGSTOP instead of being stopped, and no
    /// relaunch side effects fire.
    pub(crate) async fn pause(&mut self, stopping: bool) {
        if matches!(self.state, AppState::Inactive | AppState::Paused) {
            return;
        }
        let next = self.state.next(self.config.app_type, AppEvent::Pause { stopping });
        if next == self.state {
            return;
        }
        match next {
            AppState::InBackground => {
                self.run_hook(self.config.on_pause.clone(), "pause");
            }
            AppState::Paused => {
                if !self.alive() {
                    // Nothing to park; converge on Inactive instead.
                    self.state = AppState::Inactive;
                    return;
                }
                if let Some(p) = &self.process {
                    if let Err(err) = p.signal(Signal::SIGSTOP) {
                        tracing::warn!(app = self.name(), %err, "suspending process failed");
                    }
                }
            }
            AppState::Inactive => {
                self.stop().await;
                return;
            }
            AppState::InForeground => unreachable!("pause never yields the foreground"),
        }
        self.state = next;
        self.bus.publish(
            Event::now(EventKind::ApplicationPaused)
                .with_path(self.path.as_str())
                .with_app(self.name()),
        );
    }

    /// Terminates the application: on-stop hook, then SIGTERM.
    ///
    /// The state converges on `Inactive` immediately; the exit code arrives
    /// later via `ApplicationExited` from the process waiter.
    pub(crate) async fn stop(&mut self) {
        if self.state == AppState::Inactive && !self.alive() {
            return;
        }
        self.run_hook(self.config.on_stop.clone(), "stop");
        if let Some(p) = &self.process {
            if p.is_alive() {
                // A suspended process cannot act on SIGTERM until continued.
                if self.state == AppState::Paused {
                    let _ = p.signal(Signal::SIGCONT);
                }
                if let Err(err) = p.signal(Signal::SIGTERM) {
                    tracing::warn!(app = self.name(), %err, "terminating process failed");
                }
            }
        }
        self.state = self.state.next(self.config.app_type, AppEvent::Stop);
    }

    /// Suspends the caller until the owned process has exited. Used during
    /// registry teardown and unregistration to guarantee orderly shutdown.
    pub(crate) async fn wait_for_finished(&mut self) {
        if let Some(p) = &mut self.process {
            p.wait_for_finished().await;
        }
        self.process = None;
        self.state = AppState::Inactive;
    }

    /// Applies an observed process exit: clears the handle and drives the
    /// state back to `Inactive`. Returns false when the exit belongs to a
    /// previous incarnation (the application was already relaunched).
    pub(crate) fn handle_exit(&mut self) -> bool {
        match &self.process {
            Some(p) if !p.is_alive() => {
                self.process = None;
                self.state = self.state.next(self.config.app_type, AppEvent::Exited);
                true
            }
            _ => false,
        }
    }

    /// Forwards the foreground-entry notification (SIGUSR1) to the process.
    pub fn sig_usr1(&self) {
        self.forward(Signal::SIGUSR1);
    }

    /// Forwards the background-entry notification (SIGUSR2) to the process.
    pub fn sig_usr2(&self) {
        self.forward(Signal::SIGUSR2);
    }

    fn forward(&self, sig: Signal) {
        let Some(p) = self.process.as_ref().filter(|p| p.is_alive()) else {
            return;
        };
        match p.signal(sig) {
            Ok(()) => {
                self.bus.publish(
                    Event::now(EventKind::ApplicationSignaled)
                        .with_path(self.path.as_str())
                        .with_signal(sig as i32),
                );
            }
            Err(err) => {
                tracing::warn!(app = self.name(), signal = %sig, %err, "signal delivery failed");
            }
        }
    }

    fn alive(&self) -> bool {
        self.process.as_ref().is_some_and(|p| p.is_alive())
    }

    /// Runs a lifecycle hook command fire-and-forget via `/bin/sh -c`.
    fn run_hook(&self, hook: Option<String>, which: &'static str) {
        let Some(cmd) = hook.filter(|c| !c.is_empty()) else {
            return;
        };
        let app = self.config.name.clone();
        match Command::new("/bin/sh").arg("-c").arg(&cmd).spawn() {
            Ok(mut child) => {
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if !status.success() => {
                            tracing::warn!(app = %app, hook = which, %status, "hook exited nonzero");
                        }
                        Err(err) => {
                            tracing::warn!(app = %app, hook = which, %err, "hook wait failed");
                        }
                        Ok(_) => {}
                    }
                });
            }
            Err(err) => {
                tracing::warn!(app = %app, hook = which, %err, "hook spawn failed");
            }
        }
    }
}

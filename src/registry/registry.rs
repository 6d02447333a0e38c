//! # Registry: application ownership, foreground arbitration, teardown.
//!
//! The [`Registry`] owns every [`Application`] and the persisted settings
//! store, and resolves signal delivery for the
//! [`SignalRouter`](crate::SignalRouter). All mutating operations funnel
//! through one write lock, so no two mutations ever interleave; async
//! events (process exits) are applied by the registry's own exit listener.
//!
//! ## High-level architecture
//! ```text
//! Callers (RPC dispatch, buttons, suspend/resume):
//!     register / unregister / reload / launch / pause_all / resume_if_none / ...
//!            │
//!            ▼
//!     Registry ── owns ──► BTreeMap<name, Application> + startup name + stopping flag
//!            │                    │
//!            │ persist            │ lifecycle side effects
//!            ▼                    ▼
//!     SettingsStore          spawn / hooks / signals ──► Bus events
//!
//! Exit path:
//!     process waiter ── ApplicationExited ──► Bus ──► exit_listener
//!              └─► handle_exit() ─► Inactive ─► resume_if_none
//!
//! Signal delivery:
//!     SignalRouter ── signal_foreground(sig) ──► unique InForeground app
//!     (resolved under the lock at delivery time, never cached)
//! ```
//!
//! ## Rules
//! - At most one application is `InForeground`; `launch` pauses the previous
//!   holder before promoting the next.
//! - Registration is idempotent per name; `system` apps survive everything
//!   except descriptor removal.
//! - Every config mutation is persisted before the operation returns.

use std::collections::BTreeMap;
use std::sync::Arc;

use nix::sys::signal::Signal;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::apps::{AppConfig, AppState, Application, ObjectPath};
use crate::config::Config;
use crate::error::{RegistryError, SettingsError};
use crate::events::{Bus, Event, EventKind};
use crate::router::SignalRouter;

use super::descriptor;
use super::reconcile::reconcile;
use super::settings::{Settings, SettingsStore, SETTINGS_VERSION};

/// Mutable registry state, guarded by one write lock.
pub(crate) struct Table {
    /// All registered applications, keyed by unique name.
    pub(crate) apps: BTreeMap<String, Application>,
    /// Weak reference (by name) to the startup application.
    pub(crate) startup: Option<String>,
    /// Set once during supervisor shutdown; suppresses startup relaunch.
    pub(crate) stopping: bool,
}

impl Table {
    /// Name of the unique `InForeground` application, if any.
    pub(crate) fn foreground_name(&self) -> Option<String> {
        self.apps
            .values()
            .find(|a| a.state() == AppState::InForeground)
            .map(|a| a.name().to_owned())
    }

    /// Resolves an object path back to a registered name.
    pub(crate) fn name_by_path(&self, path: &str) -> Option<String> {
        self.apps
            .values()
            .find(|a| a.path().as_str() == path)
            .map(|a| a.name().to_owned())
    }
}

/// Validates and inserts a new application, idempotently per name.
///
/// Returns the (existing or new) object path. Emits
/// `ApplicationRegistered` only when something was actually created.
pub(crate) fn admit(
    table: &mut Table,
    bus: &Bus,
    config: AppConfig,
) -> Result<ObjectPath, RegistryError> {
    config.validate()?;
    if let Some(existing) = table.apps.get(&config.name) {
        return Ok(existing.path().clone());
    }
    let path = ObjectPath::for_app(&config.name);
    let name = config.name.clone();
    let app = Application::new(config, path.clone(), bus.clone());
    table.apps.insert(name.clone(), app);
    bus.publish(
        Event::now(EventKind::ApplicationRegistered)
            .with_path(path.as_str())
            .with_app(name),
    );
    Ok(path)
}

/// Stops and removes one application, emitting `ApplicationUnregistered`.
pub(crate) async fn evict(table: &mut Table, bus: &Bus, name: &str) {
    let Some(mut app) = table.apps.remove(name) else {
        return;
    };
    app.stop().await;
    bus.publish(
        Event::now(EventKind::ApplicationUnregistered)
            .with_path(app.path().as_str())
            .with_app(name),
    );
}

/// Owns all applications and arbitrates the foreground.
pub struct Registry {
    cfg: Config,
    bus: Bus,
    store: SettingsStore,
    token: CancellationToken,
    inner: RwLock<Table>,
}

impl Registry {
    /// Creates an empty registry. Call [`Registry::startup`] to load the
    /// persisted state and start the exit listener.
    pub fn new(cfg: Config, bus: Bus) -> Arc<Self> {
        let store = SettingsStore::new(cfg.settings_path.clone());
        Arc::new(Self {
            cfg,
            bus,
            store,
            token: CancellationToken::new(),
            inner: RwLock::new(Table {
                apps: BTreeMap::new(),
                startup: None,
                stopping: false,
            }),
        })
    }

    /// The event bus shared with applications and the router.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Builds the signal router delivering through this registry.
    pub fn signal_router(self: &Arc<Self>) -> SignalRouter {
        SignalRouter::new(Arc::clone(self))
    }

    /// Cancellation token shared with the exit listener and router.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Number of settings writes performed so far.
    pub fn settings_writes(&self) -> u64 {
        self.store.write_count()
    }

    /// Initializes the registry: loads the settings document (an unknown
    /// schema version is fatal here), reconciles against the descriptor
    /// directory, persists the result, starts the exit listener, and
    /// launches the startup application if nothing is foreground.
    pub async fn startup(self: &Arc<Self>) -> Result<(), SettingsError> {
        let doc = self.store.load().await?;
        let descriptors = descriptor::scan(&self.cfg.descriptor_dir).await;
        {
            let mut table = self.inner.write().await;
            table.startup = doc.startup_application.clone();
            reconcile(&mut table, &self.bus, doc.applications, descriptors).await;
            self.persist(&table).await;
        }
        Arc::clone(self).spawn_exit_listener();
        self.resume_if_none().await;
        Ok(())
    }

    /// Validates and registers a new application.
    ///
    /// Idempotent: a duplicate name returns the existing object path and
    /// creates nothing. Invalid input is rejected before any state change.
    pub async fn register_application(
        &self,
        config: AppConfig,
    ) -> Result<ObjectPath, RegistryError> {
        let mut table = self.inner.write().await;
        let path = admit(&mut table, &self.bus, config)?;
        self.persist(&table).await;
        Ok(path)
    }

    /// Removes the application at `path`.
    ///
    /// Unknown paths are a no-op success; `system`-flagged applications are
    /// protected and return `false` with no state change.
    pub async fn unregister_application(&self, path: &str) -> bool {
        let mut table = self.inner.write().await;
        let Some(name) = table.name_by_path(path) else {
            return true;
        };
        if table.apps.get(&name).is_some_and(Application::is_system) {
            return false;
        }
        evict(&mut table, &self.bus, &name).await;
        self.persist(&table).await;
        true
    }

    /// Re-runs reconciliation against the settings store and the descriptor
    /// directory, then persists the merged result. Idempotent.
    pub async fn reload(&self) -> Result<(), SettingsError> {
        let doc = self.store.load().await?;
        let descriptors = descriptor::scan(&self.cfg.descriptor_dir).await;
        let mut table = self.inner.write().await;
        // The store is authoritative, exactly as at startup.
        table.startup = doc.startup_application.clone();
        reconcile(&mut table, &self.bus, doc.applications, descriptors).await;
        self.persist(&table).await;
        Ok(())
    }

    /// Brings the application at `path` to the foreground, pausing whichever
    /// application currently holds it.
    pub async fn launch(&self, path: &str) -> Result<(), RegistryError> {
        let mut table = self.inner.write().await;
        let name = table
            .name_by_path(path)
            .ok_or_else(|| RegistryError::UnknownApplication { path: path.into() })?;
        self.launch_locked(&mut table, &name).await
    }

    /// All registered applications as name → object path.
    pub async fn applications(&self) -> BTreeMap<String, ObjectPath> {
        let table = self.inner.read().await;
        table
            .apps
            .values()
            .map(|a| (a.name().to_owned(), a.path().clone()))
            .collect()
    }

    /// Applications currently `InForeground` or `InBackground`.
    pub async fn running_applications(&self) -> BTreeMap<String, ObjectPath> {
        self.filtered(AppState::is_running).await
    }

    /// Applications currently parked in `Paused`.
    pub async fn paused_applications(&self) -> BTreeMap<String, ObjectPath> {
        self.filtered(|s| s == AppState::Paused).await
    }

    /// Object path of the unique foreground application, if any.
    pub async fn current_application(&self) -> Option<ObjectPath> {
        let table = self.inner.read().await;
        let name = table.foreground_name()?;
        table.apps.get(&name).map(|a| a.path().clone())
    }

    /// Resolves a name to its object path.
    pub async fn get_application_path(&self, name: &str) -> Option<ObjectPath> {
        let table = self.inner.read().await;
        table.apps.get(name).map(|a| a.path().clone())
    }

    /// Lifecycle state of one application, by name.
    pub async fn application_state(&self, name: &str) -> Option<AppState> {
        let table = self.inner.read().await;
        table.apps.get(name).map(Application::state)
    }

    /// Pid of one application's live process, by name.
    pub async fn application_pid(&self, name: &str) -> Option<i32> {
        let table = self.inner.read().await;
        table.apps.get(name).and_then(Application::pid)
    }

    /// Object path of the configured startup application.
    pub async fn startup_application(&self) -> Option<ObjectPath> {
        let table = self.inner.read().await;
        let name = table.startup.clone()?;
        table.apps.get(&name).map(|a| a.path().clone())
    }

    /// Points the startup reference at the application registered at `path`.
    ///
    /// Ignored (no error, no mutation) when the path does not resolve; this
    /// is a weak-reference update, not ownership transfer.
    pub async fn set_startup_application(&self, path: &str) {
        let mut table = self.inner.write().await;
        let Some(name) = table.name_by_path(path) else {
            return;
        };
        table.startup = Some(name);
        self.persist(&table).await;
    }

    /// Pauses every application with device-suspend semantics: processes
    /// are kept (backgrounded or SIGSTOPped), and nothing relaunches itself
    /// mid-transition.
    pub async fn pause_all(&self) {
        let mut table = self.inner.write().await;
        let names: Vec<String> = table.apps.keys().cloned().collect();
        for name in names {
            if let Some(app) = table.apps.get_mut(&name) {
                app.pause(true).await;
            }
        }
    }

    /// Launches the startup application when nothing is foreground.
    ///
    /// No-op while an application holds the foreground, while the registry
    /// is stopping, or when no startup application resolves.
    pub async fn resume_if_none(&self) {
        let mut table = self.inner.write().await;
        self.resume_if_none_locked(&mut table).await;
    }

    /// Left-button hold: return to the startup application.
    ///
    /// No-op when the startup application already holds the foreground.
    pub async fn left_held(&self) {
        let mut table = self.inner.write().await;
        let Some(startup) = table.startup.clone() else {
            return;
        };
        if table.foreground_name().as_deref() == Some(startup.as_str()) {
            tracing::debug!("already at startup application");
            return;
        }
        if !table.apps.contains_key(&startup) {
            return;
        }
        if let Err(err) = self.launch_locked(&mut table, &startup).await {
            tracing::warn!(%err, "launching startup application failed");
        }
    }

    /// Home-button hold: launch the well-known process manager.
    pub async fn home_held(&self) {
        let mut table = self.inner.write().await;
        let name = self.cfg.process_manager.clone();
        if !table.apps.contains_key(&name) {
            tracing::warn!(app = %name, "unable to find process manager");
            return;
        }
        if table.foreground_name().as_deref() == Some(name.as_str()) {
            tracing::debug!("process manager already running");
            return;
        }
        if let Err(err) = self.launch_locked(&mut table, &name).await {
            tracing::warn!(%err, "launching process manager failed");
        }
    }

    /// Orderly teardown: sets the stopping flag, persists, stops every
    /// application and joins each process (bounded by the configured grace),
    /// then cancels the exit listener and router.
    pub async fn shutdown(&self) {
        {
            let mut table = self.inner.write().await;
            table.stopping = true;
            self.persist(&table).await;

            let names: Vec<String> = table.apps.keys().cloned().collect();
            for name in &names {
                if let Some(app) = table.apps.get_mut(name) {
                    app.stop().await;
                }
            }
            for name in &names {
                if let Some(app) = table.apps.get_mut(name) {
                    let joined = tokio::time::timeout(self.cfg.grace, app.wait_for_finished());
                    if joined.await.is_err() {
                        tracing::warn!(app = %name, "process did not exit within grace");
                    }
                }
            }
        }
        self.token.cancel();
    }

    /// Delivers a foreground-entry/background-entry notification to the
    /// unique foreground application, resolved at delivery time.
    pub(crate) async fn signal_foreground(&self, sig: Signal) {
        let table = self.inner.read().await;
        let Some(name) = table.foreground_name() else {
            tracing::debug!(signal = %sig, "no foreground application to notify");
            return;
        };
        let Some(app) = table.apps.get(&name) else {
            return;
        };
        match sig {
            Signal::SIGUSR1 => app.sig_usr1(),
            Signal::SIGUSR2 => app.sig_usr2(),
            other => tracing::debug!(signal = %other, "unroutable signal"),
        }
    }

    // ---------------------------
    // Internals
    // ---------------------------

    /// Subscribes to the bus and applies process exits to the table.
    fn spawn_exit_listener(self: Arc<Self>) {
        let mut rx = self.bus.subscribe();
        let token = self.token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) if ev.kind == EventKind::ApplicationExited => {
                            if let Some(path) = ev.path.as_deref() {
                                self.on_exited(path).await;
                            }
                        }
                        Ok(_) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "exit listener lagged behind the bus");
                            continue;
                        }
                    }
                }
            }
        });
    }

    /// Applies one observed process exit, then relaunches the startup
    /// application if the foreground fell vacant.
    async fn on_exited(&self, path: &str) {
        let mut table = self.inner.write().await;
        let Some(name) = table.name_by_path(path) else {
            return;
        };
        let Some(app) = table.apps.get_mut(&name) else {
            return;
        };
        if !app.handle_exit() {
            // Exit of a previous incarnation; the app was relaunched since.
            return;
        }
        self.resume_if_none_locked(&mut table).await;
    }

    async fn resume_if_none_locked(&self, table: &mut Table) {
        if table.stopping {
            return;
        }
        if table.foreground_name().is_some() {
            return;
        }
        let Some(startup) = table.startup.clone() else {
            return;
        };
        if !table.apps.contains_key(&startup) {
            return;
        }
        if let Err(err) = self.launch_locked(table, &startup).await {
            tracing::warn!(%err, "relaunching startup application failed");
        }
    }

    async fn launch_locked(&self, table: &mut Table, name: &str) -> Result<(), RegistryError> {
        if let Some(previous) = table.foreground_name() {
            if previous != name {
                if let Some(app) = table.apps.get_mut(&previous) {
                    app.pause(false).await;
                }
            }
        }
        let app = table
            .apps
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownApplication { path: name.into() })?;
        app.launch().await?;
        Ok(())
    }

    async fn filtered(&self, keep: impl Fn(AppState) -> bool) -> BTreeMap<String, ObjectPath> {
        let table = self.inner.read().await;
        table
            .apps
            .values()
            .filter(|a| keep(a.state()))
            .map(|a| (a.name().to_owned(), a.path().clone()))
            .collect()
    }

    /// Writes the current table to the settings store. Persistence failures
    /// are diagnostics, not operation failures.
    async fn persist(&self, table: &Table) {
        let doc = Settings {
            version: SETTINGS_VERSION,
            startup_application: table.startup.clone(),
            applications: table.apps.values().map(|a| a.config().clone()).collect(),
        };
        if let Err(err) = self.store.save(&doc).await {
            tracing::error!(%err, "persisting applications failed");
        }
    }
}

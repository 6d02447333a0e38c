//! # Global daemon configuration.
//!
//! Provides [`Config`], centralized settings for the supervisor runtime.
//!
//! Config is consumed once, at [`Registry::new`](crate::Registry::new):
//! it tells the registry where the persisted settings file and the
//! descriptor directory live, how large the event bus is, and which
//! well-known application the home button launches.

use std::path::PathBuf;
use std::time::Duration;

/// Well-known name of the process-manager application launched by `home_held`.
pub const PROCESS_MANAGER: &str = "codes.eeems.erode";

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `settings_path`: persisted settings document (JSON, created on first write)
/// - `descriptor_dir`: directory of declarative `*.oxide` system-app descriptors
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `grace`: maximum wait for one application to exit during teardown
/// - `process_manager`: name of the app `home_held` launches
#[derive(Clone, Debug)]
pub struct Config {
    /// Path of the persisted settings document.
    pub settings_path: PathBuf,

    /// Directory scanned for system-application descriptors.
    pub descriptor_dir: PathBuf,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will receive `Lagged` and skip older items. Minimum value is 1
    /// (enforced by Bus).
    pub bus_capacity: usize,

    /// Maximum time `wait_for_finished` blocks on one process during
    /// teardown before giving up on it.
    pub grace: Duration,

    /// Name of the well-known process-manager application.
    pub process_manager: String,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `settings_path = /home/root/.config/appvisor/applications.json`
    /// - `descriptor_dir = /opt/usr/share/applications`
    /// - `bus_capacity = 1024`
    /// - `grace = 60s`
    /// - `process_manager = "codes.eeems.erode"`
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("/home/root/.config/appvisor/applications.json"),
            descriptor_dir: PathBuf::from("/opt/usr/share/applications"),
            bus_capacity: 1024,
            grace: Duration::from_secs(60),
            process_manager: PROCESS_MANAGER.to_string(),
        }
    }
}

//! # Reconciliation: the idempotent three-way merge.
//!
//! Merges three sources of truth about the application set:
//! (a) the in-memory registry, (b) the persisted settings records,
//! (c) the descriptor directory of static system applications.
//!
//! ## Order of operations (each step idempotent)
//! ```text
//! 1. evict   non-system apps absent from the persisted records
//!            (the store is authoritative for user-registered apps)
//! 2. apply   every valid persisted record (create new / update in place)
//! 3. scan    descriptor dir → system-flagged candidates (done by caller)
//! 4. evict   system apps whose descriptor is gone,
//!    apply   remaining descriptor candidates (create new / update in place)
//! ```
//!
//! ## Rules
//! - Update-in-place emits no events and is a no-op when the config is
//!   byte-identical, so a second run with no external changes performs zero
//!   mutations.
//! - Invalid candidates (missing fields, nonexistent binary) are skipped
//!   with a diagnostic; the merge always completes.

use std::collections::HashSet;

use crate::apps::AppConfig;
use crate::events::Bus;

use super::registry::{admit, evict, Table};

/// Runs the full merge against already-scanned descriptor candidates.
pub(crate) async fn reconcile(
    table: &mut Table,
    bus: &Bus,
    records: Vec<AppConfig>,
    descriptors: Vec<AppConfig>,
) {
    // 1. The persisted store is authoritative for user-registered apps.
    let persisted: HashSet<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let stale: Vec<String> = table
        .apps
        .values()
        .filter(|a| !a.is_system() && !persisted.contains(a.name()))
        .map(|a| a.name().to_owned())
        .collect();
    for name in stale {
        evict(table, bus, &name).await;
    }

    // 2. Create-or-update from persisted records.
    for record in records {
        apply(table, bus, record);
    }

    // 4. Retire system apps whose descriptor disappeared, then
    //    create-or-update from the remaining candidates.
    let declared: HashSet<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
    let retired: Vec<String> = table
        .apps
        .values()
        .filter(|a| a.is_system() && !declared.contains(a.name()))
        .map(|a| a.name().to_owned())
        .collect();
    for name in retired {
        evict(table, bus, &name).await;
    }
    for candidate in descriptors {
        apply(table, bus, candidate);
    }
}

/// One create-or-update step. Creation goes through full registration
/// validation; an invalid candidate is skipped with a diagnostic.
fn apply(table: &mut Table, bus: &Bus, config: AppConfig) {
    if config.name.is_empty() || config.bin.is_empty() {
        tracing::warn!(app = %config.name, "skipping record with missing fields");
        return;
    }
    if let Some(existing) = table.apps.get_mut(&config.name) {
        if existing.config() != &config {
            existing.set_config(config);
        }
        return;
    }
    if let Err(err) = admit(table, bus, config) {
        tracing::warn!(label = err.as_label(), %err, "skipping invalid candidate");
    }
}

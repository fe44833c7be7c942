// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session tracker's three independent operations over the shared
//! `LaunchRecord` map (spec §4.4.1–§4.4.3): track/exit, reconcile and
//! enrich, and the periodic PID liveness and pending-id resolution sweeps.

use crate::pid;
use agentctl_adapters::Registry;
use agentctl_core::id::{pending_id, pending_pid};
use agentctl_core::{Clock, DiscoveredSession, EnrichedSession, LaunchRecord, SessionStatus};
use agentctl_coordination::LockManager;
use agentctl_storage::DocumentStore;
use std::collections::{HashMap, HashSet};

/// How long a just-launched session stays visible even if the adapter's
/// on-disk scan hasn't picked it up yet (spec §4.4.2, "30-60 s").
pub const GRACE_MS: u64 = 45_000;

pub struct ReconcileResult {
    pub sessions: Vec<EnrichedSession>,
    pub stopped_launch_ids: Vec<String>,
}

pub struct SessionTracker;

impl SessionTracker {
    /// Upserts `record`. If its pid matches a pending-prefixed record of
    /// the same adapter and `record`'s own id is stable, the pending
    /// record is collapsed into it first.
    pub fn track(store: &mut DocumentStore, record: LaunchRecord) {
        if !record.is_pending() {
            if let Some(pid) = record.pid {
                let candidate = pending_id(pid);
                if let Some(pending) = store.get_launch(&candidate) {
                    if pending.adapter == record.adapter {
                        store.remove_launch(&candidate);
                        LockManager::update_auto_lock_session_id(store, &candidate, &record.id);
                    }
                }
            }
        }
        store.upsert_launch(record);
    }

    /// Idempotent: re-exiting an already-stopped session is a no-op.
    pub fn on_session_exit(store: &mut DocumentStore, id: &str, clock: &impl Clock) {
        let Some(mut record) = store.get_launch(id).cloned() else {
            return;
        };
        if record.status != SessionStatus::Stopped {
            record.mark_stopped(clock.now_ms());
            store.upsert_launch(record);
        }
    }

    /// Unconditional removal, used against ghost pending entries with a
    /// dead pid.
    pub fn remove_session(store: &mut DocumentStore, id: &str) -> bool {
        store.remove_launch(id)
    }

    pub fn reconcile_and_enrich(
        store: &mut DocumentStore,
        discovered: Vec<DiscoveredSession>,
        succeeded_adapters: &HashSet<String>,
        clock: &impl Clock,
    ) -> ReconcileResult {
        let now = clock.now_ms();

        for d in &discovered {
            if store.get_launch(&d.id).is_some() {
                continue;
            }
            let Some(pid) = d.pid else { continue };
            let candidate = pending_id(pid);
            let Some(pending) = store.get_launch(&candidate).cloned() else {
                continue;
            };
            if pending.adapter == d.adapter {
                collapse_pending(store, pending, &d.id);
            }
        }

        let discovered_ids: HashSet<&str> = discovered.iter().map(|d| d.id.as_str()).collect();
        let mut sessions: Vec<EnrichedSession> = discovered
            .iter()
            .map(|d| EnrichedSession::merge(d, store.get_launch(&d.id)))
            .collect();

        let mut stopped_launch_ids = Vec::new();
        let disappeared: Vec<LaunchRecord> = store
            .launches()
            .iter()
            .filter(|l| l.status == SessionStatus::Running)
            .filter(|l| succeeded_adapters.contains(&l.adapter))
            .filter(|l| !discovered_ids.contains(l.id.as_str()))
            .cloned()
            .collect();

        for launch in disappeared {
            if now.saturating_sub(launch.started_at) < GRACE_MS {
                sessions.push(EnrichedSession::from_launch_record(&launch));
            } else {
                let mut stopped = launch.clone();
                stopped.mark_stopped(now);
                store.upsert_launch(stopped);
                stopped_launch_ids.push(launch.id);
            }
        }

        ReconcileResult {
            sessions,
            stopped_launch_ids,
        }
    }

    /// Runs at startup and on a 30 s interval. Uses the pid-recycling
    /// tolerance, not a plain signal-0 check, since `LaunchRecord` carries
    /// the start time recorded at launch.
    pub fn cleanup_dead_launches(store: &mut DocumentStore, clock: &impl Clock) -> Vec<String> {
        let now = clock.now_ms();
        let dead: Vec<LaunchRecord> = store
            .launches()
            .iter()
            .filter(|l| l.status == SessionStatus::Running)
            .filter_map(|l| l.pid.map(|p| (l.clone(), p)))
            .filter(|(l, p)| !pid::is_pid_alive_verified(*p, l.process_start_time))
            .map(|(l, _)| l)
            .collect();

        let mut dead_ids = Vec::with_capacity(dead.len());
        for mut record in dead {
            record.mark_stopped(now);
            dead_ids.push(record.id.clone());
            store.upsert_launch(record);
        }
        dead_ids
    }

    /// Gives the RPC layer "try one more time" semantics when a caller
    /// still holds a pending id. Returns the input id unchanged if it
    /// isn't pending, the owning adapter is unknown, its `discover()`
    /// call fails, or no match is found.
    pub async fn resolve_pending_id(
        store: &mut DocumentStore,
        id: &str,
        registry: &Registry,
    ) -> String {
        if pending_pid(id).is_none() {
            return id.to_string();
        }
        let Some(pending) = store.get_launch(id).cloned() else {
            return id.to_string();
        };
        let Some(adapter) = registry.get(&pending.adapter) else {
            return id.to_string();
        };
        let Ok(discovered) = adapter.discover().await else {
            return id.to_string();
        };

        let target_pid = pending_pid(id);
        match discovered.into_iter().find(|d| d.pid == target_pid && d.id != id) {
            Some(found) => collapse_pending(store, pending, &found.id).id,
            None => id.to_string(),
        }
    }

    /// Batched, 10 s interval: one `discover()` call per adapter with
    /// pending records, rather than one per pending record.
    /// `on_resolved(pending_id, stable_id)` lets the caller react (e.g.
    /// log or emit an event) to each promotion.
    pub async fn resolve_pending_sessions(
        store: &mut DocumentStore,
        registry: &Registry,
        mut on_resolved: impl FnMut(&str, &str),
    ) -> Vec<String> {
        let mut by_adapter: HashMap<String, Vec<LaunchRecord>> = HashMap::new();
        for launch in store.launches() {
            if launch.is_pending() {
                by_adapter
                    .entry(launch.adapter.clone())
                    .or_default()
                    .push(launch.clone());
            }
        }

        let mut resolved = Vec::new();
        for (adapter_name, pendings) in by_adapter {
            let Some(adapter) = registry.get(&adapter_name) else {
                continue;
            };
            let Ok(discovered) = adapter.discover().await else {
                continue;
            };

            for pending in pendings {
                let Some(pid) = pending_pid(&pending.id) else {
                    continue;
                };
                let found = discovered
                    .iter()
                    .find(|d| d.pid == Some(pid) && d.id != pending.id);
                if let Some(found) = found {
                    let pending_id_str = pending.id.clone();
                    let stable = collapse_pending(store, pending, &found.id);
                    on_resolved(&pending_id_str, &stable.id);
                    resolved.push(stable.id);
                }
            }
        }
        resolved
    }
}

/// Shared pending→stable promotion: remove the pending record, re-insert
/// it under the stable id (carrying prompt/group/spec/meta along), and
/// rewrite any auto-lock session id that pointed at the pending id.
fn collapse_pending(store: &mut DocumentStore, pending: LaunchRecord, stable_id: &str) -> LaunchRecord {
    let pending_id = pending.id.clone();
    let mut stable = pending;
    stable.id = stable_id.to_string();
    if let Some(pid) = stable.pid {
        stable.process_start_time = pid::get_process_start_time(pid);
    }
    store.remove_launch(&pending_id);
    store.upsert_launch(stable.clone());
    LockManager::update_auto_lock_session_id(store, &pending_id, stable_id);
    stable
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC method dispatch (spec §6.1). One function per method; `dispatch`
//! is the only entry point `server` calls.

use crate::cluster::{derive_branch, derive_cluster_name};
use crate::protocol::{
    DaemonStatusResult, FuseExtendParams, FuseSetParams, LockAcquireParams, LockDirectoryParams,
    PruneResult, SessionIdParams, SessionLaunchParams, SessionListParams, SessionListResult,
    SessionPeekParams, SessionResumeParams, SessionStopParams,
};
use crate::state::DaemonState;
use agentctl_adapters::{Adapter, AdapterError, LaunchOpts};
use agentctl_core::{Clock, DiscoveredSession, ErrorCode, Event, WireError};
use agentctl_coordination::{FuseEngine, LockError, LockManager, SetFuseRequest};
use agentctl_tracker::SessionTracker;
use std::collections::HashSet;
use std::path::PathBuf;

pub async fn dispatch<C: Clock>(
    state: &mut DaemonState<C>,
    method: &str,
    params: serde_json::Value,
) -> Result<serde_json::Value, WireError> {
    match method {
        "session.list" => session_list(state, parse(params)?).await,
        "session.status" => session_status(state, parse(params)?).await,
        "session.peek" => session_peek(state, parse(params)?).await,
        "session.launch" => session_launch(state, parse(params)?).await,
        "session.stop" => session_stop(state, parse(params)?).await,
        "session.resume" => session_resume(state, parse(params)?).await,
        "session.prune" => session_prune(state).await,
        "lock.list" => lock_list(state),
        "lock.acquire" => lock_acquire(state, parse(params)?),
        "lock.release" => lock_release(state, parse(params)?),
        "fuse.list" => fuse_list(state),
        "fuse.set" => fuse_set(state, parse(params)?),
        "fuse.extend" => fuse_extend(state, parse(params)?),
        "fuse.cancel" => fuse_cancel(state, parse(params)?),
        "daemon.status" => daemon_status(state),
        "daemon.shutdown" => daemon_shutdown(state),
        other => Err(WireError::new(
            ErrorCode::InvalidArgument,
            format!("unknown method: {other}"),
        )),
    }
}

fn parse<T: serde::de::DeserializeOwned>(params: serde_json::Value) -> Result<T, WireError> {
    serde_json::from_value(params)
        .map_err(|e| WireError::new(ErrorCode::InvalidArgument, format!("bad params: {e}")))
}

fn to_value<T: serde::Serialize>(v: T) -> serde_json::Value {
    serde_json::to_value(v).unwrap_or(serde_json::Value::Null)
}

/// Resolves a possibly-pending, possibly-prefixed id to a stable launch
/// record id, a best-effort RPC-layer convenience (spec §7, "silently
/// attempt one pending→stable resolution before failing").
async fn resolve_id<C: Clock>(state: &mut DaemonState<C>, id: &str) -> String {
    let resolved = SessionTracker::resolve_pending_id(&mut state.store, id, &state.registry).await;
    if state.store.get_launch(&resolved).is_some() {
        return resolved;
    }
    let matches: Vec<String> = state
        .store
        .launches()
        .iter()
        .filter(|l| l.id.starts_with(&resolved))
        .map(|l| l.id.clone())
        .collect();
    match matches.as_slice() {
        [only] => only.clone(),
        _ => resolved,
    }
}

fn resolve_adapter<C: Clock>(
    state: &DaemonState<C>,
    requested: Option<&str>,
    fallback: Option<&str>,
) -> Result<std::sync::Arc<dyn Adapter>, WireError> {
    let name = requested
        .or(fallback)
        .unwrap_or(agentctl_adapters::DEFAULT_ADAPTER);
    state
        .registry
        .get(name)
        .ok_or_else(|| WireError::new(ErrorCode::AdapterUnknown, format!("unknown adapter: {name}")))
}

struct DiscoverOutcome {
    adapter: String,
    sessions: Vec<DiscoveredSession>,
    warning: Option<String>,
}

async fn discover_all<C: Clock>(state: &DaemonState<C>) -> Vec<DiscoverOutcome> {
    let timeout = state.adapter_timeout;
    let calls = state.registry.iter().map(|(name, adapter)| {
        let adapter = adapter.clone();
        let name = name.to_string();
        async move {
            match tokio::time::timeout(timeout, adapter.discover()).await {
                Ok(Ok(sessions)) => DiscoverOutcome {
                    adapter: name,
                    sessions,
                    warning: None,
                },
                Ok(Err(e)) => DiscoverOutcome {
                    adapter: name.clone(),
                    sessions: Vec::new(),
                    warning: Some(format!("Adapter {name} failed: {e}")),
                },
                Err(_) => DiscoverOutcome {
                    adapter: name.clone(),
                    sessions: Vec::new(),
                    warning: Some(format!(
                        "Adapter {name} timed out after {}ms",
                        timeout.as_millis()
                    )),
                },
            }
        }
    });
    futures_util::future::join_all(calls).await
}

async fn session_list<C: Clock>(
    state: &mut DaemonState<C>,
    params: SessionListParams,
) -> Result<serde_json::Value, WireError> {
    let outcomes = discover_all(state).await;

    let mut discovered = Vec::new();
    let mut warnings = Vec::new();
    let mut succeeded = HashSet::new();
    for outcome in outcomes {
        if let Some(adapter) = &params.adapter {
            if *adapter != outcome.adapter {
                continue;
            }
        }
        if let Some(warning) = outcome.warning {
            warnings.push(warning);
        } else {
            succeeded.insert(outcome.adapter);
        }
        discovered.extend(outcome.sessions);
    }

    let result = SessionTracker::reconcile_and_enrich(&mut state.store, discovered, &succeeded, &state.clock);
    for id in &result.stopped_launch_ids {
        LockManager::auto_unlock(&mut state.store, id);
        state.record_event(Event::SessionStopped { id: id.clone() });
    }

    let mut sessions = result.sessions;
    if let Some(status) = &params.status {
        sessions.retain(|s| format!("{:?}", s.status).to_lowercase() == status.to_lowercase());
    }
    if let Some(group) = &params.group {
        sessions.retain(|s| s.group.as_deref() == Some(group.as_str()));
    }
    if !params.all {
        sessions.retain(|s| s.stopped_at.is_none());
    }

    state.flush_if_due();
    Ok(to_value(SessionListResult { sessions, warnings }))
}

async fn session_status<C: Clock>(
    state: &mut DaemonState<C>,
    params: SessionIdParams,
) -> Result<serde_json::Value, WireError> {
    let id = resolve_id(state, &params.id).await;
    let adapter = resolve_adapter(state, params.adapter.as_deref(), None)?;

    let discovered = adapter
        .discover()
        .await
        .map_err(adapter_error)?
        .into_iter()
        .find(|d| d.id == id);
    let launch = state.store.get_launch(&id).cloned();

    match (discovered, launch) {
        (Some(d), launch) => Ok(to_value(agentctl_core::EnrichedSession::merge(&d, launch.as_ref()))),
        (None, Some(launch)) => Ok(to_value(agentctl_core::EnrichedSession::from_launch_record(&launch))),
        (None, None) => Err(WireError::not_found(format!("session not found: {id}"))),
    }
}

async fn session_peek<C: Clock>(
    state: &mut DaemonState<C>,
    params: SessionPeekParams,
) -> Result<serde_json::Value, WireError> {
    let id = resolve_id(state, &params.id).await;
    let launch = state.store.get_launch(&id).cloned();
    let adapter_name = params.adapter.clone().or_else(|| launch.map(|l| l.adapter));
    let adapter = resolve_adapter(state, adapter_name.as_deref(), None)?;
    let output = adapter
        .peek(&id, params.lines)
        .await
        .map_err(adapter_error)?;
    Ok(serde_json::Value::String(output))
}

async fn session_launch<C: Clock>(
    state: &mut DaemonState<C>,
    params: SessionLaunchParams,
) -> Result<serde_json::Value, WireError> {
    let cwd = PathBuf::from(&params.cwd);
    let adapter = resolve_adapter(state, params.adapter.as_deref(), None)?;

    if !params.force {
        if let Some(existing) = LockManager::check(&state.store, &cwd) {
            let holder = existing
                .session_id
                .or(existing.locked_by)
                .unwrap_or_else(|| "unknown".to_string());
            return Err(WireError::lock_conflict(format!(
                "{} is locked by {holder}",
                params.cwd
            )));
        }
    }

    state.fuse_engine.cancel_fuse(&mut state.store, &cwd);

    let opts = LaunchOpts {
        prompt: params.prompt,
        cwd: cwd.clone(),
        spec: params.spec,
        model: params.model,
        env: params.env,
        adapter_opts: params.adapter_opts,
        group: params.group,
    };
    let mut record = adapter.launch(opts).await.map_err(adapter_error)?;
    if let Some(pid) = record.pid {
        record.process_start_time = agentctl_tracker::pid::get_process_start_time(pid);
    }

    SessionTracker::track(&mut state.store, record.clone());
    LockManager::auto_lock(&mut state.store, &cwd, &record.id, &state.clock)
        .map_err(lock_error)?;
    state.record_event(Event::SessionLaunched {
        id: record.id.clone(),
        adapter: record.adapter.clone(),
    });

    state.flush_if_due();
    Ok(to_value(record))
}

async fn session_stop<C: Clock>(
    state: &mut DaemonState<C>,
    params: SessionStopParams,
) -> Result<serde_json::Value, WireError> {
    let id = resolve_id(state, &params.id).await;
    let launch = state.store.get_launch(&id).cloned();

    if let Some(launch) = &launch {
        if launch.is_pending() {
            let dead = launch
                .pid
                .map(|p| !agentctl_tracker::pid::is_pid_alive(p))
                .unwrap_or(true);
            if dead && params.force {
                SessionTracker::remove_session(&mut state.store, &id);
                LockManager::auto_unlock(&mut state.store, &id);
                state.flush_if_due();
                return Ok(serde_json::Value::Null);
            }
        }
    }

    let adapter_name = params.adapter.clone().or_else(|| launch.as_ref().map(|l| l.adapter.clone()));
    let adapter = resolve_adapter(state, adapter_name.as_deref(), None)?;

    if let Err(e) = adapter.stop(&id, params.force).await {
        if !matches!(e, AdapterError::NotFound(_)) {
            return Err(adapter_error(e));
        }
    }

    SessionTracker::on_session_exit(&mut state.store, &id, &state.clock);
    LockManager::auto_unlock(&mut state.store, &id);
    state.record_event(Event::SessionStopped { id: id.clone() });

    state.flush_if_due();
    Ok(serde_json::Value::Null)
}

async fn session_resume<C: Clock>(
    state: &mut DaemonState<C>,
    params: SessionResumeParams,
) -> Result<serde_json::Value, WireError> {
    let id = resolve_id(state, &params.id).await;
    let launch = state.store.get_launch(&id).cloned();
    let adapter_name = params.adapter.clone().or_else(|| launch.map(|l| l.adapter));
    let adapter = resolve_adapter(state, adapter_name.as_deref(), None)?;
    adapter
        .resume(&id, &params.message)
        .await
        .map_err(adapter_error)?;
    Ok(serde_json::Value::Null)
}

async fn session_prune<C: Clock>(state: &mut DaemonState<C>) -> Result<serde_json::Value, WireError> {
    let dead_ids = SessionTracker::cleanup_dead_launches(&mut state.store, &state.clock);
    for id in &dead_ids {
        LockManager::auto_unlock(&mut state.store, id);
        state.record_event(Event::SessionStopped { id: id.clone() });
    }
    state.flush_if_due();
    Ok(to_value(PruneResult {
        pruned: dead_ids.len(),
    }))
}

fn lock_list<C: Clock>(state: &DaemonState<C>) -> Result<serde_json::Value, WireError> {
    Ok(to_value(LockManager::list_all(&state.store)))
}

fn lock_acquire<C: Clock>(
    state: &mut DaemonState<C>,
    params: LockAcquireParams,
) -> Result<serde_json::Value, WireError> {
    let dir = PathBuf::from(&params.directory);
    LockManager::manual_lock(&mut state.store, &dir, params.locked_by, params.reason, &state.clock)
        .map_err(lock_error)?;
    state.record_event(Event::LockAcquired {
        directory: params.directory.clone(),
    });
    state.flush_if_due();
    let lock = LockManager::check(&state.store, &dir)
        .ok_or_else(|| WireError::new(ErrorCode::Internal, "lock vanished after acquire"))?;
    Ok(to_value(lock))
}

fn lock_release<C: Clock>(
    state: &mut DaemonState<C>,
    params: LockDirectoryParams,
) -> Result<serde_json::Value, WireError> {
    let dir = PathBuf::from(&params.directory);
    LockManager::manual_unlock(&mut state.store, &dir);
    state.record_event(Event::LockReleased {
        directory: params.directory,
    });
    state.flush_if_due();
    Ok(serde_json::Value::Null)
}

fn fuse_list<C: Clock>(state: &DaemonState<C>) -> Result<serde_json::Value, WireError> {
    Ok(to_value(FuseEngine::list_active(&state.store)))
}

fn fuse_set<C: Clock>(
    state: &mut DaemonState<C>,
    params: FuseSetParams,
) -> Result<serde_json::Value, WireError> {
    let dir = PathBuf::from(&params.directory);
    let req = SetFuseRequest {
        directory: params.directory.clone(),
        cluster_name: derive_cluster_name(&dir),
        branch: derive_branch(&dir),
        session_id: params.session_id,
        ttl_ms: params.ttl_ms,
        on_expire: params.on_expire,
        label: params.label,
    };
    state.fuse_engine.set_fuse(&mut state.store, req, &state.clock);
    state.record_event(Event::FuseSet {
        directory: params.directory,
    });
    state.flush_if_due();
    Ok(serde_json::Value::Null)
}

fn fuse_extend<C: Clock>(
    state: &mut DaemonState<C>,
    params: FuseExtendParams,
) -> Result<serde_json::Value, WireError> {
    let dir = PathBuf::from(&params.directory);
    let ok = state
        .fuse_engine
        .extend_fuse(&mut state.store, &dir, params.ttl_ms, &state.clock);
    if !ok {
        return Err(WireError::not_found(format!(
            "no fuse set for {}",
            params.directory
        )));
    }
    state.flush_if_due();
    Ok(serde_json::Value::Null)
}

fn fuse_cancel<C: Clock>(
    state: &mut DaemonState<C>,
    params: LockDirectoryParams,
) -> Result<serde_json::Value, WireError> {
    let dir = PathBuf::from(&params.directory);
    state.fuse_engine.cancel_fuse(&mut state.store, &dir);
    state.record_event(Event::FuseCancelled {
        directory: params.directory,
    });
    state.flush_if_due();
    Ok(serde_json::Value::Null)
}

fn daemon_status<C: Clock>(state: &DaemonState<C>) -> Result<serde_json::Value, WireError> {
    Ok(to_value(DaemonStatusResult {
        pid: std::process::id(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        sessions: state
            .store
            .launches()
            .iter()
            .filter(|l| l.status == agentctl_core::SessionStatus::Running)
            .count(),
        locks: state.store.locks().len(),
        fuses: state.store.fuses().len(),
    }))
}

fn daemon_shutdown<C: Clock>(state: &mut DaemonState<C>) -> Result<serde_json::Value, WireError> {
    state.shutdown_requested = true;
    Ok(serde_json::Value::Null)
}

/// Handles a fuse that fired while the daemon was running: execute its
/// action and log the event (spec §4.3 firing semantics).
pub async fn handle_fuse_fired<C: Clock>(state: &mut DaemonState<C>, directory: &str) {
    let action = state.fuse_engine.fire(&mut state.store, directory);
    if let Some(action) = &action {
        FuseEngine::execute_action(action, directory).await;
    }
    state.record_event(Event::FuseExpired {
        directory: directory.to_string(),
    });
    state.flush_if_due();
}

/// Runs the 30 s PID-liveness sweep, releasing auto-locks for anything it
/// finds dead.
pub fn run_dead_launch_sweep<C: Clock>(state: &mut DaemonState<C>) {
    let dead_ids = SessionTracker::cleanup_dead_launches(&mut state.store, &state.clock);
    for id in dead_ids {
        LockManager::auto_unlock(&mut state.store, &id);
        state.record_event(Event::SessionStopped { id });
    }
    state.flush_if_due();
}

/// Runs the 10 s pending→stable resolution sweep.
pub async fn run_pending_resolve_sweep<C: Clock>(state: &mut DaemonState<C>) {
    let mut promotions = Vec::new();
    SessionTracker::resolve_pending_sessions(&mut state.store, &state.registry, |pending, stable| {
        promotions.push((pending.to_string(), stable.to_string()));
    })
    .await;
    for (pending_id, stable_id) in promotions {
        state.record_event(Event::SessionPromoted { pending_id, stable_id });
    }
    state.flush_if_due();
}

fn adapter_error(e: AdapterError) -> WireError {
    match e {
        AdapterError::NotFound(id) => WireError::not_found(format!("session not found: {id}")),
        AdapterError::Timeout => WireError::new(ErrorCode::AdapterTimeout, "adapter call timed out"),
        other => WireError::new(ErrorCode::Internal, other.to_string()),
    }
}

fn lock_error(e: LockError) -> WireError {
    match e {
        LockError::LockConflict { directory } => {
            WireError::lock_conflict(format!("{directory} is already locked"))
        }
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::Config;
use agentctl_adapters::FakeAdapter;
use agentctl_core::FakeClock;

/// Returns the state alongside the backing `TempDir`; the caller must keep
/// the directory in scope for as long as the state is used.
fn new_state() -> (DaemonState<FakeClock>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::at(dir.path());
    let state = DaemonState::for_test(config, FakeClock::new());
    (state, dir)
}

fn launch_params(cwd: &str) -> SessionLaunchParams {
    SessionLaunchParams {
        adapter: Some("fake".to_string()),
        prompt: "do the thing".to_string(),
        cwd: cwd.to_string(),
        spec: None,
        model: None,
        env: Vec::new(),
        adapter_opts: serde_json::Value::Null,
        group: None,
        force: false,
    }
}

#[tokio::test]
async fn daemon_status_reports_zero_sessions_on_a_fresh_state() {
    let (mut state, _dir) = new_state();
    let result = daemon_status(&state).unwrap();
    assert_eq!(result["sessions"], 0);
    assert_eq!(result["locks"], 0);
    assert_eq!(result["fuses"], 0);
}

#[tokio::test]
async fn unknown_method_is_rejected_before_touching_state() {
    let (mut state, _dir) = new_state();
    let err = dispatch(&mut state, "bogus.method", serde_json::json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidArgument);
}

#[tokio::test]
async fn session_launch_acquires_an_auto_lock_and_tracks_the_session() {
    let (mut state, _dir) = new_state();
    state.registry.register(std::sync::Arc::new(FakeAdapter::new("fake")));

    let record = session_launch(&mut state, launch_params("/tmp/workdir"))
        .await
        .unwrap();
    let id = record["id"].as_str().unwrap().to_string();

    assert!(state.store.get_launch(&id).is_some());
    let locks = LockManager::list_all(&state.store);
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].session_id.as_deref(), Some(id.as_str()));
}

#[tokio::test]
async fn session_launch_conflicts_with_an_existing_manual_lock() {
    let (mut state, _dir) = new_state();
    state.registry.register(std::sync::Arc::new(FakeAdapter::new("fake")));
    LockManager::manual_lock(
        &mut state.store,
        std::path::Path::new("/tmp/workdir"),
        Some("someone-else".to_string()),
        None,
        &state.clock,
    )
    .unwrap();

    let err = session_launch(&mut state, launch_params("/tmp/workdir"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::LockConflict);
}

#[tokio::test]
async fn session_launch_with_force_bypasses_an_existing_lock() {
    let (mut state, _dir) = new_state();
    state.registry.register(std::sync::Arc::new(FakeAdapter::new("fake")));
    LockManager::manual_lock(
        &mut state.store,
        std::path::Path::new("/tmp/workdir"),
        Some("someone-else".to_string()),
        None,
        &state.clock,
    )
    .unwrap();

    let mut params = launch_params("/tmp/workdir");
    params.force = true;
    assert!(session_launch(&mut state, params).await.is_ok());
}

#[tokio::test]
async fn lock_acquire_then_list_round_trips_the_held_lock() {
    let (mut state, _dir) = new_state();
    let params = LockAcquireParams {
        directory: "/tmp/workdir".to_string(),
        locked_by: Some("alice".to_string()),
        reason: Some("manual hold".to_string()),
    };
    lock_acquire(&mut state, params).unwrap();

    let listed = lock_list(&state).unwrap();
    let locks = listed.as_array().unwrap();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0]["directory"], "/tmp/workdir");
}

#[tokio::test]
async fn lock_release_on_an_unheld_directory_is_a_no_op() {
    let (mut state, _dir) = new_state();
    let params = LockDirectoryParams {
        directory: "/tmp/nothing-here".to_string(),
    };
    assert!(lock_release(&mut state, params).is_ok());
}

#[tokio::test]
async fn fuse_set_then_list_shows_the_armed_timer() {
    let (mut state, _dir) = new_state();
    let params = FuseSetParams {
        directory: "/tmp/workdir".to_string(),
        session_id: "s1".to_string(),
        ttl_ms: Some(60_000),
        on_expire: None,
        label: None,
    };
    fuse_set(&mut state, params).unwrap();

    let listed = fuse_list(&state).unwrap();
    let fuses = listed.as_array().unwrap();
    assert_eq!(fuses.len(), 1);
    assert_eq!(fuses[0]["directory"], "/tmp/workdir");
}

#[tokio::test]
async fn fuse_extend_on_a_directory_with_no_fuse_is_not_found() {
    let (mut state, _dir) = new_state();
    let params = FuseExtendParams {
        directory: "/tmp/nowhere".to_string(),
        ttl_ms: Some(1_000),
    };
    let err = fuse_extend(&mut state, params).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn daemon_shutdown_flags_the_state_for_teardown() {
    let (mut state, _dir) = new_state();
    daemon_shutdown(&mut state).unwrap();
    assert!(state.shutdown_requested);
}

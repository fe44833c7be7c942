use super::*;
use agentctl_core::{FuseTimer, LaunchRecord, Lock};
use tempfile::tempdir;

fn state_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("nested").join("state.json")
}

#[test]
fn opens_empty_when_file_does_not_exist() {
    let dir = tempdir().unwrap();
    let store = DocumentStore::open(state_path(&dir)).unwrap();
    assert!(store.launches().is_empty());
    assert!(store.locks().is_empty());
    assert!(store.fuses().is_empty());
    assert!(!store.is_dirty());
}

#[test]
fn opens_empty_when_file_is_malformed_instead_of_failing() {
    let dir = tempdir().unwrap();
    let path = state_path(&dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    let store = DocumentStore::open(&path).unwrap();
    assert!(store.launches().is_empty());
}

#[test]
fn upsert_launch_inserts_then_updates() {
    let dir = tempdir().unwrap();
    let mut store = DocumentStore::open(state_path(&dir)).unwrap();

    store.upsert_launch(LaunchRecord::new("s1", "claude-code", 0, "/tmp", Some(42)));
    assert_eq!(store.launches().len(), 1);
    assert!(store.is_dirty());

    let mut updated = store.get_launch("s1").unwrap().clone();
    updated.mark_stopped(1_000);
    store.upsert_launch(updated);

    assert_eq!(store.launches().len(), 1);
    assert_eq!(store.get_launch("s1").unwrap().stopped_at, Some(1_000));
}

#[test]
fn remove_launch_reports_whether_anything_was_removed() {
    let dir = tempdir().unwrap();
    let mut store = DocumentStore::open(state_path(&dir)).unwrap();
    store.upsert_launch(LaunchRecord::new("s1", "claude-code", 0, "/tmp", None));

    assert!(store.remove_launch("s1"));
    assert!(!store.remove_launch("s1"));
    assert!(store.launches().is_empty());
}

#[test]
fn lock_and_fuse_upsert_remove_round_trip() {
    let dir = tempdir().unwrap();
    let mut store = DocumentStore::open(state_path(&dir)).unwrap();

    store.upsert_lock(Lock::auto("/repo", "s1", 0));
    assert!(store.get_lock("/repo").unwrap().is_held_by_session("s1"));
    assert!(store.remove_lock("/repo"));
    assert!(store.get_lock("/repo").is_none());

    store.upsert_fuse(FuseTimer::new(
        "/repo",
        "repo-cluster",
        "main",
        "s1",
        0,
        5_000,
        None,
        None,
    ));
    assert!(store.get_fuse("/repo").is_some());
    assert!(store.remove_fuse("/repo"));
    assert!(store.get_fuse("/repo").is_none());
}

#[test]
fn persist_then_reopen_preserves_launches_locks_and_fuses() {
    let dir = tempdir().unwrap();
    let path = state_path(&dir);

    {
        let mut store = DocumentStore::open(&path).unwrap();
        store.upsert_launch(LaunchRecord::new("s1", "claude-code", 0, "/tmp", Some(7)));
        store.upsert_lock(Lock::auto("/tmp", "s1", 0));
        store.upsert_fuse(FuseTimer::new(
            "/tmp", "tmp-cluster", "main", "s1", 0, 5_000, None, None,
        ));
        store.persist().unwrap();
        assert!(!store.is_dirty());
    }

    let reopened = DocumentStore::open(&path).unwrap();
    assert_eq!(reopened.launches().len(), 1);
    assert_eq!(reopened.locks().len(), 1);
    assert_eq!(reopened.fuses().len(), 1);
    assert_eq!(reopened.get_launch("s1").unwrap().pid, Some(7));
}

#[test]
fn flush_if_due_only_flushes_after_debounce_window_elapses() {
    let dir = tempdir().unwrap();
    let path = state_path(&dir);
    let mut store = DocumentStore::open(&path).unwrap();

    store.upsert_launch(LaunchRecord::new("s1", "claude-code", 0, "/tmp", None));
    assert!(!store.flush_if_due(Duration::from_secs(3_600)));
    assert!(store.is_dirty());
    assert!(!path.exists());

    assert!(store.flush_if_due(Duration::from_millis(0)));
    assert!(!store.is_dirty());
    assert!(path.exists());
}

#[test]
fn flush_if_due_is_a_no_op_when_not_dirty() {
    let dir = tempdir().unwrap();
    let mut store = DocumentStore::open(state_path(&dir)).unwrap();
    assert!(!store.flush_if_due(Duration::from_millis(0)));
}

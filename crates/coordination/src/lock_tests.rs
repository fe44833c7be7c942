use super::*;
use agentctl_core::FakeClock;
use std::path::PathBuf;
use tempfile::tempdir;

fn store() -> DocumentStore {
    let dir = tempdir().unwrap();
    DocumentStore::open(dir.path().join("state.json")).unwrap()
}

#[test]
fn check_returns_none_for_unlocked_directory() {
    let store = store();
    assert!(LockManager::check(&store, &PathBuf::from("/repo")).is_none());
}

#[test]
fn auto_lock_then_conflicting_session_is_rejected() {
    let mut store = store();
    let clock = FakeClock::at_ms(1_000);

    LockManager::auto_lock(&mut store, &PathBuf::from("/repo"), "s1", &clock).unwrap();
    let err = LockManager::auto_lock(&mut store, &PathBuf::from("/repo"), "s2", &clock).unwrap_err();
    assert_eq!(
        err,
        LockError::LockConflict {
            directory: "/repo".to_string()
        }
    );
}

#[test]
fn auto_lock_is_idempotent_for_the_same_session() {
    let mut store = store();
    let clock = FakeClock::at_ms(1_000);

    LockManager::auto_lock(&mut store, &PathBuf::from("/repo"), "s1", &clock).unwrap();
    LockManager::auto_lock(&mut store, &PathBuf::from("/repo"), "s1", &clock).unwrap();
    assert_eq!(store.locks().len(), 1);
}

#[test]
fn auto_unlock_removes_all_locks_for_session_and_reports_count() {
    let mut store = store();
    let clock = FakeClock::at_ms(1_000);

    LockManager::auto_lock(&mut store, &PathBuf::from("/a"), "s1", &clock).unwrap();
    LockManager::auto_lock(&mut store, &PathBuf::from("/b"), "s1", &clock).unwrap();
    LockManager::auto_lock(&mut store, &PathBuf::from("/c"), "s2", &clock).unwrap();

    assert_eq!(LockManager::auto_unlock(&mut store, "s1"), 2);
    assert_eq!(LockManager::auto_unlock(&mut store, "s1"), 0);
    assert_eq!(store.locks().len(), 1);
}

#[test]
fn manual_lock_conflicts_with_any_existing_lock() {
    let mut store = store();
    let clock = FakeClock::at_ms(1_000);

    LockManager::manual_lock(&mut store, &PathBuf::from("/repo"), None, None, &clock).unwrap();
    let err =
        LockManager::manual_lock(&mut store, &PathBuf::from("/repo"), None, None, &clock)
            .unwrap_err();
    assert_eq!(
        err,
        LockError::LockConflict {
            directory: "/repo".to_string()
        }
    );
}

#[test]
fn manual_unlock_is_a_noop_on_auto_lock() {
    let mut store = store();
    let clock = FakeClock::at_ms(1_000);

    LockManager::auto_lock(&mut store, &PathBuf::from("/repo"), "s1", &clock).unwrap();
    LockManager::manual_unlock(&mut store, &PathBuf::from("/repo"));
    assert!(store.get_lock("/repo").is_some());
}

#[test]
fn manual_unlock_is_idempotent() {
    let mut store = store();
    let clock = FakeClock::at_ms(1_000);

    LockManager::manual_lock(&mut store, &PathBuf::from("/repo"), None, None, &clock).unwrap();
    LockManager::manual_unlock(&mut store, &PathBuf::from("/repo"));
    LockManager::manual_unlock(&mut store, &PathBuf::from("/repo"));
    assert!(store.get_lock("/repo").is_none());
}

#[test]
fn update_auto_lock_session_id_rewrites_matching_locks_only() {
    let mut store = store();
    let clock = FakeClock::at_ms(1_000);

    LockManager::auto_lock(&mut store, &PathBuf::from("/a"), "pending-123", &clock).unwrap();
    LockManager::auto_lock(&mut store, &PathBuf::from("/b"), "s2", &clock).unwrap();

    LockManager::update_auto_lock_session_id(&mut store, "pending-123", "stable-uuid");

    assert!(store
        .get_lock("/a")
        .unwrap()
        .is_held_by_session("stable-uuid"));
    assert!(store.get_lock("/b").unwrap().is_held_by_session("s2"));
}

#[test]
fn list_all_returns_a_snapshot() {
    let mut store = store();
    let clock = FakeClock::at_ms(1_000);
    LockManager::auto_lock(&mut store, &PathBuf::from("/repo"), "s1", &clock).unwrap();

    let snapshot = LockManager::list_all(&store);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].directory, "/repo");
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock manager: a thin wrapper over `DocumentStore`'s locks map (spec
//! §4.2). No heartbeat, no staleness — an auto-lock lives exactly as long
//! as the session that holds it, and a manual lock lives until explicitly
//! released.

use agentctl_core::{Clock, Lock, LockKind};
use agentctl_storage::DocumentStore;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("{directory} is already locked")]
    LockConflict { directory: String },
}

/// Operates on a `DocumentStore` it does not own; callers construct one per
/// call against the daemon's single `DocumentStore` instance (spec's
/// single-writer model — see `agentctl-daemon::state`).
pub struct LockManager;

impl LockManager {
    pub fn check(store: &DocumentStore, directory: &Path) -> Option<Lock> {
        let key = agentctl_core::paths::canonical_dir(directory);
        store.get_lock(&key.to_string_lossy()).cloned()
    }

    /// Idempotent for the same session: re-locking a directory the caller
    /// already auto-holds succeeds rather than conflicting.
    pub fn auto_lock(
        store: &mut DocumentStore,
        directory: &Path,
        session_id: &str,
        clock: &impl Clock,
    ) -> Result<(), LockError> {
        let key = agentctl_core::paths::canonical_dir(directory)
            .to_string_lossy()
            .into_owned();

        if let Some(existing) = store.get_lock(&key) {
            if existing.is_held_by_session(session_id) {
                return Ok(());
            }
            return Err(LockError::LockConflict { directory: key });
        }

        store.upsert_lock(Lock::auto(key, session_id, clock.now_ms()));
        Ok(())
    }

    /// Removes every auto-lock held by `session_id`. Returns the count
    /// removed.
    pub fn auto_unlock(store: &mut DocumentStore, session_id: &str) -> usize {
        let directories: Vec<String> = store
            .locks()
            .iter()
            .filter(|l| l.is_held_by_session(session_id))
            .map(|l| l.directory.clone())
            .collect();
        for dir in &directories {
            store.remove_lock(dir);
        }
        directories.len()
    }

    pub fn manual_lock(
        store: &mut DocumentStore,
        directory: &Path,
        locked_by: Option<String>,
        reason: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), LockError> {
        let key = agentctl_core::paths::canonical_dir(directory)
            .to_string_lossy()
            .into_owned();

        if store.get_lock(&key).is_some() {
            return Err(LockError::LockConflict { directory: key });
        }

        store.upsert_lock(Lock::manual(key, locked_by, reason, clock.now_ms()));
        Ok(())
    }

    /// No-ops silently if the lock at `directory` is absent or auto.
    pub fn manual_unlock(store: &mut DocumentStore, directory: &Path) {
        let key = agentctl_core::paths::canonical_dir(directory)
            .to_string_lossy()
            .into_owned();
        if let Some(lock) = store.get_lock(&key) {
            if lock.kind == LockKind::Manual {
                store.remove_lock(&key);
            }
        }
    }

    /// Rewrites the `session_id` of every auto-lock held under `old_id` to
    /// `new_id`, called during pending→stable promotion (spec §4.4.1).
    pub fn update_auto_lock_session_id(store: &mut DocumentStore, old_id: &str, new_id: &str) {
        let directories: Vec<String> = store
            .locks()
            .iter()
            .filter(|l| l.is_held_by_session(old_id))
            .map(|l| l.directory.clone())
            .collect();
        for dir in directories {
            if let Some(mut lock) = store.get_lock(&dir).cloned() {
                lock.session_id = Some(new_id.to_string());
                store.upsert_lock(lock);
            }
        }
    }

    pub fn list_all(store: &DocumentStore) -> Vec<Lock> {
        store.locks().to_vec()
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;

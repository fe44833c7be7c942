// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DocumentStore`: the only component that touches disk for daemon state
//! (spec §4.1). Single-threaded cooperative model — every mutator takes
//! `&mut self`, so callers get atomicity for free by running on the
//! daemon's one event loop rather than from a shared `Arc<Mutex<_>>`.

use crate::document::PersistentDocument;
use agentctl_core::{FuseTimer, LaunchRecord, Lock};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct DocumentStore {
    path: PathBuf,
    doc: PersistentDocument,
    dirty: bool,
    dirty_since: Option<Instant>,
}

impl DocumentStore {
    /// Load `path` if it exists; a malformed document is logged and
    /// replaced with an empty one (spec §4.1) rather than failing boot.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let doc = if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str::<PersistentDocument>(&raw) {
                    Ok(doc) => doc,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "state.json is malformed, starting from an empty document");
                        PersistentDocument::empty()
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read state.json, starting from an empty document");
                    PersistentDocument::empty()
                }
            }
        } else {
            PersistentDocument::empty()
        };

        Ok(Self {
            path,
            doc,
            dirty: false,
            dirty_since: None,
        })
    }

    fn touch(&mut self) {
        self.dirty = true;
        if self.dirty_since.is_none() {
            self.dirty_since = Some(Instant::now());
        }
    }

    // --- launches ---

    pub fn launches(&self) -> &[LaunchRecord] {
        &self.doc.launches
    }

    pub fn get_launch(&self, id: &str) -> Option<&LaunchRecord> {
        self.doc.launches.iter().find(|l| l.id == id)
    }

    pub fn upsert_launch(&mut self, record: LaunchRecord) {
        if let Some(existing) = self.doc.launches.iter_mut().find(|l| l.id == record.id) {
            *existing = record;
        } else {
            self.doc.launches.push(record);
        }
        self.touch();
    }

    /// Returns true if a record was removed.
    pub fn remove_launch(&mut self, id: &str) -> bool {
        let before = self.doc.launches.len();
        self.doc.launches.retain(|l| l.id != id);
        let removed = self.doc.launches.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    // --- locks ---

    pub fn locks(&self) -> &[Lock] {
        &self.doc.locks
    }

    pub fn get_lock(&self, directory: &str) -> Option<&Lock> {
        self.doc.locks.iter().find(|l| l.directory == directory)
    }

    pub fn upsert_lock(&mut self, lock: Lock) {
        if let Some(existing) = self
            .doc
            .locks
            .iter_mut()
            .find(|l| l.directory == lock.directory)
        {
            *existing = lock;
        } else {
            self.doc.locks.push(lock);
        }
        self.touch();
    }

    pub fn remove_lock(&mut self, directory: &str) -> bool {
        let before = self.doc.locks.len();
        self.doc.locks.retain(|l| l.directory != directory);
        let removed = self.doc.locks.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    // --- fuses ---

    pub fn fuses(&self) -> &[FuseTimer] {
        &self.doc.fuses
    }

    pub fn get_fuse(&self, directory: &str) -> Option<&FuseTimer> {
        self.doc.fuses.iter().find(|f| f.directory == directory)
    }

    pub fn upsert_fuse(&mut self, fuse: FuseTimer) {
        if let Some(existing) = self
            .doc
            .fuses
            .iter_mut()
            .find(|f| f.directory == fuse.directory)
        {
            *existing = fuse;
        } else {
            self.doc.fuses.push(fuse);
        }
        self.touch();
    }

    pub fn remove_fuse(&mut self, directory: &str) -> bool {
        let before = self.doc.fuses.len();
        self.doc.fuses.retain(|f| f.directory != directory);
        let removed = self.doc.fuses.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    // --- flushing ---

    /// Flush synchronously, regardless of the debounce window. Write to a
    /// sibling temp file and rename into place so a crash mid-write never
    /// leaves a truncated `state.json` behind.
    pub fn persist(&mut self) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&self.doc)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        self.dirty = false;
        self.dirty_since = None;
        Ok(())
    }

    /// Flush if dirty and the debounce window has elapsed. Called from the
    /// daemon's periodic tick. Flush failures are logged, not propagated
    /// (spec §4.1, §7) — the caller keeps running with unsaved mutations
    /// and will retry on the next tick.
    pub fn flush_if_due(&mut self, debounce: Duration) -> bool {
        if !self.dirty {
            return false;
        }
        let due = match self.dirty_since {
            Some(since) => since.elapsed() >= debounce,
            None => true,
        };
        if !due {
            return false;
        }
        if let Err(e) = self.persist() {
            tracing::error!(error = %e, "failed to flush state.json, will retry on next mutation");
            return false;
        }
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Lock` data model (spec §3). Keyed by canonicalized absolute
//! directory path; at most one per directory.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    /// Created implicitly by `session.launch`; released on session
    /// disappearance, dead pid, or explicit stop.
    Auto,
    /// Created/removed only by explicit RPC; unaffected by session
    /// lifecycle.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lock {
    pub directory: String,
    #[serde(rename = "type")]
    pub kind: LockKind,
    /// Set for auto-locks only.
    pub session_id: Option<String>,
    /// Set for manual locks only.
    pub locked_by: Option<String>,
    pub reason: Option<String>,
    pub locked_at: u64,
}

impl Lock {
    pub fn auto(directory: impl Into<String>, session_id: impl Into<String>, locked_at: u64) -> Self {
        Self {
            directory: directory.into(),
            kind: LockKind::Auto,
            session_id: Some(session_id.into()),
            locked_by: None,
            reason: None,
            locked_at,
        }
    }

    pub fn manual(
        directory: impl Into<String>,
        locked_by: Option<String>,
        reason: Option<String>,
        locked_at: u64,
    ) -> Self {
        Self {
            directory: directory.into(),
            kind: LockKind::Manual,
            session_id: None,
            locked_by,
            reason,
            locked_at,
        }
    }

    pub fn is_auto(&self) -> bool {
        self.kind == LockKind::Auto
    }

    pub fn is_held_by_session(&self, session_id: &str) -> bool {
        self.is_auto() && self.session_id.as_deref() == Some(session_id)
    }
}

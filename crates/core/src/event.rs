// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process events observed by the metrics surface and by fuse actions
//! of kind `Event`. Modeled on the teacher's `Effect::Emit(Event)` pattern,
//! trimmed to the handful of lifecycle tags this daemon actually emits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    SessionLaunched { id: String, adapter: String },
    SessionPromoted { pending_id: String, stable_id: String },
    SessionStopped { id: String },
    LockAcquired { directory: String },
    LockReleased { directory: String },
    FuseSet { directory: String },
    FuseExpired { directory: String },
    FuseCancelled { directory: String },
}

impl Event {
    /// `"category:action"`, used for metrics label grouping.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionLaunched { .. } => "session:launched",
            Event::SessionPromoted { .. } => "session:promoted",
            Event::SessionStopped { .. } => "session:stopped",
            Event::LockAcquired { .. } => "lock:acquired",
            Event::LockReleased { .. } => "lock:released",
            Event::FuseSet { .. } => "fuse:set",
            Event::FuseExpired { .. } => "fuse:expired",
            Event::FuseCancelled { .. } => "fuse:cancelled",
        }
    }
}

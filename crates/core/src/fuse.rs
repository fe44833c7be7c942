// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `FuseTimer` data model (spec §3). A persistent single-shot timer
//! keyed by directory, used to defer teardown of heavy per-directory
//! infrastructure (e.g. a dev Kubernetes cluster) until a session has been
//! gone long enough that nobody is coming back for it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ten minutes, the default TTL named in spec §9's Open Questions.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// What happens when a fuse fires. `None` means expiration has no side
/// effect beyond removal and the `fuse.expired` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FuseAction {
    /// Run this script with the fuse's directory as cwd.
    Script { path: String },
    /// POST a small JSON body to this URL.
    Webhook { url: String },
    /// Emit a named in-process event on the daemon's event bus.
    Event { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuseTimer {
    pub directory: String,
    pub cluster_name: String,
    pub branch: String,
    pub expires_at: u64,
    pub session_id: String,
    pub ttl_ms: u64,
    pub on_expire: Option<FuseAction>,
    pub label: Option<String>,
}

impl FuseTimer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        directory: impl Into<String>,
        cluster_name: impl Into<String>,
        branch: impl Into<String>,
        session_id: impl Into<String>,
        now_ms: u64,
        ttl_ms: u64,
        on_expire: Option<FuseAction>,
        label: Option<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            cluster_name: cluster_name.into(),
            branch: branch.into(),
            expires_at: now_ms + ttl_ms,
            session_id: session_id.into(),
            ttl_ms,
            on_expire,
            label,
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at <= now_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    pub fn extend(&mut self, now_ms: u64, ttl_ms: u64) {
        self.ttl_ms = ttl_ms;
        self.expires_at = now_ms + ttl_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_fuse_expires_at_now_plus_ttl() {
        let fuse = FuseTimer::new("/repo", "repo-cluster", "main", "s1", 1_000, 5_000, None, None);
        assert_eq!(fuse.expires_at, 6_000);
    }

    #[test]
    fn is_expired_at_or_after_expiry() {
        let fuse = FuseTimer::new("/repo", "repo-cluster", "main", "s1", 0, 1_000, None, None);
        assert!(!fuse.is_expired(999));
        assert!(fuse.is_expired(1_000));
        assert!(fuse.is_expired(1_500));
    }

    #[test]
    fn extend_resets_expiry_from_now() {
        let mut fuse = FuseTimer::new("/repo", "repo-cluster", "main", "s1", 0, 1_000, None, None);
        fuse.extend(2_000, 500);
        assert_eq!(fuse.expires_at, 2_500);
        assert_eq!(fuse.ttl_ms, 500);
    }

    #[test]
    fn remaining_ms_never_underflows() {
        let fuse = FuseTimer::new("/repo", "repo-cluster", "main", "s1", 0, 1_000, None, None);
        assert_eq!(fuse.remaining_ms(5_000), 0);
    }
}

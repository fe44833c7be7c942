// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session data model: what the daemon persists about sessions it
//! launched (`LaunchRecord`), what an adapter's on-disk scan reports
//! (`DiscoveredSession`), and the merge of the two returned to RPC callers
//! (`EnrichedSession`).

use serde::{Deserialize, Serialize};

/// Daemon's view of whether a session is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Stopped,
}

/// Status reported by an adapter's on-disk scan. Adapters can additionally
/// report `Idle`, a state the daemon itself never assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveredStatus {
    Running,
    Stopped,
    Idle,
}

/// Token usage reported by an adapter, when it tracks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(rename = "in")]
    pub input: u64,
    #[serde(rename = "out")]
    pub output: u64,
}

/// What the daemon itself persists about a session it launched.
///
/// Invariants (enforced by `agentctl-tracker`, not by this type): at most
/// one record per id; at most one record per pid with `status == Running`;
/// `status == Stopped` implies `stopped_at.is_some()`; a pending id implies
/// `pid.is_some()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub id: String,
    pub adapter: String,
    pub status: SessionStatus,
    pub started_at: u64,
    pub stopped_at: Option<u64>,
    pub pid: Option<u32>,
    pub wrapper_pid: Option<u32>,
    /// Opaque OS-reported process start marker, compared only for equality
    /// (see `agentctl-tracker::pid` for the 5-second tolerance rule).
    pub process_start_time: Option<u64>,
    pub cwd: String,
    pub model: Option<String>,
    /// Truncated to 200 chars by `LaunchRecord::new`.
    pub prompt: Option<String>,
    pub spec: Option<String>,
    pub group: Option<String>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

const MAX_PROMPT_LEN: usize = 200;

impl LaunchRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        adapter: impl Into<String>,
        started_at: u64,
        cwd: impl Into<String>,
        pid: Option<u32>,
    ) -> Self {
        Self {
            id: id.into(),
            adapter: adapter.into(),
            status: SessionStatus::Running,
            started_at,
            stopped_at: None,
            pid,
            wrapper_pid: None,
            process_start_time: None,
            cwd: cwd.into(),
            model: None,
            prompt: None,
            spec: None,
            group: None,
            meta: serde_json::Value::Null,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.prompt = Some(truncate_prompt(&prompt));
        self
    }

    pub fn is_pending(&self) -> bool {
        crate::id::is_pending(&self.id)
    }

    pub fn mark_stopped(&mut self, stopped_at: u64) {
        self.status = SessionStatus::Stopped;
        self.stopped_at = Some(stopped_at);
    }
}

/// Truncate to the 200-character prompt cap from the data model.
pub fn truncate_prompt(prompt: &str) -> String {
    if prompt.chars().count() <= MAX_PROMPT_LEN {
        prompt.to_string()
    } else {
        prompt.chars().take(MAX_PROMPT_LEN).collect()
    }
}

/// What an adapter's on-disk scan returns. Ephemeral: never persisted by
/// the core, only merged into an `EnrichedSession` for the duration of one
/// `session.list` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredSession {
    pub id: String,
    pub adapter: String,
    pub status: DiscoveredStatus,
    pub cwd: Option<String>,
    pub model: Option<String>,
    pub started_at: u64,
    pub stopped_at: Option<u64>,
    pub pid: Option<u32>,
    pub prompt: Option<String>,
    pub tokens: Option<TokenUsage>,
    pub cost: Option<f64>,
    #[serde(default)]
    pub native_metadata: serde_json::Value,
}

/// The merge of a `DiscoveredSession` with its matching `LaunchRecord`,
/// returned by `session.list`/`session.status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSession {
    pub id: String,
    pub adapter: String,
    pub status: DiscoveredStatus,
    pub cwd: Option<String>,
    pub model: Option<String>,
    pub started_at: u64,
    pub stopped_at: Option<u64>,
    pub pid: Option<u32>,
    pub prompt: Option<String>,
    pub tokens: Option<TokenUsage>,
    pub cost: Option<f64>,
    pub spec: Option<String>,
    pub group: Option<String>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl EnrichedSession {
    /// Merge a discovered session with its launch record: discovered fields
    /// win, launch-record fields fill gaps (prompt when empty, group, spec,
    /// meta when the discovered meta is empty).
    pub fn merge(discovered: &DiscoveredSession, launch: Option<&LaunchRecord>) -> Self {
        let launch_meta_is_present = launch.is_some_and(|l| !l.meta.is_null());
        Self {
            id: discovered.id.clone(),
            adapter: discovered.adapter.clone(),
            status: discovered.status,
            cwd: discovered
                .cwd
                .clone()
                .or_else(|| launch.map(|l| l.cwd.clone())),
            model: discovered
                .model
                .clone()
                .or_else(|| launch.and_then(|l| l.model.clone())),
            started_at: discovered.started_at,
            stopped_at: discovered.stopped_at,
            pid: discovered.pid.or_else(|| launch.and_then(|l| l.pid)),
            prompt: discovered
                .prompt
                .clone()
                .or_else(|| launch.and_then(|l| l.prompt.clone())),
            tokens: discovered.tokens,
            cost: discovered.cost,
            spec: launch.and_then(|l| l.spec.clone()),
            group: launch.and_then(|l| l.group.clone()),
            meta: if launch_meta_is_present {
                launch.map(|l| l.meta.clone()).unwrap_or(serde_json::Value::Null)
            } else {
                serde_json::Value::Null
            },
        }
    }

    /// Synthesize a visible session directly from a launch record, for a
    /// recently-launched session an adapter hasn't observed yet (grace
    /// period) or for a ghost pending entry.
    pub fn from_launch_record(launch: &LaunchRecord) -> Self {
        Self {
            id: launch.id.clone(),
            adapter: launch.adapter.clone(),
            status: DiscoveredStatus::Running,
            cwd: Some(launch.cwd.clone()),
            model: launch.model.clone(),
            started_at: launch.started_at,
            stopped_at: None,
            pid: launch.pid,
            prompt: launch.prompt.clone(),
            tokens: None,
            cost: None,
            spec: launch.spec.clone(),
            group: launch.group.clone(),
            meta: launch.meta.clone(),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

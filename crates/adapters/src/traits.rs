// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The adapter contract the core consumes (spec §6.2). Every registered
//! coding-agent CLI is wrapped behind this trait; adapters are forbidden
//! from mutating daemon state directly, so nothing here touches
//! `DocumentStore` or the lock/fuse managers.

use agentctl_core::{DiscoveredSession, LaunchRecord};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("failed to spawn session: {0}")]
    SpawnFailed(String),
    #[error("adapter call timed out")]
    Timeout,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed transcript: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct LaunchOpts {
    pub prompt: String,
    pub cwd: PathBuf,
    pub spec: Option<String>,
    pub model: Option<String>,
    pub env: Vec<(String, String)>,
    pub adapter_opts: serde_json::Value,
    pub group: Option<String>,
}

/// Everything the core needs from a coding-agent CLI. Implementations are
/// cheap to construct and shared behind `Arc` in the `Registry`.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Scan on-disk state for this tool's sessions. Cheap; may be called
    /// every few seconds by the tracker.
    async fn discover(&self) -> Result<Vec<DiscoveredSession>, AdapterError>;

    async fn is_alive(&self, id: &str) -> Result<bool, AdapterError>;

    /// May return a `pending-<pid>` id when the tool assigns its own
    /// session id asynchronously, after the process has already started.
    async fn launch(&self, opts: LaunchOpts) -> Result<LaunchRecord, AdapterError>;

    async fn stop(&self, id: &str, force: bool) -> Result<(), AdapterError>;

    async fn resume(&self, id: &str, message: &str) -> Result<(), AdapterError>;

    async fn peek(&self, id: &str, lines: u32) -> Result<String, AdapterError>;
}

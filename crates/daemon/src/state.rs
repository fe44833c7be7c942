// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Everything the event loop owns: the document store, the armed fuse
//! timers, the adapter registry, and the ambient counters. One instance
//! per process; every mutation happens from the single task that owns it
//! (spec §5's single-writer model), so nothing here is behind a mutex.

use crate::config::Config;
use crate::metrics::Metrics;
use agentctl_adapters::{ClaudeCodeAdapter, Registry};
use agentctl_core::{Clock, Event, SystemClock};
use agentctl_coordination::FuseEngine;
use agentctl_storage::{DocumentStore, StorageError};
use std::collections::HashMap;
use std::fs::File;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::mpsc;

pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(5);
pub const FLUSH_DEBOUNCE: Duration = Duration::from_secs(1);
pub const DEAD_LAUNCH_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
pub const PENDING_RESOLVE_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to bind socket at {0}: {1}")]
    Bind(std::path::PathBuf, std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct DaemonState<C: Clock = SystemClock> {
    pub config: Config,
    pub store: DocumentStore,
    pub fuse_engine: FuseEngine,
    pub fired_rx: mpsc::UnboundedReceiver<String>,
    pub registry: Registry,
    pub metrics: Metrics,
    pub clock: C,
    pub listener: UnixListener,
    /// Exclusively `fs2`-locked pid file handed in from `singleton::enforce`;
    /// held for the process's lifetime so a racing second daemon can't
    /// acquire it. Dropped (releasing the lock) during `shutdown`.
    pub pid_lock: File,
    pub env_snapshot: HashMap<String, String>,
    pub adapter_timeout: Duration,
    pub start_time: Instant,
    pub shutdown_requested: bool,
}

impl DaemonState<SystemClock> {
    /// Loads the document, re-arms fuses, builds the adapter registry, and
    /// binds the socket last (the singleton sequence in `crate::singleton`
    /// has already ensured no prior daemon holds it). `pid_lock` is the
    /// already-locked pid file from `singleton::enforce`; this writes this
    /// process's own pid into it once the socket is bound.
    pub async fn boot(config: Config, pid_lock: File) -> Result<Self, StartupError> {
        let mut store = DocumentStore::open(&config.state_path)?;
        let clock = SystemClock;

        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let mut fuse_engine = FuseEngine::new(fired_tx);
        fuse_engine.resume(&store, &clock);

        let mut registry = Registry::new();
        registry.register(std::sync::Arc::new(ClaudeCodeAdapter::new(
            config.transcripts_dir.clone(),
        )));

        if let Some(parent) = config.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if config.socket_path.exists() {
            std::fs::remove_file(&config.socket_path)?;
        }
        let listener = UnixListener::bind(&config.socket_path)
            .map_err(|e| StartupError::Bind(config.socket_path.clone(), e))?;
        set_owner_only(&config.socket_path);
        crate::singleton::write_pid(&pid_lock)?;

        let adapter_timeout = std::env::var("AGENTCTL_ADAPTER_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_ADAPTER_TIMEOUT);

        let env_snapshot: HashMap<String, String> = std::env::vars().collect();
        if let Ok(json) = serde_json::to_string_pretty(&env_snapshot) {
            let _ = std::fs::write(&config.env_path, json);
        }

        Ok(Self {
            config,
            store,
            fuse_engine,
            fired_rx,
            registry,
            metrics: Metrics::new(),
            clock,
            listener,
            pid_lock,
            env_snapshot,
            adapter_timeout,
            start_time: Instant::now(),
            shutdown_requested: false,
        })
    }
}

impl<C: Clock> DaemonState<C> {
    pub fn record_event(&self, event: Event) {
        self.metrics.record(&event);
        tracing::info!(name = event.name(), "{:?}", event);
    }

    pub fn flush_if_due(&mut self) {
        self.store.flush_if_due(FLUSH_DEBOUNCE);
    }

    /// Graceful shutdown sequence (spec §5): abort timers, flush state
    /// synchronously, remove the pid and socket files. Releasing
    /// `pid_lock`'s advisory lock happens implicitly when this struct (and
    /// its pid file handle) is dropped after this call returns.
    pub fn shutdown(&mut self) {
        let _ = fs2::FileExt::unlock(&self.pid_lock);
        self.fuse_engine.shutdown();
        if let Err(e) = self.store.persist() {
            tracing::error!(error = %e, "failed to flush state.json during shutdown");
        }
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                tracing::warn!(error = %e, "failed to remove socket file during shutdown");
            }
        }
        if self.config.pid_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.pid_path) {
                tracing::warn!(error = %e, "failed to remove pid file during shutdown");
            }
        }
    }
}

#[cfg(test)]
impl<C: Clock> DaemonState<C> {
    /// Builds a fully wired state against a real temp-dir socket and
    /// store, with an empty registry the caller populates itself (e.g.
    /// with `agentctl_adapters::FakeAdapter`).
    pub fn for_test(config: Config, clock: C) -> Self {
        let store = DocumentStore::open(&config.state_path).expect("open test store");
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let mut fuse_engine = FuseEngine::new(fired_tx);
        fuse_engine.resume(&store, &clock);
        let listener = UnixListener::bind(&config.socket_path).expect("bind test socket");
        let pid_lock = File::create(&config.pid_path).expect("create test pid file");

        Self {
            config,
            store,
            fuse_engine,
            fired_rx,
            registry: Registry::new(),
            metrics: Metrics::new(),
            clock,
            listener,
            pid_lock,
            env_snapshot: HashMap::new(),
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
            start_time: Instant::now(),
            shutdown_requested: false,
        }
    }
}

#[cfg(unix)]
fn set_owner_only(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = std::fs::metadata(path) {
        let mut perms = metadata.permissions();
        perms.set_mode(0o600);
        let _ = std::fs::set_permissions(path, perms);
    }
}

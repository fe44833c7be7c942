// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fuse engine: one-shot, persistent, directory-keyed timers that defer
//! teardown of heavy per-directory infrastructure (spec §4.3). Armed
//! timers live in this process as `tokio::task` sleeps that, on elapse,
//! report back over a channel rather than mutating state themselves —
//! the daemon's single event loop is the only place a `DocumentStore`
//! mutation happens.

use agentctl_core::{Clock, FuseAction, FuseTimer, DEFAULT_TTL};
use agentctl_storage::DocumentStore;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct SetFuseRequest {
    pub directory: String,
    pub cluster_name: String,
    pub branch: String,
    pub session_id: String,
    pub ttl_ms: Option<u64>,
    pub on_expire: Option<FuseAction>,
    pub label: Option<String>,
}

/// Holds the in-memory timer handles; `DocumentStore` holds the
/// `FuseTimer` records that make them durable across a restart.
pub struct FuseEngine {
    armed: HashMap<String, JoinHandle<()>>,
    fired_tx: mpsc::UnboundedSender<String>,
}

impl FuseEngine {
    /// `fired_tx` is the daemon event loop's channel; when a timer elapses
    /// its directory key is sent there so the loop can call `fire`.
    pub fn new(fired_tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            armed: HashMap::new(),
            fired_tx,
        }
    }

    fn arm(&mut self, key: String, remaining: Duration) {
        let tx = self.fired_tx.clone();
        let notify_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let _ = tx.send(notify_key);
        });
        if let Some(previous) = self.armed.insert(key, handle) {
            previous.abort();
        }
    }

    /// Cancels any existing fuse for the directory, records a new
    /// `FuseTimer`, and arms its timer.
    pub fn set_fuse(
        &mut self,
        store: &mut DocumentStore,
        req: SetFuseRequest,
        clock: &impl Clock,
    ) {
        let key = agentctl_core::paths::canonical_dir(Path::new(&req.directory))
            .to_string_lossy()
            .into_owned();
        self.cancel_fuse(store, Path::new(&key));

        let ttl_ms = req.ttl_ms.unwrap_or(DEFAULT_TTL.as_millis() as u64);
        let fuse = FuseTimer::new(
            key.clone(),
            req.cluster_name,
            req.branch,
            req.session_id,
            clock.now_ms(),
            ttl_ms,
            req.on_expire,
            req.label,
        );
        store.upsert_fuse(fuse);
        self.arm(key, Duration::from_millis(ttl_ms));
    }

    /// Resets `expiresAt` from now and re-arms. Returns `false` if no fuse
    /// exists for `directory`.
    pub fn extend_fuse(
        &mut self,
        store: &mut DocumentStore,
        directory: &Path,
        ttl_ms: Option<u64>,
        clock: &impl Clock,
    ) -> bool {
        let key = agentctl_core::paths::canonical_dir(directory)
            .to_string_lossy()
            .into_owned();

        let Some(mut fuse) = store.get_fuse(&key).cloned() else {
            return false;
        };
        let ttl_ms = ttl_ms.unwrap_or(DEFAULT_TTL.as_millis() as u64);
        fuse.extend(clock.now_ms(), ttl_ms);
        store.upsert_fuse(fuse);
        self.arm(key, Duration::from_millis(ttl_ms));
        true
    }

    /// Clears the timer and removes the `FuseTimer`. Idempotent.
    pub fn cancel_fuse(&mut self, store: &mut DocumentStore, directory: &Path) {
        let key = agentctl_core::paths::canonical_dir(directory)
            .to_string_lossy()
            .into_owned();
        if let Some(handle) = self.armed.remove(&key) {
            handle.abort();
        }
        store.remove_fuse(&key);
    }

    pub fn list_active(store: &DocumentStore) -> Vec<FuseTimer> {
        store.fuses().to_vec()
    }

    /// Re-arms every persisted fuse at boot. Fuses already past expiry are
    /// reported as fired immediately instead of being armed. Must run
    /// exactly once, from daemon startup.
    pub fn resume(&mut self, store: &DocumentStore, clock: &impl Clock) {
        let now = clock.now_ms();
        for fuse in store.fuses() {
            if fuse.is_expired(now) {
                let _ = self.fired_tx.send(fuse.directory.clone());
            } else {
                self.arm(fuse.directory.clone(), Duration::from_millis(fuse.remaining_ms(now)));
            }
        }
    }

    /// Aborts every armed timer without touching persisted state.
    pub fn shutdown(&mut self) {
        for (_, handle) in self.armed.drain() {
            handle.abort();
        }
    }

    /// Firing semantics for a directory reported over `fired_tx`: remove
    /// the persisted record first (so a crash mid-action can't refire),
    /// then return the configured action for the caller to execute.
    pub fn fire(&mut self, store: &mut DocumentStore, directory: &str) -> Option<FuseAction> {
        self.armed.remove(directory);
        let action = store.get_fuse(directory).and_then(|f| f.on_expire.clone());
        store.remove_fuse(directory);
        action
    }

    /// Executes a fired fuse's action. Failures are logged, never
    /// retried (spec §4.3, §7).
    pub async fn execute_action(action: &FuseAction, directory: &str) {
        match action {
            FuseAction::Script { path } => {
                let path = path.clone();
                let log_path = path.clone();
                let cwd = directory.to_string();
                let outcome = tokio::task::spawn_blocking(move || {
                    std::process::Command::new(&path).current_dir(&cwd).status()
                })
                .await;
                match outcome {
                    Ok(Ok(status)) if !status.success() => {
                        tracing::error!(directory, path = log_path, %status, "fuse script exited non-zero");
                    }
                    Ok(Err(e)) => {
                        tracing::error!(directory, path = log_path, error = %e, "fuse script failed to start");
                    }
                    Err(e) => {
                        tracing::error!(directory, path = log_path, error = %e, "fuse script task panicked");
                    }
                    Ok(Ok(_)) => {}
                }
            }
            FuseAction::Webhook { url } => {
                let url = url.clone();
                let body = serde_json::json!({ "directory": directory });
                let outcome =
                    tokio::task::spawn_blocking(move || ureq::post(&url).send_json(body)).await;
                match outcome {
                    Ok(Err(e)) => {
                        tracing::error!(directory, error = %e, "fuse webhook request failed");
                    }
                    Err(e) => {
                        tracing::error!(directory, error = %e, "fuse webhook task panicked");
                    }
                    Ok(Ok(_)) => {}
                }
            }
            FuseAction::Event { name } => {
                tracing::info!(directory, event = %name, "fuse event action fired");
            }
        }
    }
}

#[cfg(test)]
#[path = "fuse_tests.rs"]
mod tests;

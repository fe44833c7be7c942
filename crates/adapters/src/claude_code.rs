// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference adapter for the `claude` CLI, grounded in `session/tmux.rs`'s
//! shell-out style. Sessions are tracked via one small JSON transcript per
//! session under `transcripts_dir`; a real integration would instead
//! parse the tool's own transcript format, but the contract this exercises
//! is identical either way (spec §6.2, §4.5).

use crate::traits::{Adapter, AdapterError, LaunchOpts};
use agentctl_core::{DiscoveredSession, DiscoveredStatus, LaunchRecord, TokenUsage};
use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NAME: &str = "claude-code";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Transcript {
    id: String,
    pid: u32,
    cwd: String,
    model: Option<String>,
    prompt: Option<String>,
    started_at: u64,
    stopped_at: Option<u64>,
    status: DiscoveredStatus,
    tokens: Option<TokenUsage>,
    cost: Option<f64>,
}

pub struct ClaudeCodeAdapter {
    transcripts_dir: PathBuf,
    binary: String,
}

impl ClaudeCodeAdapter {
    pub fn new(transcripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            transcripts_dir: transcripts_dir.into(),
            binary: "claude".to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn transcript_path(&self, id: &str) -> PathBuf {
        self.transcripts_dir.join(format!("{id}.json"))
    }

    fn log_path(&self, id: &str) -> PathBuf {
        self.transcripts_dir.join(format!("{id}.log"))
    }

    fn read_transcript(&self, id: &str) -> Option<Transcript> {
        let raw = std::fs::read_to_string(self.transcript_path(id)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(id, error = %e, "malformed claude-code transcript, ignoring");
                None
            }
        }
    }

    fn write_transcript(&self, transcript: &Transcript) -> Result<(), AdapterError> {
        std::fs::create_dir_all(&self.transcripts_dir)?;
        let json = serde_json::to_string_pretty(transcript)
            .map_err(|e| AdapterError::Malformed(e.to_string()))?;
        std::fs::write(self.transcript_path(&transcript.id), json)?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

fn is_pid_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}

fn tail_lines(path: &Path, lines: u32) -> std::io::Result<String> {
    let content = std::fs::read_to_string(path)?;
    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(lines as usize);
    Ok(all[start..].join("\n"))
}

fn to_discovered(t: &Transcript) -> DiscoveredSession {
    DiscoveredSession {
        id: t.id.clone(),
        adapter: NAME.to_string(),
        status: t.status,
        cwd: Some(t.cwd.clone()),
        model: t.model.clone(),
        started_at: t.started_at,
        stopped_at: t.stopped_at,
        pid: Some(t.pid),
        prompt: t.prompt.clone(),
        tokens: t.tokens,
        cost: t.cost,
        native_metadata: serde_json::Value::Null,
    }
}

#[async_trait]
impl Adapter for ClaudeCodeAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn discover(&self) -> Result<Vec<DiscoveredSession>, AdapterError> {
        let mut sessions = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.transcripts_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(sessions),
            Err(e) => return Err(AdapterError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(transcript) = self.read_transcript(id) {
                sessions.push(to_discovered(&transcript));
            }
        }
        Ok(sessions)
    }

    async fn is_alive(&self, id: &str) -> Result<bool, AdapterError> {
        match self.read_transcript(id) {
            Some(t) => Ok(t.status != DiscoveredStatus::Stopped && is_pid_alive(t.pid)),
            None => Ok(false),
        }
    }

    async fn launch(&self, opts: LaunchOpts) -> Result<LaunchRecord, AdapterError> {
        std::fs::create_dir_all(&self.transcripts_dir)?;

        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.current_dir(&opts.cwd).arg("-p").arg(&opts.prompt);
        if let Some(model) = &opts.model {
            cmd.arg("--model").arg(model);
        }
        for (key, value) in &opts.env {
            cmd.env(key, value);
        }

        let child = cmd
            .spawn()
            .map_err(|e| AdapterError::SpawnFailed(e.to_string()))?;
        let pid = child
            .id()
            .ok_or_else(|| AdapterError::SpawnFailed("child exited before pid was read".to_string()))?;
        // Intentionally not awaited: the CLI session outlives this call.
        drop(child);

        let id = agentctl_core::id::pending_id(pid);
        let started_at = now_ms();

        std::fs::write(self.log_path(&id), "")?;
        self.write_transcript(&Transcript {
            id: id.clone(),
            pid,
            cwd: opts.cwd.to_string_lossy().into_owned(),
            model: opts.model.clone(),
            prompt: Some(opts.prompt.clone()),
            started_at,
            stopped_at: None,
            status: DiscoveredStatus::Running,
            tokens: None,
            cost: None,
        })?;

        let mut record = LaunchRecord::new(
            id,
            NAME,
            started_at,
            opts.cwd.to_string_lossy().into_owned(),
            Some(pid),
        )
        .with_prompt(opts.prompt);
        record.model = opts.model;
        record.spec = opts.spec;
        record.group = opts.group;
        Ok(record)
    }

    async fn stop(&self, id: &str, force: bool) -> Result<(), AdapterError> {
        let Some(mut transcript) = self.read_transcript(id) else {
            return Err(AdapterError::NotFound(id.to_string()));
        };

        let _ = signal::kill(Pid::from_raw(transcript.pid as i32), Signal::SIGTERM);
        if force {
            tokio::time::sleep(Duration::from_secs(5)).await;
            if is_pid_alive(transcript.pid) {
                let _ = signal::kill(Pid::from_raw(transcript.pid as i32), Signal::SIGKILL);
            }
        }

        transcript.status = DiscoveredStatus::Stopped;
        transcript.stopped_at = Some(now_ms());
        self.write_transcript(&transcript)
    }

    async fn resume(&self, id: &str, message: &str) -> Result<(), AdapterError> {
        let Some(transcript) = self.read_transcript(id) else {
            return Err(AdapterError::NotFound(id.to_string()));
        };

        let output = tokio::process::Command::new(&self.binary)
            .current_dir(&transcript.cwd)
            .arg("--resume")
            .arg(id)
            .arg("-p")
            .arg(message)
            .output()
            .await
            .map_err(|e| AdapterError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(AdapterError::SpawnFailed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        Ok(())
    }

    async fn peek(&self, id: &str, lines: u32) -> Result<String, AdapterError> {
        if self.read_transcript(id).is_none() {
            return Err(AdapterError::NotFound(id.to_string()));
        }
        tail_lines(&self.log_path(id), lines).map_err(AdapterError::Io)
    }
}

#[cfg(test)]
#[path = "claude_code_tests.rs"]
mod tests;

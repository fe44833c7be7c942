// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol (spec §4.6): one JSON object per line over a Unix domain
//! socket. Framing is newline-terminated rather than the 4-byte
//! length-prefix used elsewhere in this codebase's lineage, per spec;
//! malformed lines are dropped, never closing the connection outright.

use agentctl_core::{EnrichedSession, FuseAction, WireError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Daemon-client RPC timeout (spec §5).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed before a full message was read")]
    ConnectionClosed,
    #[error("read timed out")]
    Timeout,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: serde_json::Value,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: serde_json::Value,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Ok { result: serde_json::Value },
    Err { error: WireError },
}

impl Response {
    pub fn ok(id: serde_json::Value, result: impl Serialize) -> Self {
        Self {
            id,
            body: ResponseBody::Ok {
                result: serde_json::to_value(result).unwrap_or(serde_json::Value::Null),
            },
        }
    }

    pub fn err(id: serde_json::Value, error: WireError) -> Self {
        Self {
            id,
            body: ResponseBody::Err { error },
        }
    }
}

/// Read one newline-terminated JSON message, retrying past malformed lines
/// rather than closing the connection (spec §4.6, "Malformed lines are
/// dropped without closing").
pub async fn read_request<R>(reader: &mut R, timeout: Duration) -> Result<Request, ProtocolError>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    loop {
        let mut line = String::new();
        let n = tokio::time::timeout(timeout, reader.read_line(&mut line))
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        if n == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str(trimmed) {
            Ok(request) => return Ok(request),
            Err(e) => {
                tracing::warn!(error = %e, line = trimmed, "dropping malformed request line");
                continue;
            }
        }
    }
}

pub async fn write_response<W>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    tokio::time::timeout(timeout, async {
        writer.write_all(&line).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| ProtocolError::Timeout)??;
    Ok(())
}

/// Wraps a raw reader in a `BufReader` for callers that don't already have
/// a buffered stream half.
pub fn buffered<R: tokio::io::AsyncRead + Unpin>(reader: R) -> BufReader<R> {
    BufReader::new(reader)
}

// --- RPC params and results (spec §6.1) ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionListParams {
    pub status: Option<String>,
    #[serde(default)]
    pub all: bool,
    pub adapter: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionListResult {
    pub sessions: Vec<EnrichedSession>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionIdParams {
    pub id: String,
    pub adapter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionPeekParams {
    pub id: String,
    #[serde(default = "default_peek_lines")]
    pub lines: u32,
    pub adapter: Option<String>,
}

fn default_peek_lines() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionLaunchParams {
    pub adapter: Option<String>,
    pub prompt: String,
    pub cwd: String,
    pub spec: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub env: Vec<(String, String)>,
    #[serde(default, rename = "adapterOpts")]
    pub adapter_opts: serde_json::Value,
    pub group: Option<String>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionStopParams {
    pub id: String,
    pub adapter: Option<String>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionResumeParams {
    pub id: String,
    pub message: String,
    pub adapter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PruneResult {
    pub pruned: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockDirectoryParams {
    pub directory: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockAcquireParams {
    pub directory: String,
    #[serde(rename = "by")]
    pub locked_by: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FuseSetParams {
    pub directory: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "ttlMs")]
    pub ttl_ms: Option<u64>,
    #[serde(rename = "onExpire")]
    pub on_expire: Option<FuseAction>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FuseExtendParams {
    pub directory: String,
    #[serde(rename = "ttlMs")]
    pub ttl_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaemonStatusResult {
    pub pid: u32,
    pub uptime_secs: u64,
    pub sessions: usize,
    pub locks: usize,
    pub fuses: usize,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;

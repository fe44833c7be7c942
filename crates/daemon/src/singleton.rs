// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Singleton enforcement at startup (spec §4.7): kill any stale daemon or
//! supervisor, fall back to a full process scan if the pid files lied,
//! probe the socket in case a race let a second daemon through, clear the
//! stale socket, then take an exclusive `fs2` lock on the pid file itself
//! so a second daemon racing through the earlier steps still can't get
//! past this one.

use crate::config::Config;
use agentctl_tracker::pid::is_pid_alive;
use fs2::FileExt;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use sysinfo::{ProcessRefreshKind, RefreshKind, System};
use thiserror::Error;
use tokio::net::UnixStream;

const KILL_WAIT: Duration = Duration::from_millis(500);
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum SingletonError {
    #[error("another agentctl daemon is already listening on this socket")]
    AlreadyRunning,
    #[error("another agentctl daemon already holds the pid file lock")]
    AlreadyLocked,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the full sequence and returns the held, exclusively-locked pid
/// file. The caller must keep it alive for the process's lifetime (drop
/// releases the advisory lock) and write its own pid into it once bound.
pub async fn enforce(config: &Config) -> Result<File, SingletonError> {
    kill_stale_pid_file(&config.pid_path).await;
    kill_stale_pid_file(&config.supervisor_pid_path).await;
    kill_stray_processes_by_command_line().await;
    probe_socket(&config.socket_path).await?;
    delete_stale_socket(&config.socket_path);
    acquire_pid_lock(&config.pid_path)
}

/// Exclusive `fs2` lock on the pid file, taken last: everything above has
/// already dealt with a stale holder, so a failure here means a live
/// daemon won the race and this one should refuse to start.
fn acquire_pid_lock(pid_path: &Path) -> Result<File, SingletonError> {
    let file = File::create(pid_path)?;
    file.try_lock_exclusive()
        .map_err(|_| SingletonError::AlreadyLocked)?;
    Ok(file)
}

/// Writes this process's pid into the already-locked file (spec §4.7 step
/// 6: pid file is written only after the socket is bound).
pub fn write_pid(mut lock_file: &File) -> std::io::Result<()> {
    use std::io::{Seek, SeekFrom};
    lock_file.set_len(0)?;
    lock_file.seek(SeekFrom::Start(0))?;
    writeln!(lock_file, "{}", std::process::id())?;
    lock_file.flush()
}

async fn kill_stale_pid_file(path: &Path) {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return;
    };
    if let Ok(pid) = contents.trim().parse::<u32>() {
        kill_with_escalation(pid).await;
    }
    let _ = std::fs::remove_file(path);
}

/// Fallback for when the pid files are missing or stale themselves: scan
/// every process for a command line naming both "agentctl" and "daemon",
/// excluding this process and its parent.
async fn kill_stray_processes_by_command_line() {
    let self_pid = std::process::id();
    let parent_pid = parent_pid();

    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
    );

    let strays: Vec<u32> = system
        .processes()
        .iter()
        .filter(|(pid, _)| {
            let raw = pid.as_u32();
            raw != self_pid && Some(raw) != parent_pid
        })
        .filter(|(_, process)| {
            let cmd = process.cmd().join(" ");
            cmd.contains("agentctl") && cmd.contains("daemon")
        })
        .map(|(pid, _)| pid.as_u32())
        .collect();

    for pid in strays {
        kill_with_escalation(pid).await;
    }
}

async fn kill_with_escalation(pid: u32) {
    if !is_pid_alive(pid) {
        return;
    }
    let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    tokio::time::sleep(KILL_WAIT).await;
    if is_pid_alive(pid) {
        let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
    }
}

async fn probe_socket(socket_path: &Path) -> Result<(), SingletonError> {
    if !socket_path.exists() {
        return Ok(());
    }
    match tokio::time::timeout(PROBE_TIMEOUT, UnixStream::connect(socket_path)).await {
        Ok(Ok(_)) => Err(SingletonError::AlreadyRunning),
        _ => Ok(()),
    }
}

fn delete_stale_socket(socket_path: &Path) {
    if socket_path.exists() {
        let _ = std::fs::remove_file(socket_path);
    }
}

fn parent_pid() -> Option<u32> {
    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
    );
    system
        .process(sysinfo::Pid::from_u32(std::process::id()))
        .and_then(|p| p.parent())
        .map(|p| p.as_u32())
}

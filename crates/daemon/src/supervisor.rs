// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor loop (spec §4.7): spawns the daemon binary in the
//! foreground, waits for it to exit, and respawns with backoff. Lives as
//! its own binary rather than a mode flag on `agentctld`, but the logic
//! here is what that separate process runs.

use crate::backoff::Backoff;
use crate::config::Config;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;
use tokio::signal::unix::{signal as unix_signal, SignalKind};
use tracing::{info, warn};

pub async fn run(daemon_binary: PathBuf, config: Config) -> std::io::Result<()> {
    std::fs::write(&config.supervisor_pid_path, std::process::id().to_string())?;

    let mut backoff = Backoff::new();
    let mut sigterm = unix_signal(SignalKind::terminate())?;

    loop {
        info!(binary = %daemon_binary.display(), "supervisor spawning daemon");
        let mut child = Command::new(&daemon_binary).spawn()?;
        let child_pid = child.id();
        let started = Instant::now();

        let exit_status = tokio::select! {
            status = child.wait() => status,
            _ = sigterm.recv() => {
                info!("supervisor received SIGTERM, stopping respawn loop");
                if let Some(pid) = child_pid {
                    let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
                }
                let _ = child.wait().await;
                let _ = std::fs::remove_file(&config.supervisor_pid_path);
                return Ok(());
            }
        };

        let uptime = started.elapsed();
        match exit_status {
            Ok(status) if status.success() => {
                info!("daemon exited cleanly, supervisor stopping");
                let _ = std::fs::remove_file(&config.supervisor_pid_path);
                return Ok(());
            }
            Ok(status) => warn!(%status, uptime_secs = uptime.as_secs(), "daemon exited non-zero"),
            Err(e) => warn!(error = %e, "failed to wait on daemon child"),
        }

        let delay = backoff.next_delay(uptime);
        info!(delay = %humantime::format_duration(delay), "backing off before respawn");
        tokio::time::sleep(delay).await;
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! agentctl-supervisord: spawns and respawns `agentctld` with backoff
//! (spec §4.7). Mirrors the child's exit code on a clean exit; otherwise
//! loops until SIGTERM.

use agentctl_daemon::config::Config;
use agentctl_daemon::supervisor;

#[tokio::main]
async fn main() {
    let config = match Config::resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("agentctl-supervisord: failed to resolve config directory: {e}");
            std::process::exit(1);
        }
    };

    let daemon_binary = match locate_daemon_binary() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("agentctl-supervisord: could not locate agentctld binary: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = supervisor::run(daemon_binary, config).await {
        eprintln!("agentctl-supervisord: {e}");
        std::process::exit(1);
    }
}

/// `agentctld` ships alongside this binary; fall back to `PATH` lookup if
/// the current executable's directory doesn't have it (e.g. a `cargo
/// install`-style layout).
fn locate_daemon_binary() -> std::io::Result<std::path::PathBuf> {
    let self_path = std::env::current_exe()?;
    if let Some(dir) = self_path.parent() {
        let candidate = dir.join("agentctld");
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Ok(std::path::PathBuf::from("agentctld"))
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout for the daemon's config directory (spec §6.3): a
//! single directory holds the state document, socket, pid files, and
//! captured environment. No per-project hashing — one daemon per machine.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a home directory to derive the config directory from")]
    NoHomeDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub config_dir: PathBuf,
    pub state_path: PathBuf,
    pub socket_path: PathBuf,
    pub pid_path: PathBuf,
    pub supervisor_pid_path: PathBuf,
    pub env_path: PathBuf,
    pub log_path: PathBuf,
    pub transcripts_dir: PathBuf,
}

impl Config {
    /// Resolves `AGENTCTL_CONFIG_DIR` if set (used by tests and by anyone
    /// running multiple daemons side by side), else `$XDG_STATE_HOME/agentctl`,
    /// else `~/.local/state/agentctl`.
    pub fn resolve() -> Result<Self, ConfigError> {
        let config_dir = if let Ok(dir) = std::env::var("AGENTCTL_CONFIG_DIR") {
            PathBuf::from(dir)
        } else if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            PathBuf::from(xdg).join("agentctl")
        } else {
            dirs::home_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(".local/state/agentctl")
        };
        Ok(Self::at(config_dir))
    }

    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Self {
            state_path: config_dir.join("state.json"),
            socket_path: config_dir.join("agentctl.sock"),
            pid_path: config_dir.join("agentctl.pid"),
            supervisor_pid_path: config_dir.join("supervisor.pid"),
            env_path: config_dir.join("daemon-env.json"),
            log_path: config_dir.join("daemon.log"),
            transcripts_dir: config_dir.join("transcripts"),
            config_dir,
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Derives the `clusterName`/`branch` fields a `FuseTimer` records (spec
//! §3: "derived", not supplied by the caller). Both come from the
//! directory itself: the cluster name from its basename, the branch from
//! `git rev-parse --abbrev-ref HEAD` run in that directory.

use std::path::Path;
use std::process::Command;

/// Sanitized to the characters Kubernetes cluster names allow: lowercase
/// alphanumerics and hyphens.
pub fn derive_cluster_name(directory: &Path) -> String {
    let basename = directory
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workspace".to_string());
    let sanitized: String = basename
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        "workspace-cluster".to_string()
    } else {
        format!("{trimmed}-cluster")
    }
}

/// `"unknown"` if the directory isn't a git worktree or the lookup fails;
/// this is best-effort derivation, never a hard dependency on git.
pub fn derive_branch(directory: &Path) -> String {
    Command::new("git")
        .arg("-C")
        .arg(directory)
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

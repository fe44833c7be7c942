// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pending/stable session-id distinction.

const PENDING_PREFIX: &str = "pending-";

/// Build a pending id of the form `pending-<pid>`.
pub fn pending_id(pid: u32) -> String {
    format!("{PENDING_PREFIX}{pid}")
}

/// If `id` is a pending id, return the pid it encodes.
pub fn pending_pid(id: &str) -> Option<u32> {
    id.strip_prefix(PENDING_PREFIX)?.parse().ok()
}

/// True if `id` is a `pending-<pid>` placeholder rather than a stable id.
pub fn is_pending(id: &str) -> bool {
    pending_pid(id).is_some()
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;

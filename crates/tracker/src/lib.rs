// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agentctl-tracker: the session tracker (spec §4.4), the heart of the
//! daemon. Holds no state of its own — every operation takes the
//! `DocumentStore` it mutates, keeping the single-writer invariant
//! structural rather than documented.

pub mod pid;
mod tracker;

pub use tracker::{ReconcileResult, SessionTracker, GRACE_MS};

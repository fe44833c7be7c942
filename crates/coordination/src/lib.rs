// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agentctl-coordination: directory-keyed locks and one-shot "fuse"
//! timers, the two primitives sessions use to serialize working-directory
//! access and defer teardown of heavy per-directory infrastructure.

mod fuse;
mod lock;

pub use fuse::{FuseEngine, SetFuseRequest};
pub use lock::{LockError, LockManager};

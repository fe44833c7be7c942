// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agentctl-adapters: the contract coding-agent CLIs are wrapped behind
//! (spec §6.2), a registry of them (§4.5), and the adapters themselves.

mod claude_code;
mod registry;
mod traits;

pub use claude_code::ClaudeCodeAdapter;
pub use registry::{Registry, DEFAULT_ADAPTER};
pub use traits::{Adapter, AdapterError, LaunchOpts};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{AdapterCall, FakeAdapter};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agentctl-storage: the single persistent JSON document (`state.json`)
//! backing launches, locks, and fuses, with debounced writes (spec §4.1).

mod document;
mod store;

pub use document::{PersistentDocument, CURRENT_VERSION};
pub use store::{DocumentStore, StorageError};

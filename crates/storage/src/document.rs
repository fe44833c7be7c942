// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk shape of `state.json` (spec §6.3).

use agentctl_core::{FuseTimer, LaunchRecord, Lock};
use serde::{Deserialize, Serialize};

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistentDocument {
    pub version: u32,
    pub launches: Vec<LaunchRecord>,
    pub locks: Vec<Lock>,
    pub fuses: Vec<FuseTimer>,
}

impl PersistentDocument {
    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            launches: Vec::new(),
            locks: Vec::new(),
            fuses: Vec::new(),
        }
    }
}

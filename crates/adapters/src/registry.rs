// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter registry (spec §4.5): a pure lookup table from adapter name to
//! instance, built once at boot. Mirrors `oj-adapters`'s flat
//! re-export/registration style rather than anything dynamically
//! reloadable.

use crate::traits::Adapter;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_ADAPTER: &str = "claude-code";

#[derive(Default)]
pub struct Registry {
    adapters: HashMap<&'static str, Arc<dyn Adapter>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(adapter.name(), adapter);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(name).cloned()
    }

    pub fn get_default(&self) -> Option<Arc<dyn Adapter>> {
        self.get(DEFAULT_ADAPTER)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.adapters.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Arc<dyn Adapter>)> {
        self.adapters.iter().map(|(k, v)| (*k, v))
    }
}

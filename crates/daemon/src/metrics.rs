// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ambient in-process counters, observed through `daemon.status` rather
//! than an HTTP exposition endpoint (an exposition surface is out of
//! scope). Grounded in the corpus's general precedent for keeping a
//! small ops-metrics module next to the event types it counts, trimmed to
//! plain atomics since nothing here needs windows or percentiles.

use agentctl_core::Event;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    sessions_launched: AtomicU64,
    sessions_stopped: AtomicU64,
    sessions_promoted: AtomicU64,
    locks_acquired: AtomicU64,
    locks_released: AtomicU64,
    fuses_set: AtomicU64,
    fuses_expired: AtomicU64,
    fuses_cancelled: AtomicU64,
    rpc_requests: AtomicU64,
    rpc_errors: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: &Event) {
        let counter = match event {
            Event::SessionLaunched { .. } => &self.sessions_launched,
            Event::SessionPromoted { .. } => &self.sessions_promoted,
            Event::SessionStopped { .. } => &self.sessions_stopped,
            Event::LockAcquired { .. } => &self.locks_acquired,
            Event::LockReleased { .. } => &self.locks_released,
            Event::FuseSet { .. } => &self.fuses_set,
            Event::FuseExpired { .. } => &self.fuses_expired,
            Event::FuseCancelled { .. } => &self.fuses_cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(event = event.name(), "metric recorded");
    }

    pub fn record_rpc(&self, ok: bool) {
        self.rpc_requests.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.rpc_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_launched: self.sessions_launched.load(Ordering::Relaxed),
            sessions_stopped: self.sessions_stopped.load(Ordering::Relaxed),
            sessions_promoted: self.sessions_promoted.load(Ordering::Relaxed),
            locks_acquired: self.locks_acquired.load(Ordering::Relaxed),
            locks_released: self.locks_released.load(Ordering::Relaxed),
            fuses_set: self.fuses_set.load(Ordering::Relaxed),
            fuses_expired: self.fuses_expired.load(Ordering::Relaxed),
            fuses_cancelled: self.fuses_cancelled.load(Ordering::Relaxed),
            rpc_requests: self.rpc_requests.load(Ordering::Relaxed),
            rpc_errors: self.rpc_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub sessions_launched: u64,
    pub sessions_stopped: u64,
    pub sessions_promoted: u64,
    pub locks_acquired: u64,
    pub locks_released: u64,
    pub fuses_set: u64,
    pub fuses_expired: u64,
    pub fuses_cancelled: u64,
    pub rpc_requests: u64,
    pub rpc_errors: u64,
}

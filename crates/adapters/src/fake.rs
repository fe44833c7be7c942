// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapter for testing, grounded in `session/fake.rs`'s
//! call-recording pattern.

use crate::traits::{Adapter, AdapterError, LaunchOpts};
use agentctl_core::{DiscoveredSession, DiscoveredStatus, LaunchRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum AdapterCall {
    Discover,
    IsAlive { id: String },
    Launch { prompt: String, cwd: String },
    Stop { id: String, force: bool },
    Resume { id: String, message: String },
    Peek { id: String, lines: u32 },
}

#[derive(Clone)]
pub struct FakeAdapter {
    name: &'static str,
    sessions: Arc<Mutex<HashMap<String, DiscoveredSession>>>,
    calls: Arc<Mutex<Vec<AdapterCall>>>,
    next_pid: Arc<Mutex<u32>>,
    fail_launch: Arc<Mutex<bool>>,
}

impl FakeAdapter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            next_pid: Arc::new(Mutex::new(1000)),
            fail_launch: Arc::new(Mutex::new(false)),
        }
    }

    pub fn calls(&self) -> Vec<AdapterCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn seed(&self, session: DiscoveredSession) {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session.id.clone(), session);
    }

    pub fn set_status(&self, id: &str, status: DiscoveredStatus) {
        if let Some(session) = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(id)
        {
            session.status = status;
        }
    }

    pub fn set_fail_launch(&self, fail: bool) {
        *self.fail_launch.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }

    fn record(&self, call: AdapterCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }
}

#[async_trait]
impl Adapter for FakeAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn discover(&self) -> Result<Vec<DiscoveredSession>, AdapterError> {
        self.record(AdapterCall::Discover);
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect())
    }

    async fn is_alive(&self, id: &str) -> Result<bool, AdapterError> {
        self.record(AdapterCall::IsAlive { id: id.to_string() });
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .map(|s| s.status != DiscoveredStatus::Stopped)
            .unwrap_or(false))
    }

    async fn launch(&self, opts: LaunchOpts) -> Result<LaunchRecord, AdapterError> {
        self.record(AdapterCall::Launch {
            prompt: opts.prompt.clone(),
            cwd: opts.cwd.to_string_lossy().into_owned(),
        });

        if *self.fail_launch.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(AdapterError::SpawnFailed("fake launch failure".to_string()));
        }

        let pid = {
            let mut next = self.next_pid.lock().unwrap_or_else(|e| e.into_inner());
            let pid = *next;
            *next += 1;
            pid
        };
        let id = agentctl_core::id::pending_id(pid);

        let mut record = LaunchRecord::new(
            id.clone(),
            self.name,
            0,
            opts.cwd.to_string_lossy().into_owned(),
            Some(pid),
        )
        .with_prompt(opts.prompt);
        record.model = opts.model;
        record.spec = opts.spec;
        record.group = opts.group;

        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).insert(
            id,
            DiscoveredSession {
                id: record.id.clone(),
                adapter: self.name.to_string(),
                status: DiscoveredStatus::Running,
                cwd: Some(record.cwd.clone()),
                model: record.model.clone(),
                started_at: record.started_at,
                stopped_at: None,
                pid: record.pid,
                prompt: record.prompt.clone(),
                tokens: None,
                cost: None,
                native_metadata: serde_json::Value::Null,
            },
        );

        Ok(record)
    }

    async fn stop(&self, id: &str, force: bool) -> Result<(), AdapterError> {
        self.record(AdapterCall::Stop {
            id: id.to_string(),
            force,
        });
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match sessions.get_mut(id) {
            Some(session) => {
                session.status = DiscoveredStatus::Stopped;
                Ok(())
            }
            None => Err(AdapterError::NotFound(id.to_string())),
        }
    }

    async fn resume(&self, id: &str, message: &str) -> Result<(), AdapterError> {
        self.record(AdapterCall::Resume {
            id: id.to_string(),
            message: message.to_string(),
        });
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if sessions.contains_key(id) {
            Ok(())
        } else {
            Err(AdapterError::NotFound(id.to_string()))
        }
    }

    async fn peek(&self, id: &str, lines: u32) -> Result<String, AdapterError> {
        self.record(AdapterCall::Peek {
            id: id.to_string(),
            lines,
        });
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if sessions.contains_key(id) {
            Ok(format!("last {lines} lines of {id}"))
        } else {
            Err(AdapterError::NotFound(id.to_string()))
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

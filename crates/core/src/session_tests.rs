// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn discovered(id: &str, pid: Option<u32>) -> DiscoveredSession {
    DiscoveredSession {
        id: id.to_string(),
        adapter: "claude-code".to_string(),
        status: DiscoveredStatus::Running,
        cwd: None,
        model: None,
        started_at: 1_000,
        stopped_at: None,
        pid,
        prompt: None,
        tokens: None,
        cost: None,
        native_metadata: serde_json::Value::Null,
    }
}

#[test]
fn prompt_over_200_chars_is_truncated() {
    let long = "x".repeat(250);
    let record = LaunchRecord::new("id-1", "claude-code", 0, "/tmp", None).with_prompt(&long);
    assert_eq!(record.prompt.unwrap().len(), 200);
}

#[test]
fn prompt_under_limit_is_untouched() {
    let record = LaunchRecord::new("id-1", "claude-code", 0, "/tmp", None).with_prompt("hello");
    assert_eq!(record.prompt.unwrap(), "hello");
}

#[test]
fn merge_fills_prompt_from_launch_when_discovered_is_empty() {
    let d = discovered("abc", Some(10));
    let launch =
        LaunchRecord::new("abc", "claude-code", 1_000, "/tmp", Some(10)).with_prompt("fix the bug");
    let enriched = EnrichedSession::merge(&d, Some(&launch));
    assert_eq!(enriched.prompt.as_deref(), Some("fix the bug"));
}

#[test]
fn merge_prefers_discovered_prompt_over_launch() {
    let mut d = discovered("abc", Some(10));
    d.prompt = Some("discovered prompt".to_string());
    let launch =
        LaunchRecord::new("abc", "claude-code", 1_000, "/tmp", Some(10)).with_prompt("launch prompt");
    let enriched = EnrichedSession::merge(&d, Some(&launch));
    assert_eq!(enriched.prompt.as_deref(), Some("discovered prompt"));
}

#[test]
fn merge_carries_group_and_spec_from_launch_record() {
    let d = discovered("abc", Some(10));
    let mut launch = LaunchRecord::new("abc", "claude-code", 1_000, "/tmp", Some(10));
    launch.group = Some("team-a".to_string());
    launch.spec = Some("spec.md".to_string());
    let enriched = EnrichedSession::merge(&d, Some(&launch));
    assert_eq!(enriched.group.as_deref(), Some("team-a"));
    assert_eq!(enriched.spec.as_deref(), Some("spec.md"));
}

#[test]
fn merge_without_launch_record_leaves_group_and_spec_empty() {
    let d = discovered("abc", Some(10));
    let enriched = EnrichedSession::merge(&d, None);
    assert_eq!(enriched.group, None);
    assert_eq!(enriched.spec, None);
}

#[test]
fn from_launch_record_is_always_running() {
    let launch = LaunchRecord::new("pending-123", "claude-code", 1_000, "/tmp", Some(123));
    let enriched = EnrichedSession::from_launch_record(&launch);
    assert_eq!(enriched.status, DiscoveredStatus::Running);
    assert_eq!(enriched.id, "pending-123");
}

#[test]
fn mark_stopped_sets_status_and_timestamp() {
    let mut launch = LaunchRecord::new("id-1", "claude-code", 0, "/tmp", None);
    launch.mark_stopped(500);
    assert_eq!(launch.status, SessionStatus::Stopped);
    assert_eq!(launch.stopped_at, Some(500));
}

#[test]
fn launch_record_serializes_and_round_trips() {
    let record = LaunchRecord::new("id-1", "claude-code", 0, "/tmp", Some(5)).with_prompt("hi");
    let json = serde_json::to_string(&record).unwrap();
    let back: LaunchRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record, back);
}

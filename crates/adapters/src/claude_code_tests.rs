use super::*;
use tempfile::tempdir;

fn opts(prompt: &str, cwd: &std::path::Path) -> LaunchOpts {
    LaunchOpts {
        prompt: prompt.to_string(),
        cwd: cwd.to_path_buf(),
        spec: None,
        model: None,
        env: Vec::new(),
        adapter_opts: serde_json::Value::Null,
        group: None,
    }
}

#[tokio::test]
async fn launch_writes_a_transcript_and_returns_a_pending_id() {
    let transcripts = tempdir().unwrap();
    let cwd = tempdir().unwrap();
    let adapter = ClaudeCodeAdapter::new(transcripts.path()).with_binary("true");

    let record = adapter.launch(opts("fix the bug", cwd.path())).await.unwrap();

    assert!(record.is_pending());
    assert_eq!(record.prompt.as_deref(), Some("fix the bug"));
    assert!(adapter.transcript_path(&record.id).exists());
}

#[tokio::test]
async fn discover_reports_the_launched_session() {
    let transcripts = tempdir().unwrap();
    let cwd = tempdir().unwrap();
    let adapter = ClaudeCodeAdapter::new(transcripts.path()).with_binary("true");

    let record = adapter.launch(opts("p", cwd.path())).await.unwrap();
    let discovered = adapter.discover().await.unwrap();

    assert_eq!(discovered.len(), 1);
    assert_eq!(discovered[0].id, record.id);
    assert_eq!(discovered[0].pid, record.pid);
}

#[tokio::test]
async fn discover_on_missing_directory_returns_empty() {
    let adapter = ClaudeCodeAdapter::new("/nonexistent/path/for/agentctl/tests");
    assert!(adapter.discover().await.unwrap().is_empty());
}

#[tokio::test]
async fn stop_marks_transcript_stopped() {
    let transcripts = tempdir().unwrap();
    let cwd = tempdir().unwrap();
    let adapter = ClaudeCodeAdapter::new(transcripts.path()).with_binary("true");

    let record = adapter.launch(opts("p", cwd.path())).await.unwrap();
    adapter.stop(&record.id, false).await.unwrap();

    let transcript = adapter.read_transcript(&record.id).unwrap();
    assert_eq!(transcript.status, DiscoveredStatus::Stopped);
    assert!(transcript.stopped_at.is_some());
}

#[tokio::test]
async fn stop_unknown_id_is_not_found() {
    let transcripts = tempdir().unwrap();
    let adapter = ClaudeCodeAdapter::new(transcripts.path());
    assert!(matches!(
        adapter.stop("missing", false).await.unwrap_err(),
        AdapterError::NotFound(_)
    ));
}

#[tokio::test]
async fn resume_succeeds_when_the_cli_exits_zero() {
    let transcripts = tempdir().unwrap();
    let cwd = tempdir().unwrap();
    let adapter = ClaudeCodeAdapter::new(transcripts.path()).with_binary("true");

    let record = adapter.launch(opts("p", cwd.path())).await.unwrap();
    adapter.resume(&record.id, "keep going").await.unwrap();
}

#[tokio::test]
async fn resume_fails_when_the_cli_exits_nonzero() {
    let transcripts = tempdir().unwrap();
    let cwd = tempdir().unwrap();
    let adapter = ClaudeCodeAdapter::new(transcripts.path()).with_binary("true");

    let record = adapter.launch(opts("p", cwd.path())).await.unwrap();
    let failing = ClaudeCodeAdapter::new(transcripts.path()).with_binary("false");
    assert!(failing.resume(&record.id, "keep going").await.is_err());
}

#[tokio::test]
async fn peek_returns_the_tail_of_the_log_file() {
    let transcripts = tempdir().unwrap();
    let cwd = tempdir().unwrap();
    let adapter = ClaudeCodeAdapter::new(transcripts.path()).with_binary("true");

    let record = adapter.launch(opts("p", cwd.path())).await.unwrap();
    std::fs::write(adapter.log_path(&record.id), "line1\nline2\nline3\n").unwrap();

    let tail = adapter.peek(&record.id, 2).await.unwrap();
    assert_eq!(tail, "line2\nline3");
}

#[tokio::test]
async fn peek_unknown_id_is_not_found() {
    let transcripts = tempdir().unwrap();
    let adapter = ClaudeCodeAdapter::new(transcripts.path());
    assert!(adapter.peek("missing", 10).await.is_err());
}

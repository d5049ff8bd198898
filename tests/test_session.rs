//! End-to-end session scenarios
//!
//! Runs the full manager pipeline against a mock transport and a stub CLI
//! script, covering admission, relay, teardown, and shutdown.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use claude_courier::Result;
use claude_courier::config::CourierConfig;
use claude_courier::manager::SessionManager;
use claude_courier::transport::{MessageEvent, Messenger, StatusSink};

#[derive(Clone, Default)]
struct MockTransport {
    replies: Arc<Mutex<Vec<String>>>,
    updates: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    fn replies(&self) -> Vec<String> {
        self.replies.lock().expect("lock").clone()
    }

    fn last_update(&self) -> String {
        self.updates
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .unwrap_or_default()
    }

    fn update_count(&self) -> usize {
        self.updates.lock().expect("lock").len()
    }
}

struct MockSink {
    updates: Arc<Mutex<Vec<String>>>,
}

impl StatusSink for MockSink {
    async fn update(&mut self, text: &str) -> Result<()> {
        self.updates.lock().expect("lock").push(text.to_string());
        Ok(())
    }
}

impl Messenger for MockTransport {
    type Sink = MockSink;

    async fn reply(&self, text: &str) -> Result<MockSink> {
        self.replies.lock().expect("lock").push(text.to_string());
        Ok(MockSink {
            updates: Arc::clone(&self.updates),
        })
    }
}

fn write_stub_cli(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("claude-stub");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod stub");
    path
}

fn config_with(default_dir: &Path, cli_path: PathBuf) -> CourierConfig {
    CourierConfig {
        default_dir: default_dir.to_path_buf(),
        home_dir: PathBuf::from("/root"),
        token: None,
        cli_path,
    }
}

fn event_from(author: &str, text: &str) -> MessageEvent {
    MessageEvent {
        author_id: author.to_string(),
        channel_id: "chan-1".to_string(),
        text: text.to_string(),
        is_direct: true,
        mentions_bot: false,
        from_bot: false,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 5s");
}

#[tokio::test]
async fn task_runs_in_default_directory_and_reports_success() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = write_stub_cli(dir.path(), "echo done");
    let manager = SessionManager::new(config_with(dir.path(), cli));
    let transport = MockTransport::default();

    manager
        .handle_message(&event_from("user-1", "fix the login bug"), &transport)
        .await;
    wait_until(|| manager.registry().is_empty()).await;

    let replies = transport.replies();
    assert!(replies[0].contains("Starting Claude Code session"));
    assert!(replies[0].contains("fix the login bug"));

    let last = transport.last_update();
    assert!(last.contains("Completed"));
    assert!(last.contains("done"));
}

#[tokio::test]
async fn path_prefixed_request_selects_the_working_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let project = tempfile::tempdir().expect("tempdir");
    let cli = write_stub_cli(dir.path(), "pwd");
    let manager = SessionManager::new(config_with(dir.path(), cli));
    let transport = MockTransport::default();

    let text = format!("{}: run tests", project.path().display());
    manager
        .handle_message(&event_from("user-1", &text), &transport)
        .await;
    wait_until(|| manager.registry().is_empty()).await;

    let cwd = fs::canonicalize(project.path()).expect("canonicalize");
    assert!(transport.last_update().contains(&*cwd.to_string_lossy()));
}

#[tokio::test]
async fn missing_directory_is_reported_without_spawning() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = write_stub_cli(dir.path(), "echo done");
    let manager = SessionManager::new(config_with(dir.path(), cli));
    let transport = MockTransport::default();

    manager
        .handle_message(&event_from("user-1", "/no/such/dir: run tests"), &transport)
        .await;

    let replies = transport.replies();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Directory not found"));
    assert_eq!(transport.update_count(), 0);
    assert!(manager.registry().is_empty());
}

#[tokio::test]
async fn second_request_is_rejected_while_the_first_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = write_stub_cli(dir.path(), "sleep 1\necho done");
    let manager = SessionManager::new(config_with(dir.path(), cli));
    let transport = MockTransport::default();

    manager
        .handle_message(&event_from("user-1", "first task"), &transport)
        .await;
    assert_eq!(manager.registry().len(), 1);

    manager
        .handle_message(&event_from("user-1", "second task"), &transport)
        .await;

    let replies = transport.replies();
    assert!(
        replies
            .last()
            .expect("reply")
            .contains("already have an active Claude Code session")
    );
    assert_eq!(manager.registry().len(), 1);

    // The first session is untouched and completes normally.
    wait_until(|| manager.registry().is_empty()).await;
    assert!(transport.last_update().contains("done"));
}

#[tokio::test]
async fn requests_from_different_users_run_concurrently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = write_stub_cli(dir.path(), "echo done");
    let manager = SessionManager::new(config_with(dir.path(), cli));
    let transport = MockTransport::default();

    manager
        .handle_message(&event_from("user-1", "task one"), &transport)
        .await;
    manager
        .handle_message(&event_from("user-2", "task two"), &transport)
        .await;

    wait_until(|| manager.registry().is_empty()).await;
    assert_eq!(transport.replies().len(), 2);
}

#[tokio::test]
async fn long_failure_output_shows_the_tail_and_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = write_stub_cli(
        dir.path(),
        "i=0\nwhile [ $i -lt 200 ]; do echo 0123456789abcdef; i=$((i+1)); done\nexit 2",
    );
    let manager = SessionManager::new(config_with(dir.path(), cli));
    let transport = MockTransport::default();

    manager
        .handle_message(&event_from("user-1", "break something"), &transport)
        .await;
    wait_until(|| manager.registry().is_empty()).await;

    let last = transport.last_update();
    assert!(last.contains("Failed"));
    assert!(last.contains("exit code: 2"));
    assert!(last.contains("..."));
    assert!(last.chars().count() <= 2000);
}

#[tokio::test]
async fn spawn_error_releases_the_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = write_stub_cli(dir.path(), "echo done");

    // A plain file passes the existence check but cannot be a working dir,
    // so the launch itself fails.
    let file = dir.path().join("not-a-dir");
    fs::write(&file, "x").expect("write file");

    let manager = SessionManager::new(config_with(&file, cli));
    let transport = MockTransport::default();

    manager
        .handle_message(&event_from("user-1", "do something"), &transport)
        .await;

    assert!(manager.registry().is_empty());
    let last = transport.last_update();
    assert!(last.contains("Error running Claude Code"));
}

#[tokio::test]
async fn shutdown_terminates_active_sessions_without_waiting() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = write_stub_cli(dir.path(), "exec sleep 30");
    let manager = SessionManager::new(config_with(dir.path(), cli));
    let transport = MockTransport::default();

    manager
        .handle_message(&event_from("user-1", "long task"), &transport)
        .await;
    assert_eq!(manager.registry().len(), 1);

    manager.shutdown();
    assert!(manager.registry().is_empty());

    // The killed process surfaces as an error rendering shortly after.
    wait_until(|| transport.last_update().contains("terminated by signal")).await;
}

#[tokio::test]
async fn bot_messages_and_unaddressed_channel_chatter_are_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = write_stub_cli(dir.path(), "echo done");
    let manager = SessionManager::new(config_with(dir.path(), cli));
    let transport = MockTransport::default();

    let mut from_bot = event_from("bot-1", "fix things");
    from_bot.from_bot = true;
    manager.handle_message(&from_bot, &transport).await;

    let mut chatter = event_from("user-1", "fix things");
    chatter.is_direct = false;
    chatter.mentions_bot = false;
    manager.handle_message(&chatter, &transport).await;

    assert!(transport.replies().is_empty());
    assert!(manager.registry().is_empty());
}

#[tokio::test]
async fn empty_request_gets_usage_help() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = write_stub_cli(dir.path(), "echo done");
    let manager = SessionManager::new(config_with(dir.path(), cli));
    let transport = MockTransport::default();

    manager
        .handle_message(&event_from("user-1", "   "), &transport)
        .await;

    let replies = transport.replies();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Send me a task"));
    assert!(replies[0].contains(&*dir.path().to_string_lossy()));
    assert!(manager.registry().is_empty());
}

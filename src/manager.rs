//! Session orchestration
//!
//! Ties the request parser, registry, process runner, and status relay
//! together: one inbound message either becomes a running session or a
//! single explanatory reply. Also hosts the shutdown coordinator that
//! terminates every live process on exit.

use std::sync::Arc;

use crate::config::CourierConfig;
use crate::error::CourierError;
use crate::registry::{SessionKey, SessionRegistry};
use crate::relay::{RelayConfig, StatusRelay, summarize};
use crate::request::{ParsedRequest, TaskRequest, parse_request};
use crate::runner::{ProcessEvent, TaskProcess, build_task_command};
use crate::transport::{MessageEvent, Messenger, StatusSink};

/// Cap on the task text shown in acknowledgments and logs.
const TASK_SUMMARY_LEN: usize = 100;

/// Coordinates sessions end to end: admission, spawn, relay, teardown.
pub struct SessionManager {
    config: CourierConfig,
    relay_config: RelayConfig,
    registry: Arc<SessionRegistry>,
}

impl SessionManager {
    /// Create a manager with its own registry.
    #[must_use]
    pub fn new(config: CourierConfig) -> Self {
        Self::with_registry(config, Arc::new(SessionRegistry::new()))
    }

    /// Create a manager around an injected registry.
    #[must_use]
    pub fn with_registry(config: CourierConfig, registry: Arc<SessionRegistry>) -> Self {
        Self {
            config,
            relay_config: RelayConfig::default(),
            registry,
        }
    }

    /// Override relay tuning (tests shrink the flush interval).
    #[must_use]
    pub fn with_relay_config(mut self, relay_config: RelayConfig) -> Self {
        self.relay_config = relay_config;
        self
    }

    /// The registry owning this manager's session keys.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Handle one inbound message event.
    ///
    /// Returns once the session is admitted and its relay task is running
    /// (or once the explanatory reply is sent); it does not wait for the
    /// task process to finish.
    pub async fn handle_message<M: Messenger>(&self, event: &MessageEvent, messenger: &M) {
        if event.from_bot {
            log::debug!("ignoring bot message from {}", event.author_id);
            return;
        }
        if !event.is_direct && !event.mentions_bot {
            log::debug!("ignoring message: not direct and bot not addressed");
            return;
        }

        let text = event.text.trim();
        if text.is_empty() {
            self.reply_logged(messenger, &self.usage_text()).await;
            return;
        }

        match parse_request(text, &self.config.default_dir, &self.config.home_dir).await {
            ParsedRequest::MissingDirectory(path) => {
                self.reply_directory_missing(messenger, path).await;
            }
            ParsedRequest::Run(request) => {
                // The fallback directory itself can be missing or stale.
                if tokio::fs::metadata(&request.directory).await.is_err() {
                    self.reply_directory_missing(messenger, request.directory).await;
                    return;
                }
                self.run_session(event, messenger, request).await;
            }
        }
    }

    async fn run_session<M: Messenger>(
        &self,
        event: &MessageEvent,
        messenger: &M,
        request: TaskRequest,
    ) {
        let key = SessionKey::new(&event.channel_id, &event.author_id);
        log::info!(
            "session {key}: \"{}\" in {}",
            summarize(&request.task, TASK_SUMMARY_LEN),
            request.directory.display()
        );

        if !self.registry.try_acquire(&key) {
            log::warn!("session {key} already active");
            self.reply_logged(
                messenger,
                "⚠️ You already have an active Claude Code session. Please wait for it to complete.",
            )
            .await;
            return;
        }

        // The acknowledgment reply doubles as the live status surface.
        let ack = format!(
            "🚀 Starting Claude Code session...\n📁 Directory: `{}`\n📝 Task: {}",
            request.directory.display(),
            summarize(&request.task, TASK_SUMMARY_LEN)
        );
        let sink = match messenger.reply(&ack).await {
            Ok(sink) => sink,
            Err(e) => {
                log::error!("failed to acknowledge request: {e}");
                self.registry.release(&key);
                return;
            }
        };

        let mut relay = StatusRelay::with_config(
            sink,
            request.directory.clone(),
            request.task.clone(),
            self.relay_config.clone(),
        );

        let command = build_task_command(&self.config.cli_path, &request.task);
        let process = match TaskProcess::spawn(&request.directory, &command) {
            Ok(process) => process,
            Err(e) => {
                log::error!("session {key}: {e}");
                relay.on_error(&e.to_string()).await;
                self.registry.release(&key);
                return;
            }
        };

        self.registry.bind(&key, process.terminator());
        relay.begin().await;

        let registry = Arc::clone(&self.registry);
        tokio::spawn(run_relay(process, relay, registry, key));
    }

    /// Terminate every live session and clear the registry.
    ///
    /// Signal delivery is fire-and-forget: shutdown never waits for the
    /// processes to confirm death. The caller then drops the transport and
    /// exits.
    pub fn shutdown(&self) {
        let keys = self.registry.active_keys();
        log::info!("shutting down, terminating {} active session(s)", keys.len());
        for key in keys {
            if let Some(terminator) = self.registry.get(&key) {
                log::info!("terminating session {key}");
                terminator.terminate();
            }
            self.registry.release(&key);
        }
    }

    fn usage_text(&self) -> String {
        format!(
            "👋 Send me a task to work on!\n\n\
             **Format:**\n\
             • Just send a task: `fix the login bug`\n\
             • With specific directory: `/path/to/project: fix the login bug`\n\n\
             Default directory: `{}`",
            self.config.default_dir.display()
        )
    }

    async fn reply_directory_missing<M: Messenger>(
        &self,
        messenger: &M,
        path: std::path::PathBuf,
    ) {
        let err = CourierError::DirectoryNotFound(path);
        log::warn!("{err}");
        self.reply_logged(messenger, &format!("❌ {err}")).await;
    }

    async fn reply_logged<M: Messenger>(&self, messenger: &M, text: &str) {
        if let Err(e) = messenger.reply(text).await {
            log::error!("failed to reply: {e}");
        }
    }
}

// Drives one session's process events into its relay, then releases the key
// exactly once, after the terminal update attempt.
async fn run_relay<S: StatusSink>(
    mut process: TaskProcess,
    mut relay: StatusRelay<S>,
    registry: Arc<SessionRegistry>,
    key: SessionKey,
) {
    while let Some(event) = process.next_event().await {
        match event {
            ProcessEvent::Output { text, is_err } => relay.on_output(&text, is_err).await,
            ProcessEvent::Exited(outcome) => {
                relay.on_exit(&outcome).await;
                break;
            }
        }
    }

    registry.release(&key);
    log::debug!("session {key} released ({} still active)", registry.len());
}

//! Live status relay
//!
//! Buffers a task's streamed output and mirrors it into an editable status
//! message: rate-limited edits while the process runs, then exactly one
//! terminal rendering for success, failure, or error. Sink write failures
//! are logged and swallowed; they never tear down a session.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::runner::ExitOutcome;
use crate::transport::{MESSAGE_LIMIT, StatusSink};

/// Tuning knobs for the relay.
///
/// Defaults mirror production behavior; tests shrink the interval.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Minimum spacing between status edits while the task runs.
    pub update_interval: Duration,
    /// Display cap for the transcript body, leaving formatting headroom
    /// under the transport limit.
    pub max_display: usize,
    /// Transcript tail shown on failure.
    pub failure_tail: usize,
    /// Hard cap on the fully formatted message.
    pub message_limit: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(2000),
            max_display: 1900,
            failure_tail: 1500,
            message_limit: MESSAGE_LIMIT,
        }
    }
}

/// Relay lifecycle. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Created, nothing announced yet.
    Starting,
    /// Process running, buffer accumulating.
    Running,
    /// Process exited with code 0.
    Succeeded,
    /// Process exited with a nonzero code.
    Failed,
    /// Process could not be spawned or died without a clean exit.
    Errored,
}

impl RelayState {
    /// Whether this state admits no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Errored)
    }
}

/// Per-session status relay.
///
/// Single writer: one relay is owned by one session task, so the buffer and
/// the rate-limit watermark never race.
pub struct StatusRelay<S: StatusSink> {
    sink: S,
    config: RelayConfig,
    directory: PathBuf,
    task: String,
    buffer: String,
    last_update: Instant,
    state: RelayState,
}

impl<S: StatusSink> StatusRelay<S> {
    /// Create a relay with production defaults.
    pub fn new(sink: S, directory: impl Into<PathBuf>, task: impl Into<String>) -> Self {
        Self::with_config(sink, directory, task, RelayConfig::default())
    }

    /// Create a relay with explicit tuning.
    pub fn with_config(
        sink: S,
        directory: impl Into<PathBuf>,
        task: impl Into<String>,
        config: RelayConfig,
    ) -> Self {
        Self {
            sink,
            config,
            directory: directory.into(),
            task: task.into(),
            buffer: String::new(),
            last_update: Instant::now(),
            state: RelayState::Starting,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Accumulated transcript.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Enter `Running` and announce the directory and task summary.
    pub async fn begin(&mut self) {
        if self.state != RelayState::Starting {
            return;
        }
        self.state = RelayState::Running;
        self.last_update = Instant::now();
        let text = self.render_announcement();
        self.send(&text).await;
    }

    /// Append an output chunk, flushing to the sink when the rate-limit
    /// window has elapsed.
    ///
    /// Stderr content is tagged per line so the transcript distinguishes
    /// streams. A flush carries the entire buffer, not just the new chunk.
    pub async fn on_output(&mut self, chunk: &str, is_err: bool) {
        if self.state != RelayState::Running {
            return;
        }

        if is_err {
            for line in chunk.lines() {
                self.buffer.push_str("[stderr] ");
                self.buffer.push_str(line);
                self.buffer.push('\n');
            }
        } else {
            self.buffer.push_str(chunk);
        }

        if self.last_update.elapsed() >= self.config.update_interval {
            self.last_update = Instant::now();
            let text = self.render_running();
            self.send(&text).await;
        }
    }

    /// Terminal transition from a process exit; sends one final update.
    pub async fn on_exit(&mut self, outcome: &ExitOutcome) {
        if self.state.is_terminal() {
            return;
        }
        let text = match outcome {
            ExitOutcome::Code(0) => {
                self.state = RelayState::Succeeded;
                self.render_success()
            }
            ExitOutcome::Code(code) => {
                self.state = RelayState::Failed;
                self.render_failure(*code)
            }
            other => {
                self.state = RelayState::Errored;
                self.render_error(&other.describe())
            }
        };
        self.send(&text).await;
    }

    /// Terminal transition from a spawn or runtime error; sends one final
    /// update rendering the message instead of buffer content.
    pub async fn on_error(&mut self, message: &str) {
        if self.state.is_terminal() {
            return;
        }
        self.state = RelayState::Errored;
        let text = self.render_error(message);
        self.send(&text).await;
    }

    async fn send(&mut self, text: &str) {
        if let Err(e) = self.sink.update(text).await {
            log::error!("failed to update status message: {e}");
        }
    }

    fn render_announcement(&self) -> String {
        let text = format!(
            "🚀 Starting Claude Code session...\n📁 Directory: `{}`\n📝 Task: {}",
            self.directory.display(),
            summarize(&self.task, 100)
        );
        truncate_to(text, self.config.message_limit)
    }

    fn render_running(&self) -> String {
        self.render_transcript("⏳ **Working**", &self.buffer)
    }

    fn render_success(&self) -> String {
        let body = if self.buffer.is_empty() {
            "Task completed successfully (no output)"
        } else {
            self.buffer.as_str()
        };
        self.render_transcript("✅ **Completed**", body)
    }

    fn render_failure(&self, code: i32) -> String {
        let tail = tail_with_ellipsis(&self.buffer, self.config.failure_tail);
        let body = if tail.is_empty() {
            "No output".to_string()
        } else {
            tail
        };
        let text = format!(
            "❌ **Failed** (exit code: {code})\n📁 `{}`\n\n```\n{body}\n```",
            self.directory.display()
        );
        truncate_to(text, self.config.message_limit)
    }

    fn render_error(&self, message: &str) -> String {
        let text = format!("❌ **Error running Claude Code**\n```\n{message}\n```");
        truncate_to(text, self.config.message_limit)
    }

    fn render_transcript(&self, prefix: &str, body: &str) -> String {
        let display = tail_with_ellipsis(body, self.config.max_display);
        let text = format!(
            "{prefix}\n📁 `{}`\n\n```\n{display}\n```",
            self.directory.display()
        );
        truncate_to(text, self.config.message_limit)
    }
}

/// Cap a task summary for display.
#[must_use]
pub fn summarize(task: &str, max: usize) -> String {
    if task.chars().count() <= max {
        return task.to_string();
    }
    let head: String = task.chars().take(max).collect();
    format!("{head}...")
}

// Keeps the last `max` chars, marking truncation with a leading ellipsis.
fn tail_with_ellipsis(text: &str, max: usize) -> String {
    let total = text.chars().count();
    if total <= max {
        return text.to_string();
    }
    format!("...{}", tail_chars(text, max))
}

fn tail_chars(text: &str, max: usize) -> &str {
    let total = text.chars().count();
    if total <= max {
        return text;
    }
    match text.char_indices().nth(total - max) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

// Hard head-cap at the transport limit, on a char boundary.
fn truncate_to(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        return text;
    }
    text.chars().take(max).collect()
}

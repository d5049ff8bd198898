//! Spawned task process lifecycle

use std::path::Path;
use std::process::Stdio;

use futures::StreamExt;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec};

use crate::error::{CourierError, Result};

/// Environment override disabling interactive prompts in the CLI.
const DISABLE_INTERACTIVITY_VAR: &str = "CLAUDE_DISABLE_INTERACTIVITY";

/// Read size for the stdout pump.
const READ_CHUNK: usize = 4096;

/// Events emitted by a running task process, in arrival order.
#[derive(Debug)]
pub enum ProcessEvent {
    /// A chunk of process output.
    Output {
        /// Chunk text, lossily decoded.
        text: String,
        /// Whether the chunk came from stderr.
        is_err: bool,
    },
    /// The process finished. Sent exactly once, after all output.
    Exited(ExitOutcome),
}

/// Terminal outcome of a task process.
#[derive(Debug, Clone)]
pub enum ExitOutcome {
    /// Process exited with a code.
    Code(i32),
    /// Process was killed by a signal before exiting.
    Signal(Option<i32>),
    /// Waiting on the process failed.
    WaitFailed(String),
}

impl ExitOutcome {
    /// Human-readable description of a non-code outcome.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Code(code) => format!("exit code {code}"),
            Self::Signal(Some(signal)) => format!("terminated by signal {signal}"),
            Self::Signal(None) => "terminated by signal".to_string(),
            Self::WaitFailed(msg) => format!("failed to reap process: {msg}"),
        }
    }
}

/// Fire-and-forget termination capability for a spawned task.
///
/// Cloneable so the registry can hold one per session while the pump task
/// owns the child itself.
#[derive(Debug, Clone)]
pub struct ProcessTerminator {
    pid: u32,
}

impl ProcessTerminator {
    /// Deliver SIGTERM to the process.
    ///
    /// Never blocks and never waits for exit confirmation; the pump task
    /// observes the death and reports it as a normal exit event.
    pub fn terminate(&self) {
        #[cfg(unix)]
        {
            log::debug!("delivering SIGTERM to pid {}", self.pid);
            unsafe {
                libc::kill(self.pid as i32, libc::SIGTERM);
            }
        }
        #[cfg(not(unix))]
        log::warn!(
            "graceful termination unsupported on this platform (pid {})",
            self.pid
        );
    }
}

/// Handle to a spawned task process.
///
/// Owns the event stream; the child itself lives in a background pump task
/// that forwards output and reaps the exit status.
pub struct TaskProcess {
    pid: u32,
    terminator: ProcessTerminator,
    events: mpsc::UnboundedReceiver<ProcessEvent>,
}

impl TaskProcess {
    /// Spawn `command_line` under `sh -c` with `directory` as working dir.
    ///
    /// Stdin is closed, stdout/stderr are captured, and the full parent
    /// environment is inherited plus the interactivity override.
    ///
    /// # Errors
    /// Returns [`CourierError::SpawnFailed`] when the process cannot be
    /// launched (shell missing, permission denied, invalid working
    /// directory).
    pub fn spawn(directory: &Path, command_line: &str) -> Result<Self> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command_line)
            .current_dir(directory)
            .env(DISABLE_INTERACTIVITY_VAR, "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CourierError::spawn(e.to_string()))?;

        let pid = child
            .id()
            .ok_or_else(|| CourierError::spawn("process exited before a pid was assigned"))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CourierError::spawn("stdout handle unavailable"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CourierError::spawn("stderr handle unavailable"))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(child, stdout, stderr, tx));

        log::info!("spawned task process pid {pid} in {}", directory.display());

        Ok(Self {
            pid,
            terminator: ProcessTerminator { pid },
            events: rx,
        })
    }

    /// OS process identifier.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Clone the terminate capability.
    #[must_use]
    pub fn terminator(&self) -> ProcessTerminator {
        self.terminator.clone()
    }

    /// Receive the next process event.
    ///
    /// Returns `None` once the channel drains after [`ProcessEvent::Exited`].
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events.recv().await
    }
}

// Forwards stdout chunks and stderr lines in arrival order, then reaps the
// child and sends the single exit event. Stream order between stdout and
// stderr is whatever the select observes, matching delivery order.
async fn pump(
    mut child: Child,
    mut stdout: ChildStdout,
    stderr: ChildStderr,
    tx: mpsc::UnboundedSender<ProcessEvent>,
) {
    let mut stderr_lines = FramedRead::new(stderr, LinesCodec::new());
    let mut buf = vec![0u8; READ_CHUNK];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut buf), if out_open => match read {
                Ok(0) | Err(_) => out_open = false,
                Ok(n) => {
                    let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                    if tx
                        .send(ProcessEvent::Output { text, is_err: false })
                        .is_err()
                    {
                        break;
                    }
                }
            },
            line = stderr_lines.next(), if err_open => match line {
                None | Some(Err(_)) => err_open = false,
                Some(Ok(text)) => {
                    if tx.send(ProcessEvent::Output { text, is_err: true }).is_err() {
                        break;
                    }
                }
            },
        }
    }

    // Always reap, even when the receiver went away mid-stream.
    let outcome = match child.wait().await {
        Ok(status) => match status.code() {
            Some(code) => ExitOutcome::Code(code),
            None => ExitOutcome::Signal(signal_of(&status)),
        },
        Err(e) => ExitOutcome::WaitFailed(e.to_string()),
    };

    log::debug!("task process exited: {}", outcome.describe());
    let _ = tx.send(ProcessEvent::Exited(outcome));
}

#[cfg(unix)]
fn signal_of(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

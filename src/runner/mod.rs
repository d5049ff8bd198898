//! Task process runner
//!
//! Builds the shell invocation for the Claude Code CLI and owns the spawned
//! process: stream capture, exit reporting, and termination.

mod command;
mod process;

pub use command::{build_task_command, quote_single};
pub use process::{ExitOutcome, ProcessEvent, ProcessTerminator, TaskProcess};

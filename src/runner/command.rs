//! CLI command line construction

use std::path::Path;

/// Quote text as a single POSIX shell word.
///
/// Wraps the text in single quotes and replaces each literal quote with
/// `'\''` (close, escaped quote, reopen) so the process receives it
/// byte-for-byte.
#[must_use]
pub fn quote_single(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Build the non-interactive CLI invocation for a task.
///
/// `-p` selects print mode, permission prompts are bypassed, and the task
/// text rides as one quoted argument. The result is a `sh -c` command line.
#[must_use]
pub fn build_task_command(cli_path: &Path, task: &str) -> String {
    format!(
        "{} -p --dangerously-skip-permissions {}",
        cli_path.display(),
        quote_single(task)
    )
}

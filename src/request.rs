//! Request parsing
//!
//! Turns raw request text into a working directory and task pair. The
//! informal grammar is `<path>: <task>`, with a bare `<task>` fallback.
//! Parsing is a best-effort heuristic: a task that merely contains a colon
//! resolves to the default directory rather than an error.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// A resolved task request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    /// Working directory for the spawned process.
    pub directory: PathBuf,
    /// Free-form task text.
    pub task: String,
}

/// Outcome of parsing one raw request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRequest {
    /// The request resolved to a runnable directory and task.
    Run(TaskRequest),
    /// The text named a path-shaped directory that does not exist. Surfaced
    /// to the requester; nothing is spawned.
    MissingDirectory(PathBuf),
}

// Left segment is colon-free and non-greedy; the task may span lines.
static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([^:]+?):\s*(.+)$").expect("directive pattern"));

/// Parse raw request text into a directory and task.
///
/// A leading `<path>:` segment selects the working directory when the
/// trimmed segment starts with `/` or `~`; a leading `~` expands to
/// `home_dir`. A path-shaped segment that does not exist on disk yields
/// [`ParsedRequest::MissingDirectory`]. Everything else (no colon, or a
/// left segment that does not look like a path) falls back to
/// `(default_dir, raw.trim())`.
pub async fn parse_request(raw: &str, default_dir: &Path, home_dir: &Path) -> ParsedRequest {
    if let Some(caps) = DIRECTIVE.captures(raw) {
        let candidate = caps[1].trim();
        let task = caps[2].trim();
        if (candidate.starts_with('/') || candidate.starts_with('~')) && !task.is_empty() {
            let expanded = expand_home(candidate, home_dir);
            if tokio::fs::metadata(&expanded).await.is_ok() {
                log::debug!("request selects directory {}", expanded.display());
                return ParsedRequest::Run(TaskRequest {
                    directory: expanded,
                    task: task.to_string(),
                });
            }
            log::warn!("requested path does not exist: {}", expanded.display());
            return ParsedRequest::MissingDirectory(expanded);
        }
        log::debug!("left segment is not path-shaped, using default directory");
    }

    ParsedRequest::Run(TaskRequest {
        directory: default_dir.to_path_buf(),
        task: raw.trim().to_string(),
    })
}

// A leading tilde is replaced textually, matching `~` and `~/sub` alike.
fn expand_home(candidate: &str, home_dir: &Path) -> PathBuf {
    match candidate.strip_prefix('~') {
        Some(rest) => PathBuf::from(format!("{}{rest}", home_dir.display())),
        None => PathBuf::from(candidate),
    }
}

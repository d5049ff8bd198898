//! Environment configuration
//!
//! Everything the bridge needs from its surroundings: the fallback working
//! directory, the home directory used for `~` expansion, the transport
//! secret, and the resolved Claude Code CLI path. A `.env` file is honored
//! when present.

use std::env;
use std::path::PathBuf;

use crate::error::{CourierError, Result};

/// Runtime configuration resolved from the process environment.
#[derive(Debug, Clone)]
pub struct CourierConfig {
    /// Fallback working directory for requests without a path prefix.
    pub default_dir: PathBuf,
    /// Home directory used for `~` expansion in requests.
    pub home_dir: PathBuf,
    /// Transport authentication token, held for the adapter. The core never
    /// reads it.
    pub token: Option<String>,
    /// Resolved Claude Code CLI binary.
    pub cli_path: PathBuf,
}

impl CourierConfig {
    /// Load configuration from the environment.
    ///
    /// `DEFAULT_DIR` falls back to the current working directory, `HOME` is
    /// required for `~` expansion, and `CLAUDE_CLI_PATH` overrides CLI
    /// discovery.
    ///
    /// # Errors
    /// Returns error if `HOME` is unset or the CLI cannot be located.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let default_dir = match env::var("DEFAULT_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => env::current_dir()?,
        };

        let home_dir = env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| CourierError::invalid_config("HOME is not set"))?;

        let token = env::var("DISCORD_TOKEN").ok();

        let cli_path = match env::var("CLAUDE_CLI_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => find_cli()?,
        };

        Ok(Self {
            default_dir,
            home_dir,
            token,
            cli_path,
        })
    }
}

/// Find the Claude Code CLI binary.
///
/// # Errors
/// Returns error if the CLI cannot be found in PATH or common locations
pub fn find_cli() -> Result<PathBuf> {
    if let Ok(path) = which::which("claude") {
        return Ok(path);
    }

    // Manual search in common install locations
    let home = env::var("HOME").unwrap_or_else(|_| String::from("/root"));
    let locations = [
        PathBuf::from(home.clone()).join(".npm-global/bin/claude"),
        PathBuf::from("/usr/local/bin/claude"),
        PathBuf::from(home.clone()).join(".local/bin/claude"),
        PathBuf::from(home.clone()).join("node_modules/.bin/claude"),
        PathBuf::from(home).join(".yarn/bin/claude"),
    ];

    for path in locations {
        if path.exists() && path.is_file() {
            return Ok(path);
        }
    }

    Err(CourierError::cli_not_found())
}

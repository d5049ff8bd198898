//! # Claude Courier
//!
//! A session-oriented bridge between a messaging surface and the Claude Code
//! CLI. An inbound request resolves to a working directory and task text,
//! spawns one `claude -p` process for the requester, and mirrors the
//! process's output into a live-edited status message until it exits.
//!
//! ## Quick Start
//!
//! ```no_run
//! use claude_courier::{CourierConfig, MessageEvent, SessionManager};
//! # use claude_courier::transport::{Messenger, StatusSink};
//! # use claude_courier::Result;
//! # struct MySink;
//! # impl StatusSink for MySink {
//! #     async fn update(&mut self, _text: &str) -> Result<()> { Ok(()) }
//! # }
//! # struct MyMessenger;
//! # impl Messenger for MyMessenger {
//! #     type Sink = MySink;
//! #     async fn reply(&self, _text: &str) -> Result<MySink> { Ok(MySink) }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = SessionManager::new(CourierConfig::from_env()?);
//!     let messenger = MyMessenger;
//!
//!     let event = MessageEvent {
//!         author_id: "u1".into(),
//!         channel_id: "c1".into(),
//!         text: "/tmp/proj: run the tests".into(),
//!         is_direct: true,
//!         mentions_bot: false,
//!         from_bot: false,
//!     };
//!     manager.handle_message(&event, &messenger).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Request grammar
//!
//! `"<path>: <task>"` runs the task in `<path>` (with `~` expanded to the
//! home directory) when the path exists; a bare `"<task>"` runs in the
//! configured default directory. The grammar is a best-effort heuristic: a
//! task that merely contains a colon resolves to the default directory, not
//! to an error.
//!
//! ## Architecture
//!
//! - [`request`]: raw text to `(directory, task)` resolution
//! - [`registry`]: per-requester admission control and live-process map
//! - [`runner`]: shell command construction and process lifecycle
//! - [`relay`]: rate-limited status updates and terminal rendering
//! - [`manager`]: end-to-end orchestration and shutdown coordination
//! - [`transport`]: the narrow interfaces a messaging adapter implements
//! - [`config`]: environment configuration
//! - [`error`]: error types and handling
//!
//! ## Guarantees
//!
//! - At most one active session per requester per conversation; a second
//!   request is answered with a notice and leaves the first untouched.
//! - Status edits are rate-limited to one per flush interval while the task
//!   runs; each edit carries the whole accumulated transcript, truncated for
//!   display and hard-capped at the transport message limit.
//! - Every session releases its registry key exactly once, on success,
//!   failure, spawn error, or forced shutdown; sink write failures are
//!   logged and never leak a session.
//! - Shutdown delivers SIGTERM to every live process fire-and-forget and
//!   never blocks on exit confirmation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod manager;
pub mod registry;
pub mod relay;
pub mod request;
pub mod runner;
pub mod transport;

// Re-export commonly used types for external API
pub use config::CourierConfig;
pub use error::{CourierError, Result};
pub use manager::SessionManager;
pub use registry::{SessionKey, SessionRegistry};
pub use relay::{RelayConfig, RelayState, StatusRelay};
pub use request::{ParsedRequest, TaskRequest, parse_request};
pub use runner::{ExitOutcome, ProcessEvent, ProcessTerminator, TaskProcess};
pub use transport::{MESSAGE_LIMIT, MessageEvent, Messenger, StatusSink, strip_mentions};

/// Version of the bridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Narrow messaging-transport interfaces
//!
//! The bridge never owns a transport connection. It consumes inbound message
//! events and writes status updates through the traits below; a production
//! adapter (Discord, Slack, ...) implements them against its own API, and the
//! console harness in the binary implements them over stdio.

use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

/// Hard transport-level cap on a single rendered message, in characters.
pub const MESSAGE_LIMIT: usize = 2000;

/// Inbound message event delivered by the transport adapter.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    /// Stable identifier of the message author.
    pub author_id: String,
    /// Conversation/channel identifier.
    pub channel_id: String,
    /// Raw message text.
    pub text: String,
    /// Whether the message arrived in a private conversation.
    pub is_direct: bool,
    /// Whether the bot was explicitly addressed.
    pub mentions_bot: bool,
    /// Whether the author is itself a bot.
    pub from_bot: bool,
}

/// Editable status message surface.
///
/// One sink is created per session (the acknowledgment reply) and edited in
/// place for the session's lifetime. Implementations do not need to enforce
/// any size limit; the relay caps rendered text at [`MESSAGE_LIMIT`].
pub trait StatusSink: Send + 'static {
    /// Replace the rendered status text.
    ///
    /// # Errors
    /// Returns error if the transport rejects the edit. Callers treat this
    /// as non-fatal.
    fn update(&mut self, text: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Reply capability of the transport, scoped to one inbound event.
pub trait Messenger: Send + Sync {
    /// Editable handle type returned by [`Messenger::reply`].
    type Sink: StatusSink;

    /// Send a new message in the event's conversation.
    ///
    /// # Errors
    /// Returns error if the transport cannot deliver the message.
    fn reply(&self, text: &str) -> impl Future<Output = Result<Self::Sink>> + Send;
}

// Transport mention tokens look like <@123> or <@!123>.
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?\d+>").expect("mention pattern"));

/// Remove bot-mention tokens from raw message text and trim the result.
#[must_use]
pub fn strip_mentions(text: &str) -> String {
    MENTION.replace_all(text, "").trim().to_string()
}

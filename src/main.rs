// Console harness for the courier bridge.
//
// Drives the session manager from stdin: each line is one inbound message
// from a local user, and status updates print as edits would render. A real
// messaging adapter implements the same transport traits against its API.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use claude_courier::config::CourierConfig;
use claude_courier::manager::SessionManager;
use claude_courier::transport::{MessageEvent, Messenger, StatusSink, strip_mentions};

/// Prints each status edit in a bordered block, standing in for an editable
/// chat message.
struct ConsoleSink;

impl StatusSink for ConsoleSink {
    async fn update(&mut self, text: &str) -> claude_courier::Result<()> {
        println!("┌── status ──");
        for line in text.lines() {
            println!("│ {line}");
        }
        println!("└────────────");
        Ok(())
    }
}

struct ConsoleMessenger;

impl Messenger for ConsoleMessenger {
    type Sink = ConsoleSink;

    async fn reply(&self, text: &str) -> claude_courier::Result<ConsoleSink> {
        println!("{text}");
        Ok(ConsoleSink)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = CourierConfig::from_env().context("failed to load configuration")?;
    log::info!("claude-courier {} starting", claude_courier::VERSION);
    log::info!("default directory: {}", config.default_dir.display());
    log::info!("claude CLI: {}", config.cli_path.display());
    if config.token.is_none() {
        log::warn!("DISCORD_TOKEN not set; transport adapters will refuse to connect");
    }

    let manager = SessionManager::new(config);
    let messenger = ConsoleMessenger;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    log::info!("listening on stdin (one task per line, `<path>: <task>` to pick a directory)");

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    let event = MessageEvent {
                        author_id: "console".to_string(),
                        channel_id: "stdin".to_string(),
                        text: strip_mentions(&line),
                        is_direct: true,
                        mentions_bot: false,
                        from_bot: false,
                    };
                    manager.handle_message(&event, &messenger).await;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("SIGINT received, shutting down");
                break;
            }
        }
    }

    manager.shutdown();
    Ok(())
}

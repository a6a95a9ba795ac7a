//! PTY (console) channel — reads lines from stdin, runs them through the
//! relay as a single local user, prints the replies to stdout.
//!
//! Only loaded in interactive runs (`-i`). Runs until the `shutdown` token is
//! cancelled or stdin is closed.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::CommsState;
use super::{Inbound, classify};
use crate::error::AppError;
use crate::relay::Reply;
use crate::session::UserKey;
use crate::subsystems::runtime::{Component, ComponentFuture};

/// Session key of the console user. Telegram ids are never 0.
pub const CONSOLE_USER: UserKey = UserKey(0);

// ── PtyChannel ───────────────────────────────────────────────────────────────

pub struct PtyChannel {
    channel_id: String,
    state: Arc<CommsState>,
}

impl PtyChannel {
    pub fn new(channel_id: impl Into<String>, state: Arc<CommsState>) -> Self {
        Self { channel_id: channel_id.into(), state }
    }
}

impl Component for PtyChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_pty(self.channel_id, self.state, shutdown))
    }
}

// ── run_pty ──────────────────────────────────────────────────────────────────

async fn run_pty(
    channel_id: String,
    state: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    info!(%channel_id, "pty channel started");
    println!("─────────────────────────────────");
    println!(" palabra console  (Ctrl-C to quit)");
    println!(" type /start, then an English word");
    println!("─────────────────────────────────");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                info!(%channel_id, "shutdown signal received, closing pty channel");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Err(e) => {
                        warn!(%channel_id, "pty read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!(%channel_id, "pty stdin closed");
                        break;
                    }
                    Ok(Some(input)) => {
                        let input = input.trim();
                        if input.is_empty() { continue; }

                        debug!(input = %input, "pty received line");

                        match classify(input, None) {
                            Inbound::Start => {
                                print_reply(&state.start_session(CONSOLE_USER));
                            }
                            Inbound::Text(text) => {
                                for reply in state.handle_text(CONSOLE_USER, text).await {
                                    print_reply(&reply);
                                }
                            }
                            Inbound::Ignored => {}
                        }
                    }
                }
            }
        }
    }

    info!(%channel_id, "pty channel stopped");
    Ok(())
}

fn print_reply(reply: &Reply) {
    println!("{}", reply.text);
}

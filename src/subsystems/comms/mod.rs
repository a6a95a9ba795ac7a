//! Comms subsystem — manages the chat channels feeding the word relay.
//!
//! # Architecture
//!
//! Each channel (Telegram, console) implements [`runtime::Component`] and is
//! spawned as an independent task by [`start`]. Channels capture their shared
//! [`Arc<CommsState>`] at construction time.
//!
//! [`start`]: self::start
//! [`runtime::Component`]: crate::subsystems::runtime::Component

mod state;
#[cfg(feature = "channel-pty")]
pub mod pty;
#[cfg(feature = "channel-telegram")]
pub mod telegram;

pub use state::CommsState;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::relay::WordRelay;
use crate::subsystems::runtime::{Component, SubsystemHandle, spawn_components};

// ── Inbound classification ──────────────────────────────────────────────────

/// What an inbound chat message asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// The start command, with or without arguments.
    Start,
    /// Free text for the relay.
    Text(&'a str),
    /// Any other command, or a command addressed to another bot.
    Ignored,
}

/// Classify a message the way the platform does: a leading `/token` is a
/// command, optionally suffixed with `@bot_username`.
pub fn classify<'a>(text: &'a str, bot_username: Option<&str>) -> Inbound<'a> {
    let Some(command) = text.strip_prefix('/') else {
        return Inbound::Text(text);
    };

    let token = command.split_whitespace().next().unwrap_or("");
    let (name, addressee) = match token.split_once('@') {
        Some((name, addressee)) => (name, Some(addressee)),
        None => (token, None),
    };

    let for_us = match (addressee, bot_username) {
        (None, _) => true,
        (Some(to), Some(me)) => to.eq_ignore_ascii_case(me),
        (Some(_), None) => false,
    };

    if for_us && name.eq_ignore_ascii_case("start") {
        Inbound::Start
    } else {
        Inbound::Ignored
    }
}

// ── start ───────────────────────────────────────────────────────────────────

/// Spawn all configured channels and return a [`SubsystemHandle`].
///
/// Synchronous: returns as soon as the tasks are spawned. If any channel
/// exits with an error, `shutdown` is cancelled so siblings stop too.
pub fn start(
    config: &Config,
    interactive: bool,
    relay: Arc<WordRelay>,
    shutdown: CancellationToken,
) -> SubsystemHandle {
    let state = Arc::new(CommsState::new(relay));

    let mut components: Vec<Box<dyn Component>> = Vec::new();

    #[cfg(feature = "channel-telegram")]
    {
        if config.comms.telegram.enabled {
            info!("loading telegram channel");
            components.push(Box::new(telegram::TelegramChannel::new(
                "telegram0",
                config.telegram_token.clone(),
                state.clone(),
            )));
        }
    }

    #[cfg(feature = "channel-pty")]
    {
        if interactive && config.comms.pty.enabled {
            info!("loading pty channel");
            components.push(Box::new(pty::PtyChannel::new("pty0", state.clone())));
        }
    }

    if components.is_empty() {
        info!(interactive, "no comms channels configured");
    }

    spawn_components(components, shutdown)
}

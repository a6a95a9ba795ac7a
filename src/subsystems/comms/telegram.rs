//! Telegram comms channel — long-polls the Bot API, feeds the relay and
//! replies to the chat the message came from.

use std::sync::Arc;

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{Me, ParseMode};
use teloxide::utils::command::BotCommands;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::CommsState;
use super::{Inbound, classify};
use crate::config::Secret;
use crate::error::AppError;
use crate::relay::{GENERIC_ERROR, Reply, ReplyFormat};
use crate::session::UserKey;
use crate::subsystems::runtime::{Component, ComponentFuture};

/// Commands advertised in the Telegram command menu.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Comandos disponibles:")]
enum Command {
    #[command(description = "empezar: envía después una palabra en inglés")]
    Start,
}

// ── TelegramChannel ──────────────────────────────────────────────────────────

pub struct TelegramChannel {
    channel_id: String,
    token: Secret,
    state: Arc<CommsState>,
}

impl TelegramChannel {
    pub fn new(channel_id: impl Into<String>, token: Secret, state: Arc<CommsState>) -> Self {
        Self { channel_id: channel_id.into(), token, state }
    }
}

impl Component for TelegramChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_telegram(self.channel_id, self.token, self.state, shutdown))
    }
}

// ── run_telegram ─────────────────────────────────────────────────────────────

async fn run_telegram(
    channel_id: String,
    token: Secret,
    state: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    info!(%channel_id, "telegram channel starting");

    let bot = Bot::new(token.expose());

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(%channel_id, "failed to register bot commands: {e}");
    }

    let handler_state = state.clone();
    let handler_channel_id = channel_id.clone();

    let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message, me: Me| {
        let state = handler_state.clone();
        let channel_id = handler_channel_id.clone();
        async move {
            handle_message(&bot, &msg, me.username(), &state, &channel_id).await;
            respond(())
        }
    });

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .build();

    tokio::select! {
        biased;

        _ = shutdown.cancelled() => {
            info!(%channel_id, "shutdown signal received, closing telegram channel");
        }
        _ = dispatcher.dispatch() => {
            warn!(%channel_id, "telegram dispatcher exited unexpectedly");
        }
    }

    info!(%channel_id, "telegram channel stopped");
    Ok(())
}

async fn handle_message(
    bot: &Bot,
    msg: &Message,
    bot_username: &str,
    state: &CommsState,
    channel_id: &str,
) {
    let Some(text) = msg.text() else {
        return;
    };
    let Some(user) = msg.from.as_ref() else {
        debug!(%channel_id, "message without sender ignored");
        return;
    };
    let user_key = UserKey(user.id.0);

    let replies = match classify(text, Some(bot_username)) {
        Inbound::Start => vec![state.start_session(user_key)],
        Inbound::Text(text) => {
            debug!(%channel_id, user = %user_key, "telegram received message");
            state.handle_text(user_key, text).await
        }
        Inbound::Ignored => return,
    };

    deliver(bot, msg.chat.id, replies).await;
}

/// Send replies in order. The first refused send is answered with the generic
/// error message and ends delivery.
async fn deliver(bot: &Bot, chat_id: ChatId, replies: Vec<Reply>) {
    for reply in replies {
        if let Err(e) = send_reply(bot, chat_id, reply).await {
            warn!(chat_id = chat_id.0, "failed to send telegram reply: {e}");
            if let Err(e) = bot.send_message(chat_id, GENERIC_ERROR).await {
                warn!(chat_id = chat_id.0, "failed to send error notice: {e}");
            }
            break;
        }
    }
}

// Legacy Markdown keeps `**bold**` style output from the model readable.
#[allow(deprecated)]
async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<Message, teloxide::RequestError> {
    let request = bot.send_message(chat_id, reply.text);
    match reply.format {
        ReplyFormat::Plain => request.await,
        ReplyFormat::Markdown => request.parse_mode(ParseMode::Markdown).await,
    }
}

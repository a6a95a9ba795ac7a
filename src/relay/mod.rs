//! Word relay — the request/response mediator between a chat channel and the
//! completion provider.
//!
//! Channels hand it a user key and the raw message text; it returns the
//! replies to deliver, in order. The relay owns the [`SessionStore`] and is
//! the only writer of session phases.
//!
//! Per message:
//! 1. reject text unless the user's phase is `AwaitingWord`
//! 2. validate the word (no API call on failure, phase untouched)
//! 3. phase → `Idle`, one completion call, phase → `AwaitingWord`
//! 4. split the reply into transport-sized Markdown chunks, or return the
//!    generic error message

pub mod chunk;
pub mod prompt;
pub mod validate;

use tracing::{debug, error, info};

use crate::llm::{CompletionError, LlmProvider};
use crate::session::{Phase, SessionStore, UserKey};

use chunk::{TRANSPORT_CHUNK_LIMIT, split_chunks};

// ── User-facing messages ──────────────────────────────────────────────────────

pub const GREETING: &str = "🇬🇧➡️🇪🇸 ¡Hola! Envíame una **palabra en inglés** y te daré:\n\
    • Una explicación clara en español\n\
    • 5 palabras relacionadas en español con definiciones breves";
pub const PLEASE_START: &str = "Por favor, escribe /start para comenzar.";
pub const INVALID_WORD: &str = "❌ Por favor, envía una palabra válida en inglés (solo letras).";
pub const GENERIC_ERROR: &str =
    "⚠️ Lo siento, hubo un error. Verifica que la palabra sea válida o inténtalo más tarde.";

// ── Replies ───────────────────────────────────────────────────────────────────

/// How the channel should render a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    Plain,
    /// Platform's lightweight Markdown mode.
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: ReplyFormat,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), format: ReplyFormat::Plain }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self { text: text.into(), format: ReplyFormat::Markdown }
    }
}

// ── WordRelay ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct WordRelay {
    sessions: SessionStore,
    provider: LlmProvider,
    chunk_limit: usize,
}

impl WordRelay {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            sessions: SessionStore::new(),
            provider,
            chunk_limit: TRANSPORT_CHUNK_LIMIT,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle the start command: the user may now send a word.
    pub fn start(&self, user: UserKey) -> Reply {
        self.sessions.set(user, Phase::AwaitingWord);
        debug!(%user, "session started");
        Reply::plain(GREETING)
    }

    /// Handle a free-text message and return the replies to send, in order.
    pub async fn handle_text(&self, user: UserKey, text: &str) -> Vec<Reply> {
        if self.sessions.get(user) != Some(Phase::AwaitingWord) {
            debug!(%user, "text outside an active session");
            return vec![Reply::plain(PLEASE_START)];
        }

        let word = match validate::validate_word(text) {
            Ok(word) => word,
            Err(e) => {
                debug!(%user, error = %e, "rejected input");
                return vec![Reply::plain(INVALID_WORD)];
            }
        };

        info!(%user, %word, provider = self.provider.name(), "looking up word");

        let outcome = {
            let _processing = self.sessions.begin_processing(user);
            self.explain(&word).await
        };

        match outcome {
            Ok(content) => {
                let replies: Vec<Reply> = split_chunks(&content, self.chunk_limit)
                    .into_iter()
                    .map(Reply::markdown)
                    .collect();
                debug!(%user, %word, chunks = replies.len(), "lookup succeeded");
                replies
            }
            Err(e) => {
                error!(%user, %word, error = %e, "error processing word");
                vec![Reply::plain(GENERIC_ERROR)]
            }
        }
    }

    async fn explain(&self, word: &str) -> Result<String, CompletionError> {
        let prompt = prompt::build_prompt(word);
        self.provider.complete(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::dummy::DummyProvider;

    fn relay() -> WordRelay {
        WordRelay::new(LlmProvider::Dummy(DummyProvider))
    }

    #[test]
    fn start_sets_awaiting_word() {
        let r = relay();
        let reply = r.start(UserKey(1));
        assert_eq!(reply, Reply::plain(GREETING));
        assert_eq!(r.sessions().get(UserKey(1)), Some(Phase::AwaitingWord));
    }

    #[tokio::test]
    async fn text_before_start_asks_to_start() {
        let r = relay();
        let replies = r.handle_text(UserKey(1), "hello").await;
        assert_eq!(replies, vec![Reply::plain(PLEASE_START)]);
        assert_eq!(r.sessions().get(UserKey(1)), None);
    }

    #[tokio::test]
    async fn idle_session_asks_to_start() {
        let r = relay();
        r.sessions().set(UserKey(1), Phase::Idle);
        let replies = r.handle_text(UserKey(1), "hello").await;
        assert_eq!(replies, vec![Reply::plain(PLEASE_START)]);
    }

    #[tokio::test]
    async fn invalid_word_keeps_session_open() {
        let r = relay();
        r.start(UserKey(1));
        let replies = r.handle_text(UserKey(1), "test123").await;
        assert_eq!(replies, vec![Reply::plain(INVALID_WORD)]);
        assert_eq!(r.sessions().get(UserKey(1)), Some(Phase::AwaitingWord));
    }

    #[tokio::test]
    async fn valid_word_returns_markdown_and_reopens_session() {
        let r = relay();
        r.start(UserKey(1));
        let replies = r.handle_text(UserKey(1), "Hello").await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].format, ReplyFormat::Markdown);
        assert!(replies[0].text.starts_with("[echo] "));
        assert!(replies[0].text.contains("'hello'"));
        assert_eq!(r.sessions().get(UserKey(1)), Some(Phase::AwaitingWord));
    }

    #[tokio::test]
    async fn long_reply_is_chunked() {
        let mut r = relay();
        r.chunk_limit = 100;
        r.start(UserKey(1));
        let replies = r.handle_text(UserKey(1), "house").await;
        assert!(replies.len() > 1);
        assert!(replies.iter().all(|reply| reply.text.chars().count() <= 100));
        let joined: String = replies.iter().map(|reply| reply.text.as_str()).collect();
        assert_eq!(joined, format!("[echo] {}", prompt::build_prompt("house")));
    }

    #[tokio::test]
    async fn sessions_do_not_leak_between_users() {
        let r = relay();
        r.start(UserKey(1));
        let replies = r.handle_text(UserKey(2), "hello").await;
        assert_eq!(replies, vec![Reply::plain(PLEASE_START)]);
    }
}

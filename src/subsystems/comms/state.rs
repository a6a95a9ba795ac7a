//! Shared state for the comms subsystem — capability boundary for channels.
//!
//! Channels receive an `Arc<CommsState>` and only see the typed methods
//! below. The [`WordRelay`] itself stays private.

use std::sync::Arc;

use crate::relay::{Reply, WordRelay};
use crate::session::UserKey;

/// Shared state passed as `Arc<CommsState>` to every channel task.
pub struct CommsState {
    relay: Arc<WordRelay>,
}

impl CommsState {
    pub fn new(relay: Arc<WordRelay>) -> Self {
        Self { relay }
    }

    /// Start (or restart) a session for `user` and return the greeting.
    pub fn start_session(&self, user: UserKey) -> Reply {
        self.relay.start(user)
    }

    /// Run a free-text message through the relay; replies come back in
    /// delivery order.
    pub async fn handle_text(&self, user: UserKey, text: &str) -> Vec<Reply> {
        self.relay.handle_text(user, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProvider;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::relay::{GREETING, PLEASE_START};

    fn state() -> CommsState {
        CommsState::new(Arc::new(WordRelay::new(LlmProvider::Dummy(DummyProvider))))
    }

    #[tokio::test]
    async fn start_then_text_reaches_relay() {
        let state = state();
        assert_eq!(state.start_session(UserKey(42)), Reply::plain(GREETING));
        let replies = state.handle_text(UserKey(42), "hello").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].text.starts_with("[echo] "));
    }

    #[tokio::test]
    async fn text_without_session_is_refused() {
        let replies = state().handle_text(UserKey(1), "hello").await;
        assert_eq!(replies, vec![Reply::plain(PLEASE_START)]);
    }
}

//! Completion provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations, so the
//! relay calls `complete` without trait-object machinery. Provider instances
//! are immutable after startup and cheap to clone.

pub mod providers;

use std::time::Duration;

use thiserror::Error;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure while constructing a provider at startup.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Failure of a single completion call.
///
/// The relay maps every variant to the same user-facing message; the variant
/// and its detail only go to the log.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("http error: {0}")]
    Http(String),
    #[error("malformed response: {0}")]
    Parse(String),
}

// ── Provider enum ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `prompt` as a single user message and return the reply text.
    pub async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(prompt).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(prompt).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::OpenAiCompatible(_) => "openai-compatible",
        }
    }
}

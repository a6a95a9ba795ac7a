//! Completion provider implementations.
//!
//! `build(config, api_key)` is the factory — called once at startup.

pub mod dummy;
pub mod openai_compatible;

use std::time::Duration;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and the API key.
///
/// `api_key` comes from `DEEPSEEK_API_KEY` (never TOML); `None` is accepted
/// for keyless local endpoints.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "deepseek" | "openai" | "openai-compatible" => {
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                config.api_base_url.clone(),
                config.model.clone(),
                config.temperature,
                Duration::from_secs(config.timeout_seconds),
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

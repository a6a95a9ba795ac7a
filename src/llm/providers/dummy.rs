//! Dummy provider — echoes the prompt back prefixed with `[echo]`.
//! Lets the console channel run end to end without calling the real API.

use crate::llm::CompletionError;

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        Ok(format!("[echo] {prompt}"))
    }
}

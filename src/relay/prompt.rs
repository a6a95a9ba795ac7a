//! Fixed instruction prompt for a single English word.
//!
//! The template lives in `config/prompts/word_explainer.txt` and is compiled
//! into the binary. It has exactly one variable, `{{word}}`, which may occur
//! more than once.

const TEMPLATE: &str = include_str!("../../config/prompts/word_explainer.txt");

/// Placeholder substituted with the validated word.
pub const WORD_VAR: &str = "{{word}}";

/// Render the prompt for an already-validated, lowercased word.
pub fn build_prompt(word: &str) -> String {
    TEMPLATE.trim().replace(WORD_VAR, word)
}

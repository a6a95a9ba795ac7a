//! Input validation for the word a user sends.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("input is empty")]
    Empty,
    #[error("input contains characters other than letters, hyphens and spaces")]
    NotAlphabetic,
}

/// Accept `raw` as an English word and return it trimmed and lowercased.
///
/// Hyphens and spaces are allowed anywhere; every other character must be a
/// letter, and at least one letter is required. Letter numbers such as `Ⅻ`
/// are Unicode alphabetic but do not count.
pub fn validate_word(raw: &str) -> Result<String, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::Empty);
    }

    let mut letters = text.chars().filter(|c| *c != '-' && *c != ' ').peekable();
    if letters.peek().is_none() {
        return Err(ValidationError::NotAlphabetic);
    }
    if !letters.all(is_letter) {
        return Err(ValidationError::NotAlphabetic);
    }

    Ok(text.to_lowercase())
}

// Alphabetic minus the Nl category (the only overlap with numeric).
fn is_letter(c: char) -> bool {
    c.is_alphabetic() && !c.is_numeric()
}

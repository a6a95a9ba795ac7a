//! Fixed-size splitting of replies for a length-limited transport.
//!
//! Slices on character boundaries only. Words and Markdown markers may be
//! cut in half; the platform renders each chunk on its own.

/// Telegram's per-message limit, in characters.
pub const TRANSPORT_CHUNK_LIMIT: usize = 4096;

/// Split `text` into consecutive pieces of at most `limit` characters.
///
/// Concatenating the result yields `text` again. Empty input yields no
/// chunks.
pub fn split_chunks(text: &str, limit: usize) -> Vec<String> {
    assert!(limit > 0, "chunk limit must be positive");

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

//! Cache Keys
//!
//! Key formats for the chapter and translation caches.

/// Chapter cache key: `"{book}-{chapter}-{version}"`.
pub fn chapter_key(book: &str, chapter: u32, version: &str) -> String {
    format!("{}-{}-{}", book, chapter, version)
}

/// Translation cache key: model, verse reference and a hash of the question.
///
/// The question is trimmed first so stray whitespace maps to the same entry.
pub fn translation_key(model: &str, verse: &str, question: &str) -> String {
    format!("{}:{}:{:08x}", model, verse, string_hash(question.trim()))
}

/// Stable 32-bit string hash (`h = h * 31 + unit` over UTF-16 code units).
///
/// Persisted keys depend on it, so it must never change between releases.
pub fn string_hash(s: &str) -> u32 {
    s.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as u32))
}

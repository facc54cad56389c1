//! Fuzzy full-text query construction for the entity index.

use crate::{Error, Result};

/// Characters with syntactic meaning in the Lucene query language.
const LUCENE_RESERVED: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\',
    '/',
];

/// Edit distance appended to every term.
pub const FUZZY_DISTANCE: u8 = 2;

/// Replace reserved characters with spaces and trim.
pub fn remove_lucene_chars(text: &str) -> String {
    text.chars()
        .map(|c| if LUCENE_RESERVED.contains(&c) { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Build `word~2 AND word~2 ...` from an entity name.
///
/// Every whitespace-separated token gets the fuzzy suffix; tokens are joined
/// with `AND`. Fails with [`Error::EmptyInput`] when nothing survives cleaning.
pub fn build_full_text_query(name: &str) -> Result<String> {
    let cleaned = remove_lucene_chars(name);
    let terms: Vec<String> = cleaned
        .split_whitespace()
        .map(|word| format!("{word}~{FUZZY_DISTANCE}"))
        .collect();

    if terms.is_empty() {
        return Err(Error::EmptyInput(name.to_string()));
    }

    Ok(terms.join(" AND "))
}

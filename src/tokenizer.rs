//! Query and chunk tokenization.
//!
//! Text is lowercased and reduced to runs of ASCII letters and digits,
//! optionally joined by hyphens. A term must start with a letter or digit
//! and be at least two characters long; stray single characters never
//! become terms. There is no stemming and no stop-word list.

use std::sync::LazyLock;

use regex::Regex;

static TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-z0-9][a-z0-9\-]+").expect("term pattern is valid")
});

/// Split `text` into normalized terms.
///
/// Never fails; empty input yields an empty vector.
///
/// # Examples
///
/// ```
/// use lexrag::tokenizer::tokenize;
///
/// assert_eq!(tokenize("Hard-Hats on SITE!"), vec!["hard-hats", "on", "site"]);
/// assert_eq!(tokenize("a b cd"), vec!["cd"]);
/// assert!(tokenize("").is_empty());
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TERM.find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

//! Free-text cleanup applied before anything user-written is stored.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

/// Drop anything that looks like a markup tag and trim surrounding whitespace.
pub fn strip_tags(input: &str) -> String {
    TAG.replace_all(input, "").trim().to_string()
}

/// Cut to at most `max` characters (not bytes).
pub fn truncate_chars(input: &str, max: usize) -> String {
    match input.char_indices().nth(max) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}

/// [`strip_tags`] followed by [`truncate_chars`].
pub fn clean(input: &str, max: usize) -> String {
    truncate_chars(&strip_tags(input), max)
}

/// Maximum number of characters in a result preview.
pub const DEFAULT_PREVIEW_CHARS: usize = 600;

/// Truncate `text` to at most `max_chars` characters, appending `...` when
/// anything was cut. Never splits a multi-byte character.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Round a score to four decimal places for display.
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("ééééé", 2), "éé...");
        assert_eq!(preview("🎉🎉🎉", 1), "🎉...");
    }

    #[test]
    fn preview_of_empty_text() {
        assert_eq!(preview("", 5), "");
    }

    #[test]
    fn single_line_collapses_whitespace() {
        assert_eq!(single_line("one\n\ntwo  three\t"), "one two three");
    }

    #[test]
    fn round_score_to_four_places() {
        assert_eq!(round_score(1.234_56), 1.2346);
        assert_eq!(round_score(0.0), 0.0);
    }
}

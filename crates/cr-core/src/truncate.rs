//! Character-limit truncation for untrusted text headed into a prompt.
//!
//! Limits count Unicode scalar values, so a cut never lands inside a
//! multi-byte character.

use std::borrow::Cow;

/// Marker appended to truncated news articles.
pub const ELLIPSIS: &str = "...";

/// Return at most the first `limit` characters of `text`.
pub fn truncate(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Borrowed(&text[..cut]),
        None => Cow::Borrowed(text),
    }
}

/// Like [`truncate`], but appends `marker` when anything was cut off.
pub fn truncate_with_marker<'a>(text: &'a str, limit: usize, marker: &str) -> Cow<'a, str> {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &text[..cut], marker)),
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate("Acme", 10), "Acme");
        assert_eq!(truncate("Acme", 4), "Acme");
        assert!(matches!(truncate("Acme", 4), Cow::Borrowed(_)));
    }

    #[test]
    fn test_long_text_cut_to_limit() {
        let text = "a".repeat(9000);
        let cut = truncate(&text, 8000);
        assert_eq!(cut.chars().count(), 8000);
    }

    #[test]
    fn test_zero_limit() {
        assert_eq!(truncate("Acme", 0), "");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn test_multibyte_boundary() {
        let text = "héllo wörld";
        let cut = truncate(text, 2);
        assert_eq!(cut, "hé");
    }

    #[test]
    fn test_marker_only_on_truncation() {
        assert_eq!(truncate_with_marker("short", 10, ELLIPSIS), "short");
        let cut = truncate_with_marker("abcdefghij", 4, ELLIPSIS);
        assert_eq!(cut, "abcd...");
        assert!(cut.chars().count() <= 4 + ELLIPSIS.len());
    }

    #[test]
    fn test_bound_holds_across_limits() {
        let text = "Acme builds widgets. Acme ships widgets worldwide.";
        for limit in 0..text.len() + 5 {
            let cut = truncate(text, limit);
            assert!(cut.chars().count() <= limit);
            if text.chars().count() <= limit {
                assert_eq!(cut, text);
            }
        }
    }
}

use std::borrow::Cow;

/// Shorten `s` to at most `max_chars` characters for log output, appending
/// `…` when anything was cut. Never splits a multi-byte character.
pub fn preview(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        None => Cow::Borrowed(s),
        Some((end, _)) => Cow::Owned(format!("{}…", &s[..end])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_borrowed() {
        assert!(matches!(preview("hello", 10), Cow::Borrowed("hello")));
    }

    #[test]
    fn exact_length_is_untouched() {
        assert_eq!(preview("hello", 5), "hello");
    }

    #[test]
    fn long_text_gets_ellipsis() {
        assert_eq!(preview("hello world", 5), "hello…");
    }

    #[test]
    fn multibyte_counts_characters() {
        assert_eq!(preview("नमस्ते दुनिया", 3), "नमस…");
        assert_eq!(preview("あいう", 2), "あい…");
    }

    #[test]
    fn zero_max() {
        assert_eq!(preview("hello", 0), "…");
        assert_eq!(preview("", 0), "");
    }
}

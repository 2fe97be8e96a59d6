use std::borrow::Cow;

/// Removes control characters from feed-supplied text.
///
/// Tab, newline and carriage return are kept. Everything else in the C0 and
/// C1 ranges (including ESC and DEL) is dropped, so attacker-controlled feed
/// content cannot carry terminal escape sequences into a UI.
///
/// Returns `Cow::Borrowed` when nothing needed removing.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_stripped(c)).collect())
}

fn is_stripped(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_borrowed() {
        let input = "Plain title\twith tab\r\nand newline";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_controls_removed() {
        let result = strip_control_chars("a\x00b\x07c\x1bd\x7fe\u{85}f");
        assert!(matches!(result, Cow::Owned(_)));
        assert_eq!(result, "abcdef");
    }

    #[test]
    fn test_unicode_preserved() {
        assert_eq!(strip_control_chars("café ☕ 日本"), "café ☕ 日本");
    }
}

use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Shown in place of a line break inside a value
const LINE_BREAK: char = '↵';

/// Number of terminal cells `s` occupies
#[inline]
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Longest prefix of `s` that fits in `max` terminal cells
pub fn prefix_by_width(s: &str, max: usize) -> &str {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// Make a value safe to print on one terminal line.
///
/// Line breaks (`\n`, `\r\n`, lone `\r`) become `↵`, tabs become a blank and any other
/// control character (ESC included) becomes `?`.
pub fn sanitize(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => out.push(LINE_BREAK),
            '\t' => out.push(' '),
            c if c.is_control() => out.push('?'),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("Déboucheur"), 10);
        assert_eq!(display_width("日本"), 4);
    }

    #[test]
    fn test_prefix_by_width() {
        assert_eq!(prefix_by_width("abcdef", 3), "abc");
        assert_eq!(prefix_by_width("abc", 10), "abc");
        assert_eq!(prefix_by_width("日本語", 3), "日");
        assert_eq!(prefix_by_width("Mélangeur", 2), "Mé");
        assert_eq!(prefix_by_width("abc", 0), "");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("plain Déboucheur"), "plain Déboucheur");
        assert!(matches!(sanitize("plain"), Cow::Borrowed(_)));
        assert_eq!(sanitize("line one\nline two"), "line one↵line two");
        assert_eq!(sanitize("a\r\nb\rc"), "a↵b↵c");
        assert_eq!(sanitize("esc\x1b[2Jx"), "esc?[2Jx");
        assert_eq!(sanitize("a\tb\x07"), "a b?");
        assert_eq!(display_width(&sanitize("x\ny")), 3);
    }
}

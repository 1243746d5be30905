//! Control-character sanitization for feed text.
//!
//! Titles and summaries scraped from remote feeds occasionally carry raw
//! control bytes (form feeds, vertical tabs, stray `\x01`...). Those are
//! illegal in XML 1.0 and corrupt the published file, so every free-text
//! field is passed through [`clean_text`] before rendering.

use once_cell::sync::Lazy;
use regex::Regex;

/// Control characters disallowed in XML 1.0 text. Tab, LF and CR stay.
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").expect("valid control-char regex"));

/// Remove XML-illegal control characters from `input`, preserving tab,
/// newline and carriage return. Returns the input unchanged (no allocation
/// beyond the `String`) when it is already clean.
pub fn clean_text(input: &str) -> String {
    if CONTROL_CHARS.is_match(input) {
        CONTROL_CHARS.replace_all(input, "").into_owned()
    } else {
        input.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_input_is_unchanged() {
        let s = "Fuzzing the kernel: coverage-guided exploration";
        assert_eq!(clean_text(s), s);
    }

    #[test]
    fn strips_disallowed_control_chars() {
        let s = "bad\u{0}title\u{8} here\u{b}\u{c}\u{1f}!";
        assert_eq!(clean_text(s), "badtitle here!");
    }

    #[test]
    fn keeps_tab_newline_carriage_return() {
        let s = "line one\n\tline two\r\n";
        assert_eq!(clean_text(s), s);
    }

    #[test]
    fn empty_input() {
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn unicode_text_survives() {
        let s = "Sécurité & 形式手法: μ-calculus";
        assert_eq!(clean_text(s), s);
    }
}

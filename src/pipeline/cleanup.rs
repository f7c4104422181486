//! Deterministic normalisation of extracted or generated text.
//!
//! Paragraph reflow splits on `"\n\n"`, so anything that hides a blank line
//! from that split has to go first: pdfium reports `\r\n` line ends, and a
//! line holding only spaces or a zero-width character is visually blank but
//! not textually. Rules run in order:
//!
//! 1. CRLF / CR → LF
//! 2. strip invisible Unicode (zero-width, BOM, soft hyphen, word joiner)
//! 3. trim trailing whitespace on every line
//! 4. collapse runs of blank lines to a single blank line
//! 5. trim the whole text

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every rule in order.
pub fn clean_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace(['\r', '\u{000C}'], "\n")
}

const INVISIBLE: [char; 6] = [
    '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
];

fn remove_invisible_chars(input: &str) -> String {
    input.replace(INVISIBLE, "")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUN.replace_all(input, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc\u{000C}d"), "a\nb\nc\nd");
    }

    #[test]
    fn invisible_chars() {
        assert_eq!(
            remove_invisible_chars("co\u{00AD}operate\u{200B} now\u{FEFF}"),
            "cooperate now"
        );
    }

    #[test]
    fn whitespace_only_line_becomes_blank() {
        assert_eq!(clean_text("Title\n   \nBody."), "Title\n\nBody.");
        assert_eq!(clean_text("Title\n\u{200B}\nBody."), "Title\n\nBody.");
    }

    #[test]
    fn blank_runs_collapse() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn full_pass_on_pdf_text() {
        let raw = "\u{FEFF}Summary  \r\n\r\n\r\n\r\nThis is a longer paragraph that ends with a period.\r\n";
        assert_eq!(
            clean_text(raw),
            "Summary\n\nThis is a longer paragraph that ends with a period."
        );
    }

    #[test]
    fn single_line_breaks_kept() {
        assert_eq!(clean_text("one\ntwo"), "one\ntwo");
    }
}

//! Prompts for the structuring request.
//!
//! The reply is read by the paragraph classifier, so the prompt asks for
//! exactly the conventions that classifier understands: blank-line separated
//! paragraphs, short unpunctuated headings, `- ` bullets. Models still drift
//! into JSON now and then; [`crate::salvage`] handles that.
//!
//! Override via [`crate::config::ConversionConfig::system_prompt`].

/// Default system prompt for the structuring request.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You restructure text extracted from a PDF so it can be imported into a note-taking app.

Rules:

1. CONTENT
   - Keep every sentence of the source, in the original reading order
   - Rejoin words and sentences that were split across line breaks
   - Drop page numbers and headers or footers repeated on every page

2. LAYOUT
   - Separate every paragraph, heading and list item with one blank line
   - Write each heading on its own, shorter than 100 characters, without a trailing period
   - End every ordinary paragraph with a period
   - Start each list item with "- "

3. OUTPUT
   - Plain text only: no Markdown headings (#), no bold, no tables, no code fences
   - No JSON
   - No commentary before or after the text"#;

/// User message wrapping the extracted text.
pub fn structuring_request(text: &str) -> String {
    format!("Restructure the following text:\n\n\"\"\"\n{}\n\"\"\"", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_matches_classifier_conventions() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("blank line"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("100 characters"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("\"- \""));
    }

    #[test]
    fn request_embeds_text() {
        let req = structuring_request("Hello\nworld");
        assert!(req.contains("\"\"\"\nHello\nworld\n\"\"\""));
    }
}

//! Salvage plain text out of a generation response.
//!
//! Models asked for structured text drift between three shapes:
//!
//! - plain text
//! - a bare JSON array of block-like objects
//! - that same array wrapped in a Markdown code fence
//!
//! [`GenerationResponse::parse`] resolves the shape once: fence lines are
//! dropped and the remainder is tried as JSON. Only a JSON *array* counts as
//! structured; anything else (invalid JSON, an object, a number) keeps the
//! raw response verbatim, fences included.
//!
//! Each array element is read best-effort: the rich-text runs under the
//! element's own `type` key (`{"type": "paragraph", "paragraph": {"rich_text":
//! [...]}}`), then any known block container, then a top-level `rich_text`,
//! then a flat `text` or `content` string. Elements with nothing readable
//! contribute no text.

use crate::block::{Block, BlockKind, BlockSequence};
use crate::error::Pdf2NotionError;
use crate::reflow::{strip_list_markers, ParagraphReflow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Block container keys used by the document API.
const CONTAINER_KEYS: [&str; 6] = [
    "paragraph",
    "heading_1",
    "heading_2",
    "heading_3",
    "bulleted_list_item",
    "numbered_list_item",
];

static RE_FENCE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[^\n]*(?:\n|$)").unwrap());

/// One element recovered from a JSON block array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalvagedBlock {
    /// Type named by the element, if any.
    pub kind: Option<BlockKind>,
    /// Recovered text, possibly empty.
    pub text: String,
}

/// A generation response after shape resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResponse {
    /// Not a JSON array; holds the raw response verbatim.
    Text(String),
    /// A JSON array of block-like elements.
    Blocks(Vec<SalvagedBlock>),
}

impl GenerationResponse {
    pub fn parse(raw: &str) -> Self {
        let unfenced = RE_FENCE_LINE.replace_all(raw, "");
        match serde_json::from_str::<Value>(unfenced.trim()) {
            Ok(Value::Array(items)) => {
                debug!("Generation response is a JSON array of {} items", items.len());
                GenerationResponse::Blocks(items.iter().map(salvage_element).collect())
            }
            _ => GenerationResponse::Text(raw.to_string()),
        }
    }

    /// Flatten to the blank-line separated text paragraph reflow reads.
    pub fn into_text(self) -> String {
        match self {
            GenerationResponse::Text(text) => text,
            GenerationResponse::Blocks(blocks) => blocks
                .into_iter()
                .map(|b| b.text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    /// Build blocks directly, keeping element types where the response named them.
    ///
    /// Untyped elements and plain-text responses go through `classifier`.
    pub fn into_blocks(self, classifier: &ParagraphReflow) -> BlockSequence {
        match self {
            GenerationResponse::Text(text) => classifier.reflow_text(&text),
            GenerationResponse::Blocks(blocks) => blocks
                .into_iter()
                .filter_map(|b| match b.kind {
                    Some(BlockKind::BulletItem) => {
                        Block::new(BlockKind::BulletItem, strip_list_markers(&b.text))
                    }
                    Some(kind) => Block::new(kind, &b.text),
                    None => classifier.classify(&b.text),
                })
                .collect(),
        }
    }

    /// True for a block array from which no text could be read.
    pub fn is_unrecoverable(&self) -> bool {
        match self {
            GenerationResponse::Text(_) => false,
            GenerationResponse::Blocks(blocks) => blocks.iter().all(|b| b.text.is_empty()),
        }
    }
}

/// Reduce a raw generation response to plain text.
///
/// Never fails. A block array with no readable text yields an empty string
/// (and therefore an empty block sequence) after logging a warning.
pub fn salvage_text(raw: &str) -> String {
    salvage_response(GenerationResponse::parse(raw))
}

/// [`salvage_text`] for a response that has already been parsed.
pub fn salvage_response(response: GenerationResponse) -> String {
    if response.is_unrecoverable() {
        let err = Pdf2NotionError::MalformedGenerationResponse {
            detail: "JSON array without readable text".into(),
        };
        warn!("{err}; continuing with an empty document");
    }
    response.into_text()
}

fn salvage_element(value: &Value) -> SalvagedBlock {
    match value {
        Value::String(s) => SalvagedBlock {
            kind: None,
            text: s.trim().to_string(),
        },
        Value::Object(map) => {
            let type_name = map.get("type").and_then(Value::as_str);
            SalvagedBlock {
                kind: type_name.map(BlockKind::from_type_name),
                text: object_text(map, type_name).trim().to_string(),
            }
        }
        _ => SalvagedBlock {
            kind: None,
            text: String::new(),
        },
    }
}

fn object_text(map: &Map<String, Value>, type_name: Option<&str>) -> String {
    let typed = type_name.and_then(|t| map.get(t)).map(rich_text);
    if let Some(text) = typed.filter(|t| !t.is_empty()) {
        return text;
    }

    for key in CONTAINER_KEYS {
        if let Some(text) = map.get(key).map(rich_text).filter(|t| !t.is_empty()) {
            return text;
        }
    }

    let top_level = map.get("rich_text").map(runs_text).unwrap_or_default();
    if !top_level.is_empty() {
        return top_level;
    }

    ["text", "content"]
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

/// Concatenate the runs of `container.rich_text`.
fn rich_text(container: &Value) -> String {
    container
        .get("rich_text")
        .map(runs_text)
        .unwrap_or_default()
}

fn runs_text(runs: &Value) -> String {
    runs.as_array()
        .map(|runs| {
            runs.iter()
                .filter_map(|run| {
                    run.pointer("/text/content")
                        .or_else(|| run.get("plain_text"))
                        .and_then(Value::as_str)
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_flat_text_array() {
        assert_eq!(salvage_text("```json\n[{\"text\":\"Hello\"}]\n```"), "Hello");
    }

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(salvage_text("Hello world"), "Hello world");
    }

    #[test]
    fn non_array_json_is_verbatim() {
        let raw = "```json\n{\"text\": \"Hello\"}\n```";
        assert_eq!(salvage_text(raw), raw);
        assert_eq!(salvage_text("42"), "42");
    }

    #[test]
    fn invalid_json_is_verbatim() {
        let raw = "```\n[{\"text\": \"unterminated\"\n```";
        assert_eq!(salvage_text(raw), raw);
    }

    #[test]
    fn document_api_shapes() {
        let raw = r#"[
            {"object": "block", "type": "heading_2",
             "heading_2": {"rich_text": [{"type": "text", "text": {"content": "Overview"}}]}},
            {"type": "paragraph",
             "paragraph": {"rich_text": [
                {"type": "text", "text": {"content": "First half, "}},
                {"type": "text", "text": {"content": "second half."}}
             ]}},
            {"type": "divider", "divider": {}},
            {"bulleted_list_item": {"rich_text": [{"plain_text": "Point"}]}}
        ]"#;
        assert_eq!(
            salvage_text(raw),
            "Overview\n\nFirst half, second half.\n\nPoint"
        );
    }

    #[test]
    fn string_elements_and_junk() {
        let raw = r#"["  one  ", 7, null, {"content": "two"}]"#;
        assert_eq!(salvage_text(raw), "one\n\ntwo");
    }

    #[test]
    fn unrecoverable_array_gives_empty_text() {
        let response = GenerationResponse::parse("[{}, {\"type\": \"divider\"}]");
        assert!(response.is_unrecoverable());
        assert_eq!(response.into_text(), "");
        assert!(!GenerationResponse::parse("just text").is_unrecoverable());
    }

    #[test]
    fn typed_blocks_keep_their_kind() {
        let raw = r#"[
            {"type": "heading_1", "heading_1": {"rich_text": [{"text": {"content": "A long heading that ends with a period."}}]}},
            {"type": "numbered_list_item", "numbered_list_item": {"rich_text": [{"text": {"content": "first"}}]}},
            {"type": "bulleted_list_item", "text": "- dashed"},
            {"text": "Untyped"}
        ]"#;
        let blocks = GenerationResponse::parse(raw).into_blocks(&ParagraphReflow::default());
        assert_eq!(
            blocks.kinds(),
            vec![
                BlockKind::Heading,
                BlockKind::NumberedItem,
                BlockKind::BulletItem,
                BlockKind::Heading,
            ]
        );
        assert_eq!(blocks.as_slice()[2].text(), "dashed");
    }

    #[test]
    fn typed_bullets_keep_leading_dashes_of_content() {
        let raw = r#"[
            {"type": "bulleted_list_item", "text": "-5 degrees overnight"},
            {"type": "bulleted_list_item", "text": "--flag enables tracing"},
            {"type": "bulleted_list_item", "text": "• - nested"}
        ]"#;
        let blocks = GenerationResponse::parse(raw).into_blocks(&ParagraphReflow::default());
        let texts: Vec<&str> = blocks.iter().map(Block::text).collect();
        assert_eq!(
            texts,
            vec!["-5 degrees overnight", "--flag enables tracing", "nested"]
        );
    }
}

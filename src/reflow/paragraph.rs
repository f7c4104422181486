//! Paragraph reflow over one flat text string.
//!
//! The input is split on blank lines and each paragraph is classified by
//! shallow textual cues, checked in priority order:
//!
//! 1. short (fewer than `max_heading_chars` characters) and not ending in a
//!    period → [`BlockKind::Heading`]
//! 2. starts with `•` or `-` → [`BlockKind::BulletItem`], marker stripped
//! 3. anything else → [`BlockKind::Paragraph`]
//!
//! Because the heading test runs first, a short unpunctuated bullet line is a
//! heading. `bullets_first` swaps the first two checks.

use crate::block::{Block, BlockKind, BlockSequence};
use crate::error::Pdf2NotionError;
use crate::reflow::{PageFurniture, ReflowOutput, ReflowStrategy};
use serde::{Deserialize, Serialize};

/// Paragraphs shorter than this many characters may be headings.
pub const DEFAULT_MAX_HEADING_CHARS: usize = 100;

/// Characters recognised as list markers.
pub const BULLET_MARKERS: [char; 2] = ['•', '-'];

/// Text-only classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphReflow {
    pub max_heading_chars: usize,
    /// Check the bullet marker before the heading rule.
    pub bullets_first: bool,
}

impl Default for ParagraphReflow {
    fn default() -> Self {
        Self {
            max_heading_chars: DEFAULT_MAX_HEADING_CHARS,
            bullets_first: false,
        }
    }
}

impl ParagraphReflow {
    /// Reflow `text` into blocks. Never fails; empty input gives an empty sequence.
    pub fn reflow_text(&self, text: &str) -> BlockSequence {
        split_paragraphs(text)
            .filter_map(|p| self.classify(p))
            .collect()
    }

    /// Classify a single paragraph. `None` when it is blank.
    pub fn classify(&self, paragraph: &str) -> Option<Block> {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            return None;
        }

        if self.bullets_first {
            if let Some(block) = bullet_block(paragraph) {
                return Some(block);
            }
            if self.is_heading(paragraph) {
                return Block::heading(paragraph);
            }
        } else {
            if self.is_heading(paragraph) {
                return Block::heading(paragraph);
            }
            if let Some(block) = bullet_block(paragraph) {
                return Some(block);
            }
        }

        Block::paragraph(paragraph)
    }

    fn is_heading(&self, paragraph: &str) -> bool {
        paragraph.chars().count() < self.max_heading_chars && !paragraph.ends_with('.')
    }
}

impl ReflowStrategy for ParagraphReflow {
    type Input = str;

    fn name(&self) -> &'static str {
        "paragraph"
    }

    fn reflow(&self, input: &str) -> Result<ReflowOutput, Pdf2NotionError> {
        Ok(ReflowOutput {
            blocks: self.reflow_text(input),
            furniture: PageFurniture::default(),
            page_count: None,
        })
    }
}

/// Paragraphs separated by two consecutive newlines, blanks discarded.
fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

/// Strip one leading marker, then any further markers followed by whitespace.
///
/// Falls through (returns `None`) when the paragraph has no marker or when
/// nothing but markers is left.
fn bullet_block(paragraph: &str) -> Option<Block> {
    let rest = paragraph.strip_prefix(BULLET_MARKERS)?;
    Block::new(BlockKind::BulletItem, strip_list_markers(rest))
}

/// Remove leading list markers from text already known to be a list item.
///
/// `•` is always a marker. `-` only counts when whitespace follows, so
/// `-5 degrees` and `--flag` keep their dashes.
pub fn strip_list_markers(text: &str) -> &str {
    let mut rest = text.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix('•') {
            rest = after.trim_start();
        } else if let Some(after) = rest
            .strip_prefix('-')
            .filter(|after| after.starts_with(char::is_whitespace))
        {
            rest = after.trim_start();
        } else {
            return rest;
        }
    }
}

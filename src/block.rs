//! Block data model: the typed unit of content handed to the publisher.
//!
//! A [`Block`] is built once by a classifier and never mutated afterwards.
//! Its text is always trimmed and non-empty; [`Block::new`] returns `None`
//! rather than constructing a block that would violate that.
//!
//! A [`BlockSequence`] is the document in reading order. Nothing in this
//! module truncates it: the 100-block request cap belongs to
//! [`crate::publish::to_publish_payload`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    #[default]
    Paragraph,
    /// List item whose marker (`•` / `-`) has already been stripped.
    BulletItem,
    /// Only produced by typed generation responses.
    NumberedItem,
}

impl BlockKind {
    /// Map a document-API block type name onto a kind.
    ///
    /// Unrecognised names fall back to [`BlockKind::Paragraph`].
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "heading" | "heading_1" | "heading_2" | "heading_3" => BlockKind::Heading,
            "bullet" | "bullet_item" | "bulleted_list_item" => BlockKind::BulletItem,
            "numbered" | "numbered_item" | "numbered_list_item" => BlockKind::NumberedItem,
            _ => BlockKind::Paragraph,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::BulletItem => "bullet_item",
            BlockKind::NumberedItem => "numbered_item",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed unit of structured content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct Block {
    pub kind: BlockKind,
    text: String,
}

/// Wire shape of a [`Block`], checked on the way in.
#[derive(Deserialize)]
struct RawBlock {
    kind: BlockKind,
    text: String,
}

impl TryFrom<RawBlock> for Block {
    type Error = String;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        Block::new(raw.kind, &raw.text)
            .ok_or_else(|| format!("{} block has no text", raw.kind))
    }
}

impl Block {
    /// Build a block, trimming `text`. Returns `None` when nothing is left.
    pub fn new(kind: BlockKind, text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            text: text.to_string(),
        })
    }

    pub fn heading(text: impl AsRef<str>) -> Option<Self> {
        Self::new(BlockKind::Heading, text)
    }

    pub fn paragraph(text: impl AsRef<str>) -> Option<Self> {
        Self::new(BlockKind::Paragraph, text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Ordered list of blocks. Insertion order is reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockSequence(Vec<Block>);

impl BlockSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) {
        self.0.push(block);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Block] {
        &self.0
    }

    /// Number of blocks of the given kind.
    pub fn count_kind(&self, kind: BlockKind) -> usize {
        self.0.iter().filter(|b| b.kind == kind).count()
    }

    /// Kinds in order, handy for assertions and logging.
    pub fn kinds(&self) -> Vec<BlockKind> {
        self.0.iter().map(|b| b.kind).collect()
    }

    /// Texts joined with blank-line separators, the shape paragraph reflow reads.
    pub fn to_plain_text(&self) -> String {
        self.0
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl From<Vec<Block>> for BlockSequence {
    fn from(blocks: Vec<Block>) -> Self {
        Self(blocks)
    }
}

impl FromIterator<Block> for BlockSequence {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for BlockSequence {
    type Item = Block;
    type IntoIter = std::vec::IntoIter<Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a BlockSequence {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

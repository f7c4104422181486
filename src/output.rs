//! Results of a conversion.

use crate::block::{BlockKind, BlockSequence};
use crate::config::StrategyKind;
use crate::publish::PublishedPage;
use crate::reflow::PageFurniture;
use serde::{Deserialize, Serialize};

/// Blocks and everything learned while producing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub blocks: BlockSequence,
    /// Repeated headers/footers; empty unless the geometric strategy ran.
    pub furniture: PageFurniture,
    pub metadata: DocumentMetadata,
    /// Input file name without extension, when there was one.
    pub file_stem: Option<String>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Page title: `explicit`, else the PDF title, else the file stem.
    pub fn title(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or(self.metadata.title.as_deref())
            .or(self.file_stem.as_deref())
            .unwrap_or(UNTITLED)
            .to_string()
    }
}

const UNTITLED: &str = "Untitled";

/// Outcome of publishing one block sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReport {
    pub page: PublishedPage,
    pub title: String,
    pub published_blocks: usize,
    /// Blocks past the per-request cap.
    pub dropped_blocks: usize,
    pub duration_ms: u64,
}

/// PDF document information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Counters for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub strategy: StrategyKind,
    pub total_pages: usize,
    pub extracted_pages: usize,
    pub headings: usize,
    pub paragraphs: usize,
    pub bullet_items: usize,
    pub numbered_items: usize,
    /// Whether the LLM structuring pass ran.
    pub generated: bool,
    /// The LLM reply was a JSON block array rather than text.
    pub salvaged_json: bool,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub extract_duration_ms: u64,
    pub generate_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl ConversionStats {
    pub fn total_blocks(&self) -> usize {
        self.headings + self.paragraphs + self.bullet_items + self.numbered_items
    }

    /// Fill the per-kind counters from `blocks`.
    pub fn count_blocks(&mut self, blocks: &BlockSequence) {
        self.headings = blocks.count_kind(BlockKind::Heading);
        self.paragraphs = blocks.count_kind(BlockKind::Paragraph);
        self.bullet_items = blocks.count_kind(BlockKind::BulletItem);
        self.numbered_items = blocks.count_kind(BlockKind::NumberedItem);
    }
}

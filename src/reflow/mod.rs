//! Text-to-block reflow.
//!
//! Two strategies turn extracted text into a [`BlockSequence`]:
//!
//! * [`paragraph`] works on one flat string (raw PDF text or
//!   a generation response).
//! * [`geometric`] works on per-page positioned fragments and
//!   removes repeated headers/footers.
//!
//! They take different input shapes, so each implements [`ReflowStrategy`]
//! with its own `Input`. [`reflow`] is the single entry point used by the
//! pipeline; it rejects an input whose shape does not match the strategy.
//!
//! Everything here is synchronous and pure.

pub mod furniture;
pub mod geometric;
pub mod lines;
pub mod paragraph;

pub use furniture::{PageFurniture, PageLineIndex};
pub use geometric::{GeometricReflow, GeometryThresholds};
pub use lines::{Fragment, Line, PageFragments};
pub use paragraph::{strip_list_markers, ParagraphReflow};

use crate::block::BlockSequence;
use crate::error::Pdf2NotionError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A reflow algorithm over one input shape.
pub trait ReflowStrategy {
    type Input: ?Sized;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn reflow(&self, input: &Self::Input) -> Result<ReflowOutput, Pdf2NotionError>;
}

/// Blocks plus whatever the strategy learned about the page layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflowOutput {
    pub blocks: BlockSequence,
    /// Empty for the paragraph strategy.
    pub furniture: PageFurniture,
    /// Pages seen by the strategy; `None` when it only saw flat text.
    pub page_count: Option<usize>,
}

/// Reflow input as produced by extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ReflowInput {
    Text(String),
    Pages(Vec<PageFragments>),
}

impl ReflowInput {
    fn shape(&self) -> &'static str {
        match self {
            ReflowInput::Text(_) => "text",
            ReflowInput::Pages(_) => "positioned pages",
        }
    }
}

/// Selected strategy with its configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Paragraph(ParagraphReflow),
    Geometric(GeometricReflow),
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Paragraph(ParagraphReflow::default())
    }
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Paragraph(s) => s.name(),
            Strategy::Geometric(s) => s.name(),
        }
    }
}

/// Run `strategy` over `input`.
///
/// # Errors
/// [`Pdf2NotionError::ParseFailure`] when the input shape does not match the
/// strategy or the geometry is malformed.
pub fn reflow(input: &ReflowInput, strategy: &Strategy) -> Result<ReflowOutput, Pdf2NotionError> {
    let output = match (strategy, input) {
        (Strategy::Paragraph(s), ReflowInput::Text(text)) => s.reflow(text)?,
        (Strategy::Geometric(s), ReflowInput::Pages(pages)) => s.reflow(pages)?,
        (s, input) => {
            return Err(Pdf2NotionError::ParseFailure(format!(
                "{} reflow cannot read {} input",
                s.name(),
                input.shape()
            )))
        }
    };
    debug!(
        "{} reflow produced {} blocks",
        strategy.name(),
        output.blocks.len()
    );
    Ok(output)
}

//! # pdf2notion
//!
//! Turn a PDF into a Notion page made of typed blocks (headings, paragraphs,
//! list items).
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   flat text or positioned fragments via pdfium
//!  ├─ 3. Generate  optional LLM restructuring pass (+ salvage of its reply)
//!  ├─ 4. Reflow    paragraph classifier or geometric line reflow
//!  └─ 5. Publish   first 100 blocks → Notion page
//! ```
//!
//! ## Reflow strategies
//!
//! | Strategy | Input | Heuristics |
//! |----------|-------|------------|
//! | `paragraph` (default) | one text string | blank-line paragraphs; short & unpunctuated → heading; `•`/`-` → bullet |
//! | `geometric` | per-page fragments with `y` and height | line grouping, repeated header/footer removal, font-size headings |
//!
//! The reflow core ([`reflow()`], [`salvage`], [`to_publish_payload`]) is
//! synchronous and pure; it can be used without pdfium or network access.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2notion::{convert_and_publish, ConversionConfig, NotionConfig, NotionPublisher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let publisher = NotionPublisher::new(NotionConfig::new("secret_…", "database-id"))?;
//!     let (output, report) = convert_and_publish("report.pdf", &config, &publisher, None).await?;
//!     eprintln!("{} blocks → {}", output.blocks.len(), report.page.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2notion` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod block;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod publish;
pub mod reflow;
pub mod salvage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use block::{Block, BlockKind, BlockSequence};
pub use config::{ConversionConfig, ConversionConfigBuilder, PageSelection, StrategyKind};
pub use convert::{
    convert, convert_and_publish, convert_from_bytes, convert_sync, convert_with_generator,
    inspect, publish_blocks, structure, write_payload, Structured,
};
pub use error::Pdf2NotionError;
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PublishReport};
pub use pipeline::generate::{Generated, LlmGenerator, TextGenerator};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use publish::{
    to_publish_payload, NotionConfig, NotionPublisher, PublishRequest, PublishedPage, Publisher,
    MAX_BLOCKS_PER_REQUEST,
};
pub use reflow::{
    reflow, Fragment, GeometricReflow, GeometryThresholds, PageFragments, PageFurniture,
    ParagraphReflow, ReflowInput, ReflowOutput, ReflowStrategy, Strategy,
};
pub use salvage::{salvage_text, GenerationResponse};

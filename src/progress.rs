//! Stage events for a running conversion.
//!
//! A conversion walks a fixed chain of [`Stage`]s, each awaited before the
//! next begins; a callback set through
//! [`crate::config::ConversionConfigBuilder::progress_callback`] hears about
//! every transition. All methods default to no-ops.
//!
//! # Example
//!
//! ```rust
//! use pdf2notion::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_stage_complete(&self, stage: Stage, summary: &str) {
//!         eprintln!("{stage}: {summary}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One step of the conversion chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Generate,
    Reflow,
    Publish,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Extract => "Extracting text",
            Stage::Generate => "Structuring with LLM",
            Stage::Reflow => "Reflowing blocks",
            Stage::Publish => "Publishing page",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Extract => "extract",
            Stage::Generate => "generate",
            Stage::Reflow => "reflow",
            Stage::Publish => "publish",
        })
    }
}

/// Receives stage events. Must be `Send + Sync`; stages may run on
/// blocking worker threads.
pub trait ConversionProgressCallback: Send + Sync {
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// `summary` is a short human-readable result, e.g. `"12 pages"`.
    fn on_stage_complete(&self, stage: Stage, summary: &str) {
        let _ = (stage, summary);
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

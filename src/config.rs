//! Configuration for a PDF → Notion conversion.
//!
//! [`ConversionConfig`] covers extraction, generation and reflow. Publishing
//! credentials live separately in [`crate::publish::NotionConfig`] and are
//! handed to the publisher explicitly; nothing here reads the environment
//! except LLM provider auto-detection.
//!
//! # Example
//! ```rust
//! use pdf2notion::{ConversionConfig, StrategyKind};
//!
//! let config = ConversionConfig::builder()
//!     .strategy(StrategyKind::Geometric)
//!     .repeat_ratio(0.8)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.geometric.thresholds.repeat_ratio, 0.8);
//! ```

use crate::error::Pdf2NotionError;
use crate::progress::ProgressCallback;
use crate::reflow::{GeometricReflow, ParagraphReflow, Strategy};
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Conversion settings. Build with [`ConversionConfig::builder`].
#[derive(Clone)]
pub struct ConversionConfig {
    /// Reflow strategy. Default: [`StrategyKind::Paragraph`].
    pub strategy: StrategyKind,

    /// Paragraph classifier settings.
    pub paragraph: ParagraphReflow,

    /// Geometric reflow thresholds.
    pub geometric: GeometricReflow,

    /// Send the extracted text through the LLM before paragraph reflow. Default: false.
    ///
    /// Only valid with the paragraph strategy.
    pub generate: bool,

    /// When the LLM answers with a typed JSON block array, keep its block
    /// types instead of re-classifying the text. Default: false.
    pub trust_generated_types: bool,

    /// LLM model identifier, e.g. "gpt-4.1-nano".
    pub model: Option<String>,

    /// LLM provider name ("openai", "anthropic", "ollama", ...).
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum output tokens for the structuring reply. Default: 4096.
    pub max_tokens: usize,

    /// Custom system prompt. `None` uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Pages to extract. Default: all.
    pub pages: PageSelection,

    /// User password for encrypted PDFs.
    pub password: Option<String>,

    /// Download timeout for URL inputs, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Stage events. `None` disables them.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            paragraph: ParagraphReflow::default(),
            geometric: GeometricReflow::default(),
            generate: false,
            trust_generated_types: false,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            system_prompt: None,
            pages: PageSelection::default(),
            password: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("strategy", &self.strategy)
            .field("paragraph", &self.paragraph)
            .field("geometric", &self.geometric)
            .field("generate", &self.generate)
            .field("trust_generated_types", &self.trust_generated_types)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configured reflow strategy with its settings.
    pub fn reflow_strategy(&self) -> Strategy {
        match self.strategy {
            StrategyKind::Paragraph => Strategy::Paragraph(self.paragraph.clone()),
            StrategyKind::Geometric => Strategy::Geometric(self.geometric.clone()),
        }
    }

    pub fn validate(&self) -> Result<(), Pdf2NotionError> {
        if self.generate && self.strategy == StrategyKind::Geometric {
            return Err(Pdf2NotionError::InvalidConfig(
                "LLM generation needs the paragraph strategy; the geometric strategy reads \
                 page positions, which a generated reply does not have"
                    .into(),
            ));
        }
        if self.paragraph.max_heading_chars == 0 {
            return Err(Pdf2NotionError::InvalidConfig(
                "maximum heading length must be at least 1 character".into(),
            ));
        }
        self.geometric.thresholds.validate()
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn strategy(mut self, kind: StrategyKind) -> Self {
        self.config.strategy = kind;
        self
    }

    pub fn max_heading_chars(mut self, n: usize) -> Self {
        self.config.paragraph.max_heading_chars = n;
        self
    }

    pub fn bullets_first(mut self, v: bool) -> Self {
        self.config.paragraph.bullets_first = v;
        self
    }

    pub fn line_tolerance(mut self, units: f32) -> Self {
        self.config.geometric.thresholds.line_tolerance = units;
        self
    }

    pub fn repeat_ratio(mut self, ratio: f64) -> Self {
        self.config.geometric.thresholds.repeat_ratio = ratio;
        self
    }

    pub fn heading_dominance_ratio(mut self, ratio: f64) -> Self {
        self.config.geometric.thresholds.heading_dominance_ratio = ratio;
        self
    }

    pub fn heading_min_height(mut self, units: f32) -> Self {
        self.config.geometric.thresholds.heading_min_height = units;
        self
    }

    pub fn generate(mut self, v: bool) -> Self {
        self.config.generate = v;
        self
    }

    pub fn trust_generated_types(mut self, v: bool) -> Self {
        self.config.trust_generated_types = v;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2NotionError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which reflow algorithm turns extracted content into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Classify blank-line separated paragraphs of flat text.
    #[default]
    Paragraph,
    /// Group positioned fragments into lines, strip repeated headers and
    /// footers, detect headings by font size.
    Geometric,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrategyKind::Paragraph => "paragraph",
            StrategyKind::Geometric => "geometric",
        })
    }
}

/// Pages to extract, 1-indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    #[default]
    All,
    Single(usize),
    /// Inclusive range.
    Range(usize, usize),
    Set(Vec<usize>),
}

impl PageSelection {
    /// Sorted, deduplicated 0-indexed pages that exist in a document of
    /// `total_pages` pages.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let in_range = |p: &usize| (1..=total_pages).contains(p);
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => Some(*p).filter(in_range).map(|p| p - 1).into_iter().collect(),
            PageSelection::Range(start, end) => {
                ((*start).max(1)..=(*end).min(total_pages)).map(|p| p - 1).collect()
            }
            PageSelection::Set(pages) => pages.iter().filter(|p| in_range(*p)).map(|p| p - 1).collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Whether any requested page falls outside `1..=total_pages`.
    pub fn exceeds(&self, total_pages: usize) -> bool {
        let outside = |p: usize| p == 0 || p > total_pages;
        match self {
            PageSelection::All => false,
            PageSelection::Single(p) => outside(*p),
            PageSelection::Range(start, end) => outside(*start) || outside(*end),
            PageSelection::Set(pages) => pages.iter().any(|p| outside(*p)),
        }
    }

    /// Lowest page the selection asks for, if it names any.
    pub fn first_requested(&self) -> Option<usize> {
        match self {
            PageSelection::All => None,
            PageSelection::Single(p) | PageSelection::Range(p, _) => Some(*p),
            PageSelection::Set(pages) => pages.iter().copied().min(),
        }
    }
}

impl FromStr for PageSelection {
    type Err = Pdf2NotionError;

    /// Parse `all`, `5`, `3-15` or `1,3,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let invalid = |why: String| Pdf2NotionError::InvalidConfig(format!("page selection '{s}': {why}"));
        let page = |p: &str| -> Result<usize, Pdf2NotionError> {
            match p.trim().parse::<usize>() {
                Ok(0) => Err(invalid("pages are 1-indexed".into())),
                Ok(n) => Ok(n),
                Err(_) => Err(invalid(format!("'{}' is not a page number", p.trim()))),
            }
        };

        if s == "all" {
            return Ok(PageSelection::All);
        }
        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (page(start)?, page(end)?);
            if start > end {
                return Err(invalid("range start is after its end".into()));
            }
            return Ok(PageSelection::Range(start, end));
        }
        if s.contains(',') {
            return s
                .split(',')
                .map(page)
                .collect::<Result<Vec<_>, _>>()
                .map(PageSelection::Set);
        }
        page(&s).map(PageSelection::Single)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConversionConfig::default();
        assert_eq!(config.strategy, StrategyKind::Paragraph);
        assert_eq!(config.paragraph.max_heading_chars, 100);
        assert_eq!(config.geometric.thresholds.line_tolerance, 2.0);
        assert_eq!(config.geometric.thresholds.repeat_ratio, 0.7);
        assert_eq!(config.geometric.thresholds.heading_dominance_ratio, 0.7);
        assert_eq!(config.geometric.thresholds.heading_min_height, 10.0);
        assert!(!config.generate);
        assert_eq!(config.download_timeout_secs, 120);
    }

    #[test]
    fn generate_requires_paragraph_strategy() {
        let err = ConversionConfig::builder()
            .strategy(StrategyKind::Geometric)
            .generate(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2NotionError::InvalidConfig(_)));
        assert!(ConversionConfig::builder().generate(true).build().is_ok());
    }

    #[test]
    fn thresholds_are_validated() {
        assert!(ConversionConfig::builder().repeat_ratio(1.2).build().is_err());
        assert!(ConversionConfig::builder().max_heading_chars(0).build().is_err());
    }

    #[test]
    fn reflow_strategy_carries_settings() {
        let config = ConversionConfig::builder()
            .bullets_first(true)
            .build()
            .unwrap();
        match config.reflow_strategy() {
            Strategy::Paragraph(p) => assert!(p.bullets_first),
            other => panic!("unexpected {other:?}"),
        }
        let config = ConversionConfig::builder()
            .strategy(StrategyKind::Geometric)
            .heading_min_height(14.0)
            .build()
            .unwrap();
        match config.reflow_strategy() {
            Strategy::Geometric(g) => assert_eq!(g.thresholds.heading_min_height, 14.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn debug_hides_secrets() {
        let config = ConversionConfig::builder().password("hunter2").build().unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert!(PageSelection::Single(6).to_indices(5).is_empty());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(4, 9).to_indices(5), vec![3, 4]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3, 9]).to_indices(5), vec![0, 2]);
    }

    #[test]
    fn page_selection_parse() {
        assert_eq!("all".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!("7".parse::<PageSelection>().unwrap(), PageSelection::Single(7));
        assert_eq!(" 3-15 ".parse::<PageSelection>().unwrap(), PageSelection::Range(3, 15));
        assert_eq!(
            "1,3,5".parse::<PageSelection>().unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
        assert!("0".parse::<PageSelection>().is_err());
        assert!("5-2".parse::<PageSelection>().is_err());
        assert!("1,x".parse::<PageSelection>().is_err());
    }

    #[test]
    fn exceeds_detects_skipped_pages() {
        assert!(!PageSelection::All.exceeds(3));
        assert!(!PageSelection::Range(1, 3).exceeds(3));
        assert!(PageSelection::Range(2, 9).exceeds(3));
        assert!(PageSelection::Set(vec![1, 4]).exceeds(3));
        assert!(PageSelection::Single(0).exceeds(3));
    }

    #[test]
    fn first_requested_page() {
        assert_eq!(PageSelection::All.first_requested(), None);
        assert_eq!(PageSelection::Range(4, 8).first_requested(), Some(4));
        assert_eq!(PageSelection::Set(vec![9, 2]).first_requested(), Some(2));
    }
}

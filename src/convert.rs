//! Conversion entry points.
//!
//! One conversion is a strictly sequential chain: resolve input, extract,
//! optionally generate, reflow, optionally publish. Every step is awaited
//! before the next starts and the first error ends the chain; nothing is
//! retried.

use crate::block::BlockSequence;
use crate::config::{ConversionConfig, StrategyKind};
use crate::error::Pdf2NotionError;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PublishReport};
use crate::pipeline::extract::{self, ExtractMode};
use crate::pipeline::generate::{Generated, LlmGenerator, TextGenerator};
use crate::pipeline::{cleanup, input};
use crate::progress::{ConversionProgressCallback, NoopProgressCallback, Stage};
use crate::publish::{to_publish_payload, NotionConfig, PublishRequest, Publisher};
use crate::reflow::{reflow, PageFurniture, ReflowInput, ReflowOutput};
use crate::salvage::{salvage_response, GenerationResponse};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

static NOOP: NoopProgressCallback = NoopProgressCallback;

/// Convert a PDF file or URL into a block sequence.
///
/// When `config.generate` is set, the LLM provider is resolved before the
/// document is opened so a missing API key fails fast.
///
/// # Errors
/// Any failure of the chain, e.g. [`Pdf2NotionError::FileNotFound`],
/// [`Pdf2NotionError::ExtractionFailed`] or
/// [`Pdf2NotionError::GenerationUnavailable`].
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2NotionError> {
    config.validate()?;
    let generator = if config.generate {
        Some(LlmGenerator::from_config(config)?)
    } else {
        None
    };
    let generator = generator.as_ref().map(|g| g as &dyn TextGenerator);

    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    convert_path(resolved.path(), resolved.stem(), config, generator).await
}

/// [`convert`] with a caller-supplied generator instead of an LLM provider.
///
/// The generator runs regardless of `config.generate`; the paragraph
/// strategy is required.
pub async fn convert_with_generator(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
    generator: &dyn TextGenerator,
) -> Result<ConversionOutput, Pdf2NotionError> {
    config.validate()?;
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    convert_path(resolved.path(), resolved.stem(), config, Some(generator)).await
}

/// Synchronous wrapper around [`convert`].
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2NotionError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2NotionError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Convert PDF bytes held in memory.
///
/// The bytes are spilled to a temp file that is removed on return.
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2NotionError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| Pdf2NotionError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| Pdf2NotionError::Internal(format!("tempfile write: {e}")))?;

    let mut output = convert(tmp.path().to_string_lossy(), config).await?;
    output.file_stem = None;
    Ok(output)
}

/// Read PDF metadata without extracting content. Needs no API key.
pub async fn inspect(
    input_str: impl AsRef<str>,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2NotionError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    extract::extract_metadata(resolved.path(), password).await
}

/// Publish `blocks` as one page titled `title`.
///
/// Blocks past the request cap are dropped and counted in the report.
pub async fn publish_blocks(
    blocks: &BlockSequence,
    title: &str,
    publisher: &dyn Publisher,
) -> Result<PublishReport, Pdf2NotionError> {
    let start = Instant::now();
    let request = to_publish_payload(blocks, title);
    let page = publisher.publish(&request).await?;
    info!(
        "Published '{}' ({} blocks, {} dropped)",
        request.title,
        request.children.len(),
        request.dropped
    );
    Ok(PublishReport {
        page,
        title: request.title,
        published_blocks: request.children.len(),
        dropped_blocks: request.dropped,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Convert and publish in one chain.
///
/// The page title is `title`, else the PDF's metadata title, else the
/// input file name.
pub async fn convert_and_publish(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
    publisher: &dyn Publisher,
    title: Option<&str>,
) -> Result<(ConversionOutput, PublishReport), Pdf2NotionError> {
    let output = convert(input_str, config).await?;
    let cb = callback(config);

    cb.on_stage_start(Stage::Publish);
    let report = staged(
        cb,
        Stage::Publish,
        publish_blocks(&output.blocks, &output.title(title), publisher).await,
    )?;
    cb.on_stage_complete(
        Stage::Publish,
        &format!("{} blocks published", report.published_blocks),
    );
    Ok((output, report))
}

/// Atomically write the publish payload as pretty JSON.
///
/// With `notion` the file holds the exact create-page body; without it, the
/// title and children only.
pub async fn write_payload(
    request: &PublishRequest,
    notion: Option<&NotionConfig>,
    path: impl AsRef<Path>,
) -> Result<(), Pdf2NotionError> {
    let path = path.as_ref();
    let write_failed = |source: std::io::Error| Pdf2NotionError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let body = match notion {
        Some(n) => request.to_body(&n.database_id, &n.title_property),
        None => serde_json::to_value(request)
            .map_err(|e| Pdf2NotionError::Internal(format!("payload serialisation: {e}")))?,
    };
    let json = serde_json::to_string_pretty(&body)
        .map_err(|e| Pdf2NotionError::Internal(format!("payload serialisation: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;
    debug!("Wrote payload to {}", path.display());
    Ok(())
}

/// Turn extracted content into blocks: cleanup, optional generation, reflow.
///
/// Pure apart from the generator call; usable without a PDF.
pub async fn structure(
    content: ReflowInput,
    config: &ConversionConfig,
    generator: Option<&dyn TextGenerator>,
) -> Result<Structured, Pdf2NotionError> {
    let cb = callback(config);
    let strategy = config.reflow_strategy();

    let (text, generator) = match (content, generator) {
        (ReflowInput::Text(text), Some(generator)) => (cleanup::clean_text(&text), generator),
        (ReflowInput::Text(text), None) => {
            cb.on_stage_start(Stage::Reflow);
            let input = ReflowInput::Text(cleanup::clean_text(&text));
            let reflowed = staged(cb, Stage::Reflow, reflow(&input, &strategy))?;
            cb.on_stage_complete(Stage::Reflow, &block_summary(&reflowed.blocks));
            return Ok(Structured::plain(reflowed));
        }
        (pages @ ReflowInput::Pages(_), None) => {
            cb.on_stage_start(Stage::Reflow);
            let reflowed = staged(cb, Stage::Reflow, reflow(&pages, &strategy))?;
            cb.on_stage_complete(Stage::Reflow, &block_summary(&reflowed.blocks));
            return Ok(Structured::plain(reflowed));
        }
        (ReflowInput::Pages(_), Some(_)) => {
            return Err(Pdf2NotionError::InvalidConfig(
                "LLM generation needs flat text; use the paragraph strategy".into(),
            ))
        }
    };

    if config.strategy != StrategyKind::Paragraph {
        return Err(Pdf2NotionError::InvalidConfig(
            "LLM generation needs the paragraph strategy".into(),
        ));
    }

    cb.on_stage_start(Stage::Generate);
    info!("Structuring {} chars with {}", text.chars().count(), generator.name());
    let generated = staged(cb, Stage::Generate, generator.generate(&text).await)?;
    cb.on_stage_complete(
        Stage::Generate,
        &format!("{} tokens in / {} out", generated.input_tokens, generated.output_tokens),
    );

    cb.on_stage_start(Stage::Reflow);
    let response = GenerationResponse::parse(&generated.raw);
    let salvaged_json = matches!(response, GenerationResponse::Blocks(_));
    let blocks = if salvaged_json && config.trust_generated_types {
        debug!("Keeping block types from the generation response");
        response.into_blocks(&config.paragraph)
    } else {
        let text = cleanup::clean_text(&salvage_response(response));
        config.paragraph.reflow_text(&text)
    };
    cb.on_stage_complete(Stage::Reflow, &block_summary(&blocks));

    Ok(Structured {
        reflow: ReflowOutput {
            blocks,
            furniture: PageFurniture::default(),
            page_count: None,
        },
        generation: Some(generated),
        salvaged_json,
    })
}

/// Output of [`structure`].
#[derive(Debug, Clone)]
pub struct Structured {
    pub reflow: ReflowOutput,
    /// Present when the generator ran.
    pub generation: Option<Generated>,
    /// The generator answered with a JSON block array.
    pub salvaged_json: bool,
}

impl Structured {
    fn plain(reflow: ReflowOutput) -> Self {
        Self {
            reflow,
            generation: None,
            salvaged_json: false,
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn convert_path(
    pdf_path: &Path,
    file_stem: Option<String>,
    config: &ConversionConfig,
    generator: Option<&dyn TextGenerator>,
) -> Result<ConversionOutput, Pdf2NotionError> {
    let total_start = Instant::now();
    let cb = callback(config);
    info!(
        "Converting {} ({} strategy)",
        pdf_path.display(),
        config.strategy
    );

    let mode = match config.strategy {
        StrategyKind::Paragraph => ExtractMode::Text,
        StrategyKind::Geometric => ExtractMode::Fragments,
    };

    cb.on_stage_start(Stage::Extract);
    let extract_start = Instant::now();
    let extraction = staged(
        cb,
        Stage::Extract,
        extract::extract(pdf_path, config.password.as_deref(), &config.pages, mode).await,
    )?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    cb.on_stage_complete(
        Stage::Extract,
        &format!("{} pages", extraction.page_indices.len()),
    );

    let structured = structure(extraction.input, config, generator).await?;
    let blocks = structured.reflow.blocks;

    if blocks.is_empty() {
        warn!("No text blocks were produced; the PDF may be scanned images only");
    }

    let mut stats = ConversionStats {
        strategy: config.strategy,
        total_pages: extraction.metadata.page_count,
        extracted_pages: extraction.page_indices.len(),
        generated: structured.generation.is_some(),
        salvaged_json: structured.salvaged_json,
        extract_duration_ms,
        ..Default::default()
    };
    if let Some(ref generated) = structured.generation {
        stats.input_tokens = generated.input_tokens;
        stats.output_tokens = generated.output_tokens;
        stats.generate_duration_ms = generated.duration_ms;
    }
    stats.count_blocks(&blocks);
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {} blocks from {}/{} pages in {}ms",
        blocks.len(),
        stats.extracted_pages,
        stats.total_pages,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        blocks,
        furniture: structured.reflow.furniture,
        metadata: extraction.metadata,
        file_stem,
        stats,
    })
}

fn callback(config: &ConversionConfig) -> &dyn ConversionProgressCallback {
    config.progress_callback.as_deref().unwrap_or(&NOOP)
}

fn staged<T>(
    cb: &dyn ConversionProgressCallback,
    stage: Stage,
    result: Result<T, Pdf2NotionError>,
) -> Result<T, Pdf2NotionError> {
    result.inspect_err(|e| cb.on_stage_error(stage, &e.to_string()))
}

fn block_summary(blocks: &BlockSequence) -> String {
    format!("{} blocks", blocks.len())
}

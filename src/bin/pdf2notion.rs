//! CLI binary for pdf2notion.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`/`NotionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2notion::{
    convert, inspect, publish_blocks, to_publish_payload, write_payload, ConversionConfig,
    ConversionOutput, ConversionProgressCallback, NotionConfig, NotionPublisher, PageSelection,
    ProgressCallback, Stage, StrategyKind,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner naming the running stage, plus a
/// log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<Stage, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed(&self, stage: Stage) -> String {
        let ms = self
            .start_times
            .lock()
            .ok()
            .and_then(|mut t| t.remove(&stage))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        format!("{:.1}s", ms as f64 / 1000.0)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut t) = self.start_times.lock() {
            t.insert(stage, Instant::now());
        }
        self.bar.set_prefix(stage.label());
        self.bar.set_message("");
    }

    fn on_stage_complete(&self, stage: Stage, summary: &str) {
        let elapsed = self.elapsed(stage);
        self.bar.println(format!(
            "  {} {:<22}  {:<28}  {}",
            green("✓"),
            stage.label(),
            dim(summary),
            dim(&elapsed),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let elapsed = self.elapsed(stage);
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let mut s: String = error.chars().take(79).collect();
            s.push('\u{2026}');
            s
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<22}  {}  {}",
            red("✗"),
            stage.label(),
            red(&msg),
            dim(&elapsed),
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Publish a PDF to a Notion database
  pdf2notion report.pdf --notion-token secret_... --database-id 1f2e...

  # Preview the payload without touching Notion
  pdf2notion --dry-run report.pdf

  # Save the exact request body to a file
  pdf2notion --dry-run report.pdf -o payload.json

  # Geometric reflow (strips repeated headers/footers, font-size headings)
  pdf2notion --strategy geometric --pages 1-10 book.pdf --dry-run

  # Let an LLM restructure the text first
  pdf2notion --generate --model gpt-4.1-mini paper.pdf --dry-run

  # Convert from URL
  pdf2notion https://arxiv.org/pdf/1706.03762 --title "Attention"

  # Inspect PDF metadata (no API key needed)
  pdf2notion --inspect-only document.pdf

REFLOW STRATEGIES:
  paragraph  (default) blank-line separated paragraphs; short lines without a
             trailing period become headings, "•"/"-" lines become bullets
  geometric  fragments grouped into lines by vertical position; lines that
             repeat at the top/bottom of most pages are removed; lines set in
             the dominant large font become headings

LIMITS:
  Notion accepts at most 100 child blocks per create-page request. Blocks
  past the first 100 are dropped and reported.

ENVIRONMENT VARIABLES:
  NOTION_API_KEY          Notion integration token
  NOTION_DATABASE_ID      Target database for new pages
  OPENAI_API_KEY          OpenAI API key (only with --generate)
  ANTHROPIC_API_KEY       Anthropic API key (only with --generate)
  GEMINI_API_KEY          Google Gemini API key (only with --generate)
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override the log filter (e.g. pdf2notion=debug)
"#;

/// Convert PDF files and URLs into Notion pages.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2notion",
    version,
    about = "Convert PDF files and URLs into Notion pages",
    long_about = "Extract the text of a PDF (local file or URL), reflow it into headings, \
paragraphs and list items, and publish the result as a page in a Notion database. \
An optional LLM pass can restructure the text before reflow.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Reflow strategy.
    #[arg(long, env = "PDF2NOTION_STRATEGY", value_enum, default_value = "paragraph")]
    strategy: StrategyArg,

    /// Run an LLM restructuring pass before reflow (paragraph strategy only).
    #[arg(long, env = "PDF2NOTION_GENERATE")]
    generate: bool,

    /// Accept block types from a JSON block array returned by the LLM.
    #[arg(long, env = "PDF2NOTION_TRUST_GENERATED_TYPES")]
    trust_generated_types: bool,

    /// Test for bullet markers before the heading rule.
    #[arg(long, env = "PDF2NOTION_BULLETS_FIRST")]
    bullets_first: bool,

    /// Paragraphs shorter than this many characters may become headings.
    #[arg(long, env = "PDF2NOTION_MAX_HEADING_CHARS", default_value_t = 100)]
    max_heading_chars: usize,

    /// Vertical distance that starts a new line (geometric strategy).
    #[arg(long, default_value_t = 2.0)]
    line_tolerance: f32,

    /// Share of pages a header/footer must repeat on (geometric strategy).
    #[arg(long, default_value_t = 0.7)]
    repeat_ratio: f64,

    /// Share of fragments that must use the tallest font for it to mark headings.
    #[arg(long, default_value_t = 0.7)]
    heading_dominance_ratio: f64,

    /// Tallest font must exceed this height to mark headings.
    #[arg(long, default_value_t = 10.0)]
    heading_min_height: f32,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2NOTION_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "PDF2NOTION_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2NOTION_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2NOTION_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2NOTION_PASSWORD")]
    password: Option<String>,

    /// Page title. Defaults to the PDF title, then the file name.
    #[arg(long)]
    title: Option<String>,

    /// Notion integration token.
    #[arg(long, env = "NOTION_API_KEY", hide_env_values = true)]
    notion_token: Option<String>,

    /// Notion database that receives the new page.
    #[arg(long, env = "NOTION_DATABASE_ID")]
    database_id: Option<String>,

    /// Notion API base URL.
    #[arg(long, env = "NOTION_API_BASE")]
    notion_api_base: Option<String>,

    /// Name of the database's title property.
    #[arg(long, default_value = "Name")]
    title_property: String,

    /// Build the payload but do not publish it.
    #[arg(long)]
    dry_run: bool,

    /// Write the publish payload (JSON) to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print structured JSON (blocks and stats) to stdout.
    #[arg(long)]
    json: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress spinner.
    #[arg(long, env = "PDF2NOTION_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2NOTION_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2NOTION_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2NOTION_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum StrategyArg {
    Paragraph,
    Geometric,
}

impl From<StrategyArg> for StrategyKind {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Paragraph => StrategyKind::Paragraph,
            StrategyArg::Geometric => StrategyKind::Geometric,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // Fail on missing credentials before any extraction work.
    let notion = if cli.dry_run {
        None
    } else {
        Some(build_notion_config(&cli)?)
    };
    let publisher = notion
        .clone()
        .map(NotionPublisher::new)
        .transpose()
        .context("Invalid Notion configuration")?;

    // ── Build config ─────────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };
    let config = build_config(&cli, progress.clone().map(|p| p as ProgressCallback)).await?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert(&cli.input, &config).await;
    let output = match result {
        Ok(output) => output,
        Err(e) => {
            if let Some(ref p) = progress {
                p.finish();
            }
            return Err(anyhow::Error::new(e).context("Conversion failed"));
        }
    };

    let title = output.title(cli.title.as_deref());
    let request = to_publish_payload(&output.blocks, &title);

    if let Some(ref path) = cli.output {
        write_payload(&request, notion.as_ref(), path)
            .await
            .context("Failed to write payload")?;
    }

    let report = match publisher {
        Some(ref publisher) => {
            let cb = progress.as_deref();
            if let Some(cb) = cb {
                cb.on_stage_start(Stage::Publish);
            }
            match publish_blocks(&output.blocks, &title, publisher).await {
                Ok(report) => {
                    if let Some(cb) = cb {
                        cb.on_stage_complete(
                            Stage::Publish,
                            &format!("{} blocks published", report.published_blocks),
                        );
                    }
                    Some(report)
                }
                Err(e) => {
                    if let Some(cb) = cb {
                        cb.on_stage_error(Stage::Publish, &e.to_string());
                        cb.finish();
                    }
                    return Err(anyhow::Error::new(e).context("Publishing to Notion failed"));
                }
            }
        }
        None => None,
    };

    if let Some(ref p) = progress {
        p.finish();
    }

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::json!({
            "output": output,
            "publish": report,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if report.is_none() && cli.output.is_none() {
        // Dry run without a payload file: the payload goes to stdout.
        println!(
            "{}",
            serde_json::to_string_pretty(&request).context("Failed to serialise payload")?
        );
    }

    if !cli.quiet {
        print_summary(&output, &title, request.dropped);
        if let Some(ref report) = report {
            eprintln!(
                "{}  published {}  →  {}",
                green("✔"),
                bold(&report.title),
                report.page.url.as_deref().unwrap_or(&report.page.id),
            );
        } else if let Some(ref path) = cli.output {
            eprintln!(
                "{}  payload written  →  {}",
                green("✔"),
                bold(&path.display().to_string())
            );
        }
    }

    Ok(())
}

fn print_summary(output: &ConversionOutput, title: &str, dropped: usize) {
    let s = &output.stats;
    eprintln!(
        "{} {}  {} blocks  ({} headings, {} paragraphs, {} list items)  {}ms",
        cyan("◆"),
        bold(title),
        s.total_blocks(),
        s.headings,
        s.paragraphs,
        s.bullet_items + s.numbered_items,
        s.total_duration_ms,
    );
    if !output.furniture.is_empty() {
        eprintln!(
            "   {}",
            dim(&format!(
                "removed {} repeated header/footer lines",
                output.furniture.headers.len() + output.furniture.footers.len()
            ))
        );
    }
    if s.generated {
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&s.input_tokens.to_string()),
            dim(&s.output_tokens.to_string()),
        );
    }
    if dropped > 0 {
        eprintln!(
            "   {} {} blocks past the 100-block limit were dropped",
            red("!"),
            dropped
        );
    }
}

/// Map Notion flags to `NotionConfig`.
fn build_notion_config(cli: &Cli) -> Result<NotionConfig> {
    let token = cli
        .notion_token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .context("Notion token missing: pass --notion-token or set NOTION_API_KEY (or use --dry-run)")?;
    let database = cli
        .database_id
        .clone()
        .filter(|d| !d.trim().is_empty())
        .context("Notion database missing: pass --database-id or set NOTION_DATABASE_ID")?;

    let mut config = NotionConfig::new(token, database).title_property(cli.title_property.clone());
    if let Some(ref base) = cli.notion_api_base {
        config = config.api_base(base.clone());
    }
    Ok(config)
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let pages: PageSelection = cli.pages.parse().context("Invalid --pages value")?;

    let mut builder = ConversionConfig::builder()
        .strategy(cli.strategy.clone().into())
        .generate(cli.generate)
        .trust_generated_types(cli.trust_generated_types)
        .bullets_first(cli.bullets_first)
        .max_heading_chars(cli.max_heading_chars)
        .line_tolerance(cli.line_tolerance)
        .repeat_ratio(cli.repeat_ratio)
        .heading_dominance_ratio(cli.heading_dominance_ratio)
        .heading_min_height(cli.heading_min_height)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .pages(pages)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

//! End-to-end integration tests for pdf2notion.
//!
//! These tests use real PDF files in `./test_cases/` and, for the generation
//! and publishing tests, make live LLM and Notion API calls. They are gated
//! behind the `E2E_ENABLED` environment variable so they do not run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Publishing tests additionally need `NOTION_API_KEY` and
//! `NOTION_DATABASE_ID`; generation tests need an LLM key such as
//! `OPENAI_API_KEY`.

use pdf2notion::{
    convert, convert_and_publish, convert_from_bytes, inspect, to_publish_payload, write_payload,
    BlockKind, ConversionConfig, ConversionOutput, NotionConfig, NotionPublisher, PageSelection,
    Pdf2NotionError, StrategyKind,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Route library logs to the test output; `RUST_LOG` overrides the level.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pdf2notion=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        init_logging();
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Skip unless every named environment variable is set.
macro_rules! skip_unless_env {
    ($($var:expr),+) => {{
        $(
            if std::env::var($var).map(|v| v.trim().is_empty()).unwrap_or(true) {
                println!("SKIP — {} not set", $var);
                return;
            }
        )+
    }};
}

/// Assert the block sequence passes basic quality checks.
fn assert_blocks_quality(output: &ConversionOutput, context: &str) {
    assert!(!output.blocks.is_empty(), "[{context}] No blocks produced");

    for (i, block) in output.blocks.iter().enumerate() {
        let text = block.text();
        assert!(!text.is_empty(), "[{context}] Block {i} is empty");
        assert_eq!(
            text,
            text.trim(),
            "[{context}] Block {i} has surrounding whitespace"
        );
        if block.kind == BlockKind::BulletItem {
            assert!(
                !text.starts_with('•') && !text.starts_with('-'),
                "[{context}] Bullet {i} kept its marker: {text:?}"
            );
        }
    }

    assert_eq!(
        output.stats.total_blocks(),
        output.blocks.len(),
        "[{context}] Stats disagree with block count"
    );
}

fn dump(output: &ConversionOutput, name: &str) {
    let path = output_dir().join(format!("{name}.txt"));
    let listing: String = output
        .blocks
        .iter()
        .map(|b| format!("[{}] {}\n", b.kind, b.text()))
        .collect();
    std::fs::write(&path, &listing).ok();
    println!("[{name}] {} blocks saved to {}", output.blocks.len(), path.display());
}

// ── Inspect tests (no API, instant) ──────────────────────────────────────────

#[tokio::test]
async fn test_inspect_arxiv_paper() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let meta = inspect(path.to_str().unwrap(), None)
        .await
        .expect("inspect() should succeed");

    assert_eq!(meta.page_count, 15, "Attention paper should have 15 pages");
    assert!(!meta.pdf_version.is_empty());

    println!("Metadata: {:?}", meta);
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP");
        return;
    }

    let err = inspect("/definitely/not/a/real/file.pdf", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2NotionError::FileNotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn test_password_on_unencrypted_pdf_is_ignored() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let meta = inspect(path.to_str().unwrap(), Some("unused"))
        .await
        .expect("inspect() with a password should succeed");
    assert_eq!(meta.page_count, 15);

    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(1))
        .password("unused")
        .build()
        .expect("valid config");
    let output = convert(path.to_str().unwrap(), &config)
        .await
        .expect("conversion with a password should succeed");
    assert_blocks_quality(&output, "arxiv_password");
}

// ── Conversion tests (pdfium only, no API) ───────────────────────────────────

#[tokio::test]
async fn test_paragraph_reflow_arxiv_page1() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(1))
        .build()
        .expect("valid config");

    let output = convert(path.to_str().unwrap(), &config)
        .await
        .expect("conversion should succeed");

    assert_blocks_quality(&output, "arxiv_paragraph");
    assert_eq!(output.stats.extracted_pages, 1);
    assert_eq!(output.stats.strategy, StrategyKind::Paragraph);
    assert!(output.furniture.is_empty());
    assert!(
        output.blocks.to_plain_text().to_lowercase().contains("attention"),
        "Page 1 should mention 'Attention'"
    );
    dump(&output, "arxiv_paragraph");
}

#[tokio::test]
async fn test_geometric_reflow_arxiv_first_pages() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let config = ConversionConfig::builder()
        .strategy(StrategyKind::Geometric)
        .pages(PageSelection::Range(1, 5))
        .build()
        .expect("valid config");

    let output = convert(path.to_str().unwrap(), &config)
        .await
        .expect("conversion should succeed");

    assert_blocks_quality(&output, "arxiv_geometric");
    assert_eq!(output.stats.extracted_pages, 5);
    println!("Furniture: {:?}", output.furniture);
    dump(&output, "arxiv_geometric");
}

#[tokio::test]
async fn test_page_out_of_range() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(100))
        .build()
        .expect("valid config");

    let err = convert(path.to_str().unwrap(), &config).await.unwrap_err();
    assert!(
        matches!(err, Pdf2NotionError::PageOutOfRange { page: 100, total: 15 }),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_convert_from_bytes_matches_path() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(1))
        .build()
        .expect("valid config");

    let bytes = std::fs::read(&path).expect("read test PDF");
    let from_bytes = convert_from_bytes(&bytes, &config)
        .await
        .expect("conversion should succeed");
    let from_path = convert(path.to_str().unwrap(), &config)
        .await
        .expect("conversion should succeed");

    assert_eq!(from_bytes.blocks, from_path.blocks);
    assert_eq!(from_bytes.file_stem, None);
    assert_eq!(
        from_path.file_stem.as_deref(),
        Some("attention_is_all_you_need")
    );
}

#[tokio::test]
async fn test_dry_run_payload_file() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let config = ConversionConfig::builder()
        .strategy(StrategyKind::Geometric)
        .build()
        .expect("valid config");

    let output = convert(path.to_str().unwrap(), &config)
        .await
        .expect("conversion should succeed");
    let request = to_publish_payload(&output.blocks, &output.title(None));
    assert!(request.children.len() <= 100);
    assert_eq!(
        request.children.len() + request.dropped,
        output.blocks.len()
    );

    let out_path = output_dir().join("arxiv_payload.json");
    write_payload(&request, None, &out_path)
        .await
        .expect("payload written");
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(
        written["children"].as_array().map(Vec::len),
        Some(request.children.len())
    );
    println!("[payload] Saved to {}", out_path.display());
}

// ── Generation tests (need LLM API) ──────────────────────────────────────────

#[tokio::test]
async fn test_generated_structure_arxiv_page1() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));
    skip_unless_env!("OPENAI_API_KEY");

    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(1))
        .generate(true)
        .build()
        .expect("valid config");

    let output = convert(path.to_str().unwrap(), &config)
        .await
        .expect("conversion should succeed");

    assert_blocks_quality(&output, "arxiv_generated");
    assert!(output.stats.generated);
    assert!(output.stats.input_tokens > 0, "Should have consumed tokens");
    println!(
        "[arxiv_generated] Tokens: {} in / {} out",
        output.stats.input_tokens, output.stats.output_tokens
    );
    dump(&output, "arxiv_generated");
}

// ── Publishing tests (need Notion API) ───────────────────────────────────────

#[tokio::test]
async fn test_publish_arxiv_page1() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));
    skip_unless_env!("NOTION_API_KEY", "NOTION_DATABASE_ID");

    let notion = NotionConfig::new(
        std::env::var("NOTION_API_KEY").unwrap(),
        std::env::var("NOTION_DATABASE_ID").unwrap(),
    );
    let publisher = NotionPublisher::new(notion).expect("valid Notion config");
    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(1))
        .build()
        .expect("valid config");

    let (output, report) = convert_and_publish(
        path.to_str().unwrap(),
        &config,
        &publisher,
        Some("pdf2notion e2e: Attention page 1"),
    )
    .await
    .expect("publish should succeed");

    assert!(!report.page.id.is_empty());
    assert_eq!(
        report.published_blocks,
        output.blocks.len().min(100),
        "Published count should match the capped block count"
    );
    println!("[publish] Created page {} ({:?})", report.page.id, report.page.url);
}

#[tokio::test]
async fn test_publish_with_bad_token_is_rejected() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));
    skip_unless_env!("NOTION_DATABASE_ID");

    let notion = NotionConfig::new(
        "secret_invalid",
        std::env::var("NOTION_DATABASE_ID").unwrap(),
    );
    let publisher = NotionPublisher::new(notion).expect("valid Notion config");
    let config = ConversionConfig::builder()
        .pages(PageSelection::Single(1))
        .build()
        .expect("valid config");

    let err = convert_and_publish(path.to_str().unwrap(), &config, &publisher, None)
        .await
        .unwrap_err();
    assert!(err.is_publish_rejection(), "{err:?}");
}

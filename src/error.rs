//! Error types for the pdf2notion library.
//!
//! Every failure in the extract → generate → reflow → publish chain is fatal
//! for that conversion and surfaces as a [`Pdf2NotionError`]. Two behaviours
//! are deliberately not errors:
//!
//! * A generation response that cannot be salvaged into structured text falls
//!   back to the raw string (see [`crate::salvage`]).
//!   [`Pdf2NotionError::MalformedGenerationResponse`] exists so that fallback
//!   can be reported, but the conversion functions never return it.
//! * Blocks beyond the document API's per-request cap are dropped silently
//!   by [`crate::publish::to_publish_payload`].
//!
//! Upstream detail (pdfium error text, provider message, HTTP
//! body) is carried through verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2notion library.
#[derive(Debug, Error)]
pub enum Pdf2NotionError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Extraction could not read the document or a page.
    #[error("Text extraction failed for '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Generation errors ─────────────────────────────────────────────────
    /// The text-generation provider is misconfigured or the call failed.
    #[error("Text generation unavailable (provider '{provider}'): {detail}")]
    GenerationUnavailable { provider: String, detail: String },

    /// A generation response yielded no recoverable text.
    #[error("Generation response could not be salvaged: {detail}")]
    MalformedGenerationResponse { detail: String },

    // ── Reflow errors ─────────────────────────────────────────────────────
    /// Reflow input was malformed or did not match the chosen strategy.
    #[error("Reflow input could not be parsed: {0}")]
    ParseFailure(String),

    // ── Publish errors ────────────────────────────────────────────────────
    /// The document API answered with a non-success status.
    #[error("Notion rejected the page (HTTP {status}): {message}")]
    PublishRejected { status: u16, message: String },

    /// The document API could not be reached at all.
    #[error("Could not reach Notion: {reason}")]
    PublishUnreachable { reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2NotionError {
    /// True when the document API itself refused the request.
    pub fn is_publish_rejection(&self) -> bool {
        matches!(self, Pdf2NotionError::PublishRejected { .. })
    }
}

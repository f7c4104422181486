//! Text and fragment extraction over pdfium.
//!
//! Produces the two reflow input shapes:
//!
//! * [`ExtractMode::Text`]: one string, selected pages joined by a blank
//!   line so a page break is always a paragraph break.
//! * [`ExtractMode::Fragments`]: per page, the text segments pdfium reports,
//!   each with its bottom edge as `y` and its box height as the font-size proxy.
//!
//! pdfium is a blocking C library; every entry point hops onto
//! `spawn_blocking`. A failure on any selected page fails the whole
//! extraction.

use crate::config::PageSelection;
use crate::error::Pdf2NotionError;
use crate::output::DocumentMetadata;
use crate::reflow::{Fragment, PageFragments, ReflowInput};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which reflow input to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    Text,
    Fragments,
}

/// Result of one extraction pass.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub metadata: DocumentMetadata,
    pub input: ReflowInput,
    /// 0-based indices of the pages that were read.
    pub page_indices: Vec<usize>,
}

/// Open the document and extract the selected pages.
pub async fn extract(
    pdf_path: &Path,
    password: Option<&str>,
    pages: &PageSelection,
    mode: ExtractMode,
) -> Result<Extraction, Pdf2NotionError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);
    let pages = pages.clone();

    tokio::task::spawn_blocking(move || extract_blocking(&path, password.as_deref(), &pages, mode))
        .await
        .map_err(|e| Pdf2NotionError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Read document metadata only.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2NotionError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        let pdfium = Pdfium::default();
        let document = open(&pdfium, &path, password.as_deref())?;
        Ok(read_metadata(&document))
    })
    .await
    .map_err(|e| Pdf2NotionError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_blocking(
    path: &Path,
    password: Option<&str>,
    pages: &PageSelection,
    mode: ExtractMode,
) -> Result<Extraction, Pdf2NotionError> {
    let pdfium = Pdfium::default();
    let document = open(&pdfium, path, password)?;
    let metadata = read_metadata(&document);
    info!("PDF loaded: {} pages", metadata.page_count);

    let page_indices = pages.to_indices(metadata.page_count);
    if page_indices.is_empty() {
        return Err(Pdf2NotionError::PageOutOfRange {
            page: pages.first_requested().unwrap_or(0),
            total: metadata.page_count,
        });
    }
    if pages.exceeds(metadata.page_count) {
        warn!(
            "Page selection reaches past page {}; extracting {} pages",
            metadata.page_count,
            page_indices.len()
        );
    }

    let failed = |idx: usize, e: PdfiumError| Pdf2NotionError::ExtractionFailed {
        path: path.to_path_buf(),
        detail: format!("page {}: {:?}", idx + 1, e),
    };

    let doc_pages = document.pages();
    let input = match mode {
        ExtractMode::Text => {
            let mut texts = Vec::with_capacity(page_indices.len());
            for &idx in &page_indices {
                let page = doc_pages.get(idx as u16).map_err(|e| failed(idx, e))?;
                let text = page.text().map_err(|e| failed(idx, e))?.all();
                debug!("Page {}: {} chars of text", idx + 1, text.chars().count());
                texts.push(text);
            }
            ReflowInput::Text(join_pages(&texts))
        }
        ExtractMode::Fragments => {
            let mut all: Vec<PageFragments> = Vec::with_capacity(page_indices.len());
            for &idx in &page_indices {
                let page = doc_pages.get(idx as u16).map_err(|e| failed(idx, e))?;
                let text = page.text().map_err(|e| failed(idx, e))?;
                let fragments: PageFragments = text
                    .segments()
                    .iter()
                    .map(|segment| {
                        let bounds = segment.bounds();
                        Fragment::new(segment.text(), bounds.bottom().value, bounds.height().value)
                    })
                    .filter(|f| !f.text.trim().is_empty())
                    .collect();
                debug!("Page {}: {} fragments", idx + 1, fragments.len());
                all.push(fragments);
            }
            ReflowInput::Pages(all)
        }
    };

    Ok(Extraction {
        metadata,
        input,
        page_indices,
    })
}

fn open<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2NotionError> {
    pdfium
        .load_pdf_from_file(path, password)
        .map_err(|e| load_error(format!("{:?}", e), path.to_path_buf(), password.is_some()))
}

/// Classify a document-open failure from pdfium's error text.
fn load_error(detail: String, path: PathBuf, password_given: bool) -> Pdf2NotionError {
    if detail.to_lowercase().contains("password") {
        if password_given {
            Pdf2NotionError::WrongPassword { path }
        } else {
            Pdf2NotionError::PasswordRequired { path }
        }
    } else {
        Pdf2NotionError::ExtractionFailed { path, detail }
    }
}

fn read_metadata(document: &PdfDocument) -> DocumentMetadata {
    let metadata = document.metadata();
    let tag = |kind: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(kind)
            .map(|t| t.value().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    DocumentMetadata {
        title: tag(PdfDocumentMetadataTagType::Title),
        author: tag(PdfDocumentMetadataTagType::Author),
        subject: tag(PdfDocumentMetadataTagType::Subject),
        creator: tag(PdfDocumentMetadataTagType::Creator),
        producer: tag(PdfDocumentMetadataTagType::Producer),
        creation_date: tag(PdfDocumentMetadataTagType::CreationDate),
        modification_date: tag(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

/// Join page texts with a blank line, skipping pages with no text.
fn join_pages(texts: &[String]) -> String {
    texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_join_with_blank_line() {
        let texts = vec![
            "First page.\n".to_string(),
            "   ".to_string(),
            "Second page.".to_string(),
        ];
        assert_eq!(join_pages(&texts), "First page.\n\nSecond page.");
        assert_eq!(join_pages(&[]), "");
    }

    #[test]
    fn password_errors_are_classified() {
        let path = PathBuf::from("locked.pdf");
        assert!(matches!(
            load_error("PdfiumLibraryInternalError(PasswordError)".into(), path.clone(), false),
            Pdf2NotionError::PasswordRequired { .. }
        ));
        assert!(matches!(
            load_error("PdfiumLibraryInternalError(PasswordError)".into(), path.clone(), true),
            Pdf2NotionError::WrongPassword { .. }
        ));
        match load_error("PdfiumLibraryInternalError(FormatError)".into(), path, false) {
            Pdf2NotionError::ExtractionFailed { detail, .. } => assert!(detail.contains("FormatError")),
            other => panic!("unexpected {other:?}"),
        }
    }
}

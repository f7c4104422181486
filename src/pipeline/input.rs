//! Input resolution: path or URL → local PDF file.
//!
//! pdfium opens documents from the file system, so a URL is downloaded into
//! a `TempDir` owned by the returned [`ResolvedInput`]; the file disappears
//! when the value is dropped. Both branches check the `%PDF` magic before
//! anything is handed to the extractor.

use crate::error::Pdf2NotionError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";
const FALLBACK_FILE_NAME: &str = "document.pdf";

/// A PDF available on the local file system.
#[derive(Debug)]
pub enum ResolvedInput {
    Local(PathBuf),
    /// Downloaded copy; lives as long as the temp directory.
    Downloaded {
        url: String,
        path: PathBuf,
        _temp_dir: TempDir,
    },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    /// File name without extension, used as the last-resort page title.
    pub fn stem(&self) -> Option<String> {
        self.path()
            .file_stem()
            .map(|s| s.to_string_lossy().trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a readable local PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2NotionError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Pdf2NotionError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download(input, timeout_secs).await
    } else {
        open_local(Path::new(input))
    }
}

fn open_local(path: &Path) -> Result<ResolvedInput, Pdf2NotionError> {
    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pdf2NotionError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pdf2NotionError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let mut magic = [0u8; 4];
    let read = file.read(&mut magic).unwrap_or(0);
    check_magic(&magic[..read], path)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path.to_path_buf()))
}

async fn download(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2NotionError> {
    info!("Downloading PDF from {}", url);
    let failed = |reason: String| Pdf2NotionError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2NotionError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("HTTP {status}")));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let temp_dir =
        TempDir::new().map_err(|e| Pdf2NotionError::Internal(format!("temp dir: {e}")))?;
    let path = temp_dir.path().join(file_name_from_url(url));
    check_magic(&bytes[..bytes.len().min(4)], &path)?;

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| Pdf2NotionError::Internal(format!("Failed to write download: {e}")))?;

    info!("Downloaded {} bytes to {}", bytes.len(), path.display());
    Ok(ResolvedInput::Downloaded {
        url: url.to_string(),
        path,
        _temp_dir: temp_dir,
    })
}

fn check_magic(head: &[u8], path: &Path) -> Result<(), Pdf2NotionError> {
    if head == PDF_MAGIC {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    magic[..head.len()].copy_from_slice(head);
    Err(Pdf2NotionError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

/// Last path segment of `url` when it looks like a file name.
fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| name.contains('.') && !name.contains(['/', '\\']))
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

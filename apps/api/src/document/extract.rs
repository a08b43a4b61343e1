//! PDF text extraction backed by `pdf-extract`.
//!
//! `pdf-extract` yields one string per page. Pages are trimmed, empty pages
//! dropped, and the rest joined with a newline in document order.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Bytes searched for the `%PDF-` header. Some writers emit junk before it.
const HEADER_SEARCH_WINDOW: usize = 1024;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Uploaded file is not a PDF")]
    NotAPdf,

    #[error("PDF extraction failed: {0}")]
    Parse(String),
}

/// Plain text derived from one uploaded PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    /// Pages that contributed text. Scanned pages contribute nothing.
    pub pages_with_text: usize,
}

impl ExtractedDocument {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Cheap header sniff used before anything is written to disk.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Extracts text from the PDF at `path`. Synchronous and CPU-bound.
pub fn extract_pdf_text(path: &Path) -> Result<ExtractedDocument, ExtractionError> {
    let pages = pdf_extract::extract_text_by_pages(path)
        .map_err(|e| ExtractionError::Parse(e.to_string()))?;
    let document = join_pages(&pages);
    debug!(
        pages_with_text = document.pages_with_text,
        chars = document.text.chars().count(),
        "extracted PDF text"
    );
    Ok(document)
}

/// Runs extraction on the blocking pool. A parser panic on a malformed file
/// surfaces as an `ExtractionError` instead of tearing down the request task.
pub async fn extract_pdf_blocking(path: PathBuf) -> Result<ExtractedDocument, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_pdf_text(&path))
        .await
        .map_err(|e| {
            if e.is_panic() {
                ExtractionError::Parse("PDF parser could not read this file".to_string())
            } else {
                ExtractionError::Parse(e.to_string())
            }
        })?
}

/// Joins the non-empty pages in document order.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> ExtractedDocument {
    let pages: Vec<&str> = pages
        .iter()
        .map(|page| page.as_ref().trim())
        .filter(|page| !page.is_empty())
        .collect();

    ExtractedDocument {
        text: pages.join("\n"),
        pages_with_text: pages.len(),
    }
}

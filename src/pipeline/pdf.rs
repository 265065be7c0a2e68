//! Stage 2, PDF family: page text extraction.
//!
//! The document is parsed fully in memory with `lopdf`. Text comes out in
//! ascending page order, one segment per page, joined with `"\n"` and
//! trimmed at the ends. A page with nothing extractable contributes an empty
//! segment rather than an error, so a scanned (image-only) document legally
//! produces an empty string — downstream consumers distinguish "no text"
//! from "failed".

use crate::error::ProcessError;
use lopdf::Document;
use tracing::{debug, warn};

/// Extracts text from PDF uploads.
///
/// Stateless. One instance sits in [`crate::process::Capabilities`] when the
/// `pdf` feature is compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the document's text, page by page in ascending order.
    ///
    /// Fails with [`ProcessError::Extraction`] when the bytes do not parse
    /// as a PDF at all or the document is encrypted. Per-page extraction
    /// misses are not failures; they yield empty segments.
    pub fn extract_text(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        let doc = Document::load_mem(bytes)?;
        if doc.is_encrypted() {
            return Err(ProcessError::Extraction {
                detail: "document is encrypted and no credentials are available".into(),
            });
        }

        let pages = doc.get_pages();
        let page_count = pages.len();
        let mut segments = Vec::with_capacity(page_count);
        for (&number, _) in &pages {
            match doc.extract_text(&[number]) {
                Ok(text) => segments.push(text),
                Err(e) => {
                    warn!("Page {} yielded no extractable text: {}", number, e);
                    segments.push(String::new());
                }
            }
        }

        let text = segments.join("\n").trim().to_owned();
        debug!("Extracted {} chars from {} pages", text.len(), page_count);
        Ok(text)
    }
}

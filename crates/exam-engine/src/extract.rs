//! PDF text extraction
//!
//! Text is pulled page by page with `pdf-extract`, which handles CID fonts
//! and ToUnicode CMaps. Pages are concatenated in order, each followed by a
//! newline; pages without text (scans, blank pages, whitespace-only
//! content) contribute nothing.
//!
//! `pdf-extract` can panic on malformed input instead of returning an
//! error, so every call runs inside [`std::panic::catch_unwind`].
//!
//! # Example
//! ```no_run
//! use exam_engine::extract::PdfExtractor;
//!
//! fn dump(pdf_bytes: &[u8]) -> Result<(), exam_engine::ParseError> {
//!     let extracted = PdfExtractor::extract(pdf_bytes)?;
//!     println!("{}/{} pages had text", extracted.pages_with_text, extracted.pages_total);
//!     println!("{}", extracted.text);
//!     Ok(())
//! }
//! ```

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// How far into the file the `%PDF-` marker may appear
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Text pulled out of one PDF
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Concatenated page text, each contributing page followed by `\n`
    pub text: String,
    /// Number of pages in the document
    pub pages_total: usize,
    /// Number of pages that contributed text
    pub pages_with_text: usize,
}

impl ExtractedText {
    /// Whether no page contributed any text
    pub fn is_empty(&self) -> bool {
        self.pages_with_text == 0
    }
}

/// PDF text extraction interface
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract the concatenated text of every page
    ///
    /// # Errors
    /// - `ParseError::NotPdf` - no `%PDF-` header near the start of the input
    /// - `ParseError::Encrypted` - the PDF requires a password
    /// - `ParseError::Malformed` - the PDF could not be parsed
    /// - `ParseError::Panicked` - the parser gave up on a broken document
    ///
    /// A readable PDF without text is not an error here; the pipeline
    /// decides what an empty result means.
    pub fn extract(pdf_bytes: &[u8]) -> Result<ExtractedText, ParseError> {
        if !Self::looks_like_pdf(pdf_bytes) {
            return Err(ParseError::NotPdf);
        }

        let pages = Self::extract_pages(pdf_bytes)?;
        let extracted = Self::join_pages(&pages);

        tracing::debug!(
            "Extracted {} chars from {}/{} pages",
            extracted.text.chars().count(),
            extracted.pages_with_text,
            extracted.pages_total
        );

        Ok(extracted)
    }

    /// Whether the `%PDF-` marker appears near the start of the input
    pub fn looks_like_pdf(data: &[u8]) -> bool {
        let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
        window.windows(5).any(|w| w == b"%PDF-")
    }

    /// Run pdf-extract with panics converted to errors
    fn extract_pages(pdf_bytes: &[u8]) -> Result<Vec<String>, ParseError> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        }));

        match result {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(Self::classify_error(&e.to_string())),
            Err(_) => {
                tracing::warn!("pdf-extract panicked while reading the document");
                Err(ParseError::Panicked)
            }
        }
    }

    fn classify_error(message: &str) -> ParseError {
        let lower = message.to_lowercase();
        if lower.contains("encrypt") || lower.contains("password") || lower.contains("decrypt") {
            ParseError::Encrypted
        } else {
            ParseError::Malformed(message.to_string())
        }
    }

    /// Concatenate pages in order, skipping pages with no visible text
    fn join_pages(pages: &[String]) -> ExtractedText {
        let mut text = String::new();
        let mut pages_with_text = 0;

        for page in pages {
            if page.trim().is_empty() {
                continue;
            }
            text.push_str(page);
            text.push('\n');
            pages_with_text += 1;
        }

        ExtractedText {
            text,
            pages_total: pages.len(),
            pages_with_text,
        }
    }
}

//! Extract → normalize → compose
//!
//! [`ExamSheetGenerator`] owns the configuration and the loaded fonts and
//! turns one uploaded PDF into one exam sheet. Each call is independent;
//! a generator can be shared between threads.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::compose::Composer;
use crate::config::{SheetConfig, PDF_MIME_TYPE};
use crate::error::{Diagnostic, ParseError, Result};
use crate::extract::PdfExtractor;
use crate::normalize::normalize;
use crate::world::FontCache;

/// The downloadable result of one generation
#[derive(Debug, Clone, Serialize)]
pub struct ExamSheet {
    #[serde(skip)]
    pub pdf: Vec<u8>,
    pub filename: String,
    pub mime_type: &'static str,
    pub page_count: usize,
    pub paragraph_count: usize,
    /// Non-fatal layout diagnostics, such as unknown font families
    pub warnings: Vec<Diagnostic>,
}

/// Turns uploaded PDFs into exam sheets
#[derive(Debug, Clone)]
pub struct ExamSheetGenerator {
    composer: Composer,
}

impl ExamSheetGenerator {
    /// Create a generator, loading fonts as the configuration says
    pub fn new(config: SheetConfig) -> Self {
        Self {
            composer: Composer::new(config),
        }
    }

    /// Create a generator sharing an already loaded font cache
    pub fn with_fonts(config: SheetConfig, fonts: Arc<FontCache>) -> Self {
        Self {
            composer: Composer::with_fonts(config, fonts),
        }
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Generate the exam sheet for one uploaded PDF
    ///
    /// # Errors
    /// - `ExamError::DocumentParse` - unreadable PDF, or no text on any page
    /// - `ExamError::Render` - the sheet could not be laid out or exported
    pub fn generate(&self, pdf_bytes: &[u8], original_filename: &str) -> Result<ExamSheet> {
        let started = Instant::now();

        let extracted = PdfExtractor::extract(pdf_bytes)?;
        let text = normalize(&extracted.text);
        if text.is_empty() {
            tracing::info!(
                "No text recognized in {} ({} pages)",
                original_filename,
                extracted.pages_total
            );
            return Err(ParseError::NoText.into());
        }

        let sheet = self.composer.compose(&text, original_filename)?;
        let paragraph_count = sheet.layout.paragraph_count();

        tracing::info!(
            "Generated {} from {} ({}/{} pages with text, {} paragraphs, {} output pages, {} warnings) in {:?}",
            sheet.filename,
            original_filename,
            extracted.pages_with_text,
            extracted.pages_total,
            paragraph_count,
            sheet.page_count,
            sheet.warnings.len(),
            started.elapsed()
        );

        Ok(ExamSheet {
            pdf: sheet.pdf,
            filename: sheet.filename,
            mime_type: PDF_MIME_TYPE,
            page_count: sheet.page_count,
            paragraph_count,
            warnings: sheet.warnings,
        })
    }
}

impl Default for ExamSheetGenerator {
    fn default() -> Self {
        Self::new(SheetConfig::default())
    }
}

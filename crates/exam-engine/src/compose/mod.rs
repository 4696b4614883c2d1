//! Exam sheet composition
//!
//! Turns normalized text into the exam sheet PDF: build the logical
//! layout, make sure every character can be drawn, compile with Typst.

pub mod filename;
pub mod layout;
pub mod render;

pub use filename::derive_output_filename;
pub use layout::{split_paragraphs, SheetBlock, SheetLayout};
pub use render::{render_pdf, RenderedPdf};

use std::sync::Arc;

use crate::config::SheetConfig;
use crate::error::{Diagnostic, RenderError};
use crate::world::FontCache;

/// A finished exam sheet document
#[derive(Debug, Clone)]
pub struct ComposedSheet {
    pub pdf: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
    pub layout: SheetLayout,
    pub warnings: Vec<Diagnostic>,
}

/// Lays out and renders exam sheets with a fixed configuration
#[derive(Debug, Clone)]
pub struct Composer {
    config: SheetConfig,
    fonts: Arc<FontCache>,
}

impl Composer {
    /// Create a composer, loading fonts as the configuration says
    pub fn new(config: SheetConfig) -> Self {
        let fonts = Arc::new(FontCache::new(&config.fonts));
        Self { config, fonts }
    }

    /// Create a composer sharing an already loaded font cache
    pub fn with_fonts(config: SheetConfig, fonts: Arc<FontCache>) -> Self {
        Self { config, fonts }
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn fonts(&self) -> &Arc<FontCache> {
        &self.fonts
    }

    /// Compose normalized text into an exam sheet named after `original_filename`
    ///
    /// Nothing is returned unless rendering succeeds completely.
    pub fn compose(
        &self,
        text: &str,
        original_filename: &str,
    ) -> Result<ComposedSheet, RenderError> {
        let layout = SheetLayout::build(text, &self.config);
        self.check_coverage(&layout)?;

        let rendered = render_pdf(&layout, &self.config, Arc::clone(&self.fonts))?;
        let filename = derive_output_filename(original_filename);

        tracing::debug!(
            "Composed {} ({} paragraphs, {} pages, {} bytes)",
            filename,
            layout.paragraph_count(),
            rendered.page_count,
            rendered.bytes.len()
        );

        Ok(ComposedSheet {
            pdf: rendered.bytes,
            filename,
            page_count: rendered.page_count,
            layout,
            warnings: rendered.warnings,
        })
    }

    /// Check that the configured header can be drawn with the loaded fonts
    ///
    /// The header is the same on every sheet, so a failure here means no
    /// upload can succeed with this configuration.
    pub fn check_header(&self) -> Result<(), RenderError> {
        self.check_coverage(&SheetLayout::build("", &self.config))
    }

    /// Fail on the first visible character no loaded font can draw
    pub fn check_coverage(&self, layout: &SheetLayout) -> Result<(), RenderError> {
        for (index, block) in layout.blocks.iter().enumerate() {
            let mut missing = None;
            block.for_each_char(|c| {
                if missing.is_none()
                    && !c.is_whitespace()
                    && !c.is_control()
                    && !self.fonts.covers(c)
                {
                    missing = Some(c);
                }
            });
            if let Some(character) = missing {
                return Err(RenderError::UnsupportedGlyph {
                    character,
                    block: index,
                });
            }
        }
        Ok(())
    }
}

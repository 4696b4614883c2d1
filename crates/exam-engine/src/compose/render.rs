//! Typst compilation of a sheet layout into PDF bytes
//!
//! The layout, font preferences and style are serialized to JSON and handed
//! to the embedded template as `sys.inputs.sheet`. Compilation is
//! synchronous; callers that need a deadline run it on a blocking thread.

use std::sync::Arc;

use serde::Serialize;
use typst::diag::{Severity, SourceDiagnostic};
use typst::model::Document;

use super::layout::{SheetBlock, SheetLayout};
use crate::config::{SheetConfig, SheetStyle};
use crate::error::{Diagnostic, RenderError};
use crate::templates::EXAM_SHEET_TEMPLATE;
use crate::world::{FontCache, VirtualWorld};

/// Memoization entries older than this many compilations are dropped
const CACHE_MAX_AGE: usize = 10;

/// PDF produced from a layout
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub warnings: Vec<Diagnostic>,
}

/// The value the template sees as `sys.inputs.sheet`
#[derive(Serialize)]
struct SheetInputs<'a> {
    title: &'a str,
    blocks: &'a [SheetBlock],
    fonts: Vec<String>,
    style: &'a SheetStyle,
}

/// Compile a layout with the exam sheet template and export it as PDF
pub fn render_pdf(
    layout: &SheetLayout,
    config: &SheetConfig,
    fonts: Arc<FontCache>,
) -> Result<RenderedPdf, RenderError> {
    let inputs = SheetInputs {
        title: &config.title,
        blocks: &layout.blocks,
        fonts: config.resolved_font_families(),
        style: &config.style,
    };
    let sheet = serde_json::to_value(&inputs)
        .map_err(|e| RenderError::InvalidInput(e.to_string()))?;

    let mut map = serde_json::Map::new();
    map.insert("sheet".to_string(), sheet);

    let world = VirtualWorld::new(EXAM_SHEET_TEMPLATE.to_string(), map, fonts)?;

    let warned = typst::compile(&world);
    let (_, warnings) = categorize_diagnostics(&warned.warnings);
    for warning in &warnings {
        tracing::warn!("Typst warning: {}", warning);
    }

    let result = match warned.output {
        Ok(document) => export_pdf(&document, warnings),
        Err(diagnostics) => {
            let (errors, _) = categorize_diagnostics(&diagnostics);
            if errors.is_empty() {
                Err(RenderError::Compile(vec![Diagnostic::new(
                    "Compilation failed with unknown error",
                )]))
            } else {
                Err(RenderError::Compile(errors))
            }
        }
    };

    comemo::evict(CACHE_MAX_AGE);
    result
}

fn export_pdf(document: &Document, warnings: Vec<Diagnostic>) -> Result<RenderedPdf, RenderError> {
    let bytes = typst_pdf::pdf(document, &typst_pdf::PdfOptions::default()).map_err(|diags| {
        let (errors, _) = categorize_diagnostics(&diags);
        RenderError::Export(
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    })?;

    Ok(RenderedPdf {
        bytes,
        page_count: document.pages.len(),
        warnings,
    })
}

/// Split diagnostics into errors and warnings
fn categorize_diagnostics(diagnostics: &[SourceDiagnostic]) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for diag in diagnostics {
        let mut converted = Diagnostic::new(diag.message.to_string());

        if !diag.hints.is_empty() {
            let hint = diag
                .hints
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            converted = converted.with_hint(hint);
        }

        match diag.severity {
            Severity::Error => errors.push(converted),
            Severity::Warning => warnings.push(converted.as_warning()),
        }
    }

    (errors, warnings)
}

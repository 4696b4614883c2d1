//! Error types for extraction, composition and the full pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-facing message for any failure to read text out of the upload
pub const NO_TEXT_MESSAGE: &str = "no text could be recognized in the PDF.";

/// User-facing message for any failure while building the exam sheet
pub const PROCESSING_ERROR_MESSAGE: &str = "an error occurred while processing the PDF.";

/// The uploaded bytes could not be turned into text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Input is not a PDF (missing %PDF- header)")]
    NotPdf,

    #[error("Password-protected PDF")]
    Encrypted,

    #[error("Malformed PDF: {0}")]
    Malformed(String),

    #[error("PDF extraction panicked (malformed document)")]
    Panicked,

    #[error("No extractable text on any page")]
    NoText,
}

/// Severity of a layout engine diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// A diagnostic reported by the layout engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Human-readable message
    pub message: String,
    /// Hints joined with "; "
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub severity: DiagnosticSeverity,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: None,
            severity: DiagnosticSeverity::Error,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn as_warning(mut self) -> Self {
        self.severity = DiagnosticSeverity::Warning;
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.hint {
            Some(hint) => write!(f, "{} (hint: {})", self.message, hint),
            None => write!(f, "{}", self.message),
        }
    }
}

/// The exam sheet could not be laid out or exported
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("No loaded font can render {character:?} in block {block}")]
    UnsupportedGlyph { character: char, block: usize },

    #[error("Layout failed: {}", join_diagnostics(.0))]
    Compile(Vec<Diagnostic>),

    #[error("PDF export failed: {0}")]
    Export(String),

    #[error("Invalid layout input: {0}")]
    InvalidInput(String),
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The two failure kinds a caller has to distinguish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DocumentParse,
    Render,
}

/// Any failure of the extract → normalize → compose pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExamError {
    #[error("Document parse error: {0}")]
    DocumentParse(#[from] ParseError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl ExamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExamError::DocumentParse(_) => ErrorKind::DocumentParse,
            ExamError::Render(_) => ErrorKind::Render,
        }
    }

    /// Message suitable for showing to the person who uploaded the file
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::DocumentParse => NO_TEXT_MESSAGE,
            ErrorKind::Render => PROCESSING_ERROR_MESSAGE,
        }
    }
}

pub type Result<T, E = ExamError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_message() {
        let err = ExamError::from(ParseError::NoText);
        assert_eq!(err.kind(), ErrorKind::DocumentParse);
        assert_eq!(err.user_message(), NO_TEXT_MESSAGE);

        let err = ExamError::from(RenderError::Export("boom".into()));
        assert_eq!(err.kind(), ErrorKind::Render);
        assert_eq!(err.user_message(), PROCESSING_ERROR_MESSAGE);
    }

    #[test]
    fn test_unsupported_glyph_display() {
        let err = RenderError::UnsupportedGlyph {
            character: '가',
            block: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("'가'"), "{}", msg);
        assert!(msg.contains("block 3"), "{}", msg);
    }

    #[test]
    fn test_compile_error_joins_diagnostics() {
        let err = RenderError::Compile(vec![
            Diagnostic::new("first"),
            Diagnostic::new("second").with_hint("try again"),
        ]);
        assert_eq!(
            err.to_string(),
            "Layout failed: first; second (hint: try again)"
        );
    }
}

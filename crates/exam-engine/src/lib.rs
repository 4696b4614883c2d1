//! Exam sheet generation engine
//!
//! Reads the text out of an uploaded PDF and lays it out again as an exam
//! sheet: a centered header with the institution name and blank
//! class/name/score fields, followed by the source text as justified
//! paragraphs.
//!
//! - [`extract`]: page-by-page text extraction (pdf-extract)
//! - [`normalize`]: blank-line and space cleanup
//! - [`compose`]: layout, glyph check and Typst rendering
//! - [`pipeline`]: the three stages wired together
//!
//! ```no_run
//! use exam_engine::{ExamSheetGenerator, SheetConfig};
//!
//! let generator = ExamSheetGenerator::new(SheetConfig::default());
//! let upload = std::fs::read("quiz.pdf").unwrap();
//! let sheet = generator.generate(&upload, "quiz.pdf").unwrap();
//! std::fs::write(&sheet.filename, &sheet.pdf).unwrap();
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod templates;
pub mod world;

pub use compose::{derive_output_filename, ComposedSheet, Composer, SheetBlock, SheetLayout};
pub use config::{SheetConfig, SheetStyle, OUTPUT_SUFFIX, PDF_MIME_TYPE};
pub use error::{ErrorKind, ExamError, ParseError, RenderError};
pub use extract::{ExtractedText, PdfExtractor};
pub use normalize::normalize;
pub use pipeline::{ExamSheet, ExamSheetGenerator};
pub use world::{FontCache, FontConfig};

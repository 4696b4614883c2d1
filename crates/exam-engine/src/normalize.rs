//! Whitespace cleanup between extraction and composition
//!
//! Extracted PDF text is noisy: page breaks and positioned lines leave long
//! runs of newlines, and justified source layouts leave runs of spaces.
//! Normalization collapses both so that a single blank line is the only
//! paragraph separator the composer has to understand.

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator between paragraphs in normalized text
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());

/// Collapse newline runs to one blank line, space runs to one space, and trim.
///
/// Total and idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let text = NEWLINE_RUNS.replace_all(text, PARAGRAPH_SEPARATOR);
    let text = SPACE_RUNS.replace_all(&text, " ");
    text.trim().to_string()
}

//! Output filename derivation

use crate::config::OUTPUT_SUFFIX;

/// Base name used when the upload arrives without a usable name
const FALLBACK_BASE_NAME: &str = "document";

/// Derive the download name: `<base>_새시험지.pdf`
///
/// Directory components (`/` or `\`) are dropped, then the final extension.
/// A leading dot alone is not an extension, so `.hidden` keeps its name.
pub fn derive_output_filename(original: &str) -> String {
    format!("{}{}.pdf", base_name(original), OUTPUT_SUFFIX)
}

fn base_name(original: &str) -> &str {
    let file_name = original
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(original)
        .trim();

    let stem = match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    };

    if stem.is_empty() {
        FALLBACK_BASE_NAME
    } else {
        stem
    }
}

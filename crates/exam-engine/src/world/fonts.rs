//! Font loading and coverage queries
//!
//! The cache always carries the fonts bundled with `typst-assets`. Hangul
//! and other scripts those fonts lack come from configured font
//! directories or, when enabled, the platform's system font directories.
//! A cache is immutable once built and is shared between requests.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use typst::foundations::Bytes;
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;

/// Directories searched when system fonts are enabled
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
    "C:\\Windows\\Fonts",
];

/// Where fonts are loaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontConfig {
    /// Extra directories scanned recursively for font files
    #[serde(default)]
    pub font_dirs: Vec<PathBuf>,
    /// Also scan the platform font directories
    #[serde(default = "default_system_fonts")]
    pub system_fonts: bool,
}

fn default_system_fonts() -> bool {
    true
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            font_dirs: Vec::new(),
            system_fonts: default_system_fonts(),
        }
    }
}

impl FontConfig {
    /// Only the fonts compiled into the binary
    pub fn embedded_only() -> Self {
        Self {
            font_dirs: Vec::new(),
            system_fonts: false,
        }
    }
}

/// A cache of fonts available for compilation
#[derive(Debug)]
pub struct FontCache {
    /// Metadata about the available fonts, pre-hashed for Typst
    book: LazyHash<FontBook>,
    /// The actual font data, indexed like the book
    fonts: Vec<Font>,
}

impl FontCache {
    /// Build a cache from the given configuration
    pub fn new(config: &FontConfig) -> Self {
        let mut book = FontBook::new();
        let mut fonts = Vec::new();

        Self::load_embedded_fonts(&mut book, &mut fonts);
        let embedded = fonts.len();

        for dir in &config.font_dirs {
            if dir.is_dir() {
                Self::scan_font_dir(dir, &mut book, &mut fonts);
            } else {
                tracing::warn!("Font directory {} does not exist", dir.display());
            }
        }

        if config.system_fonts {
            for dir in SYSTEM_FONT_DIRS {
                let path = Path::new(dir);
                if path.is_dir() {
                    Self::scan_font_dir(path, &mut book, &mut fonts);
                }
            }
        }

        tracing::info!(
            "Font cache initialized with {} fonts ({} embedded)",
            fonts.len(),
            embedded
        );

        Self {
            book: LazyHash::new(book),
            fonts,
        }
    }

    /// Load fonts embedded in the binary
    fn load_embedded_fonts(book: &mut FontBook, fonts: &mut Vec<Font>) {
        // Libertinus Serif, New Computer Modern and DejaVu Sans Mono
        for data in typst_assets::fonts() {
            let buffer = Bytes::from_static(data);
            for font in Font::iter(buffer) {
                book.push(font.info().clone());
                fonts.push(font);
            }
        }
    }

    /// Recursively scan a directory for font files
    fn scan_font_dir(dir: &Path, book: &mut FontBook, fonts: &mut Vec<Font>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();

            if path.is_dir() {
                Self::scan_font_dir(&path, book, fonts);
            } else if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if matches!(ext.as_str(), "ttf" | "otf" | "ttc" | "otc") {
                    Self::load_font_file(&path, book, fonts);
                }
            }
        }
    }

    /// Load a single font file; unreadable files are skipped
    fn load_font_file(path: &Path, book: &mut FontBook, fonts: &mut Vec<Font>) {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("Skipping font {}: {}", path.display(), e);
                return;
            }
        };

        let buffer = Bytes::from(data);
        for font in Font::iter(buffer) {
            book.push(font.info().clone());
            fonts.push(font);
        }
    }

    /// Get the font book
    pub fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    /// Get a font by index
    pub fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    /// Get the number of fonts
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Whether any loaded font has a glyph for `c`
    pub fn covers(&self, c: char) -> bool {
        self.fonts
            .iter()
            .any(|font| font.info().coverage.contains(c as u32))
    }

    /// List all font families, sorted and deduplicated
    pub fn list_font_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .book
            .families()
            .map(|(name, _)| name.to_string())
            .collect();

        families.sort();
        families.dedup();
        families
    }
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new(&FontConfig::default())
    }
}

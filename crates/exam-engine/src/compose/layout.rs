//! Logical layout of an exam sheet
//!
//! A [`SheetLayout`] is the ordered list of blocks the template renders:
//! one title, one info line, then one paragraph per blank-line-delimited
//! segment of the normalized text. It is the logical content of the output
//! PDF and is what two identical requests are guaranteed to share.

use serde::{Deserialize, Serialize};

use crate::config::SheetConfig;
use crate::normalize::PARAGRAPH_SEPARATOR;

/// Text drawn on each blank field of the info line
pub const BLANK_FIELD: &str = "________";

/// One rendered unit of the exam sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetBlock {
    /// Centered, bold institution name
    Title { text: String },
    /// Centered line of blank-fillable fields
    Info { fields: Vec<String> },
    /// Justified body paragraph
    Paragraph { text: String },
}

impl SheetBlock {
    /// Visit every character this block will put on the page
    pub fn for_each_char(&self, mut f: impl FnMut(char)) {
        match self {
            SheetBlock::Title { text } | SheetBlock::Paragraph { text } => text.chars().for_each(f),
            SheetBlock::Info { fields } => {
                for field in fields {
                    field.chars().for_each(&mut f);
                    ": ".chars().chain(BLANK_FIELD.chars()).for_each(&mut f);
                }
            }
        }
    }

    /// Paragraph text, if this is a body paragraph
    pub fn paragraph_text(&self) -> Option<&str> {
        match self {
            SheetBlock::Paragraph { text } => Some(text),
            _ => None,
        }
    }
}

/// Ordered blocks of one exam sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub blocks: Vec<SheetBlock>,
}

impl SheetLayout {
    /// Lay out normalized text under the configured header
    pub fn build(text: &str, config: &SheetConfig) -> Self {
        let mut blocks = Vec::with_capacity(2);
        blocks.push(SheetBlock::Title {
            text: config.title.clone(),
        });
        blocks.push(SheetBlock::Info {
            fields: config.info_fields.clone(),
        });
        blocks.extend(
            split_paragraphs(text)
                .into_iter()
                .map(|text| SheetBlock::Paragraph { text }),
        );

        Self { blocks }
    }

    /// Body paragraphs in order
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(SheetBlock::paragraph_text)
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }
}

/// Split normalized text into re-flowed paragraphs
///
/// Segments are separated by a blank line. Inside a segment every
/// whitespace run, single newlines included, becomes one space so the
/// layout engine can wrap and justify freely. Empty segments are dropped.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split(PARAGRAPH_SEPARATOR)
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

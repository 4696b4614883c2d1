//! Exam sheet configuration
//!
//! Defaults reproduce the academy's standard sheet: A4, 2 cm margins, a bold
//! centered title and a line of blank class/name/score/teacher fields.

use serde::{Deserialize, Serialize};

use crate::world::FontConfig;

/// Suffix appended to the source file's base name
pub const OUTPUT_SUFFIX: &str = "_새시험지";

/// MIME type of the generated document
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Font family that is always present (bundled by typst-assets)
pub const FALLBACK_FONT_FAMILY: &str = "Libertinus Serif";

pub const DEFAULT_TITLE: &str = "연세영어학원";

pub const DEFAULT_INFO_FIELDS: &[&str] = &["반", "이름", "점수", "선생님 확인"];

/// Korean-capable families tried before the fallback
pub const DEFAULT_FONT_FAMILIES: &[&str] = &[
    "Noto Sans CJK KR",
    "Noto Serif CJK KR",
    "NanumGothic",
    "NanumMyeongjo",
    "Malgun Gothic",
    "Apple SD Gothic Neo",
];

/// Page geometry and type sizes, all in points unless named otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetStyle {
    pub margin_cm: f64,
    pub title_size: f64,
    pub title_space_after: f64,
    pub info_size: f64,
    pub info_space_after: f64,
    pub body_size: f64,
    /// Gap between consecutive lines of one paragraph
    pub body_line_gap: f64,
    pub body_space_after: f64,
}

impl Default for SheetStyle {
    fn default() -> Self {
        Self {
            margin_cm: 2.0,
            title_size: 18.0,
            title_space_after: 20.0,
            info_size: 11.0,
            // style gap plus the spacer before the body
            info_space_after: 32.0,
            body_size: 11.0,
            body_line_gap: 5.0,
            body_space_after: 12.0,
        }
    }
}

/// Everything the composer needs besides the text itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Institution name shown at the top of page 1
    pub title: String,
    /// Labels of the blank fields on the info line
    pub info_fields: Vec<String>,
    /// Preferred font families, most preferred first
    pub font_families: Vec<String>,
    #[serde(default)]
    pub style: SheetStyle,
    #[serde(default)]
    pub fonts: FontConfig,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            info_fields: DEFAULT_INFO_FIELDS.iter().map(|s| s.to_string()).collect(),
            font_families: DEFAULT_FONT_FAMILIES.iter().map(|s| s.to_string()).collect(),
            style: SheetStyle::default(),
            fonts: FontConfig::default(),
        }
    }
}

impl SheetConfig {
    /// Font families in the order Typst should try them, always ending with
    /// a bundled family so the list is never empty
    pub fn resolved_font_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .font_families
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        if !families
            .iter()
            .any(|f| f.eq_ignore_ascii_case(FALLBACK_FONT_FAMILY))
        {
            families.push(FALLBACK_FONT_FAMILY.to_string());
        }
        families
    }
}

//! VirtualWorld implementation of the Typst World trait
//!
//! Compiles a single in-memory source against a shared font cache, with
//! JSON inputs exposed to the document as `sys.inputs`.

use std::sync::Arc;

use chrono::{Datelike, Timelike, Utc};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Array, Bytes, Datetime, Dict, Value};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};

use super::fonts::FontCache;
use super::virtual_fs::VirtualFilesystem;
use crate::error::RenderError;

/// A virtual world for in-memory Typst compilation
pub struct VirtualWorld {
    /// Virtual filesystem containing the template
    filesystem: VirtualFilesystem,
    /// Shared, read-only font cache
    fonts: Arc<FontCache>,
    /// Clock captured at construction so `today()` is stable within a compile
    time: chrono::DateTime<Utc>,
    /// Pre-hashed standard library
    library: LazyHash<Library>,
}

impl VirtualWorld {
    /// Create a new VirtualWorld with the given source and inputs
    pub fn new(
        source: String,
        inputs: serde_json::Map<String, serde_json::Value>,
        fonts: Arc<FontCache>,
    ) -> Result<Self, RenderError> {
        let filesystem = VirtualFilesystem::with_main(source);
        let inputs_dict = Self::convert_inputs(inputs)?;
        let library = Library::builder().with_inputs(inputs_dict).build();

        Ok(Self {
            filesystem,
            fonts,
            time: Utc::now(),
            library: LazyHash::new(library),
        })
    }

    /// Convert JSON values to a Typst Dict
    fn convert_inputs(
        inputs: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Dict, RenderError> {
        let mut dict = Dict::new();

        for (key, value) in inputs {
            let typst_value = Self::json_to_typst_value(&value)?;
            dict.insert(key.into(), typst_value);
        }

        Ok(dict)
    }

    /// Convert a JSON value to a Typst Value
    fn json_to_typst_value(json: &serde_json::Value) -> Result<Value, RenderError> {
        match json {
            serde_json::Value::Null => Ok(Value::None),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(RenderError::InvalidInput(format!("Invalid number: {}", n)))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Str(s.as_str().into())),
            serde_json::Value::Array(arr) => {
                let items: Vec<Value> = arr
                    .iter()
                    .map(Self::json_to_typst_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(Array::from(items.as_slice())))
            }
            serde_json::Value::Object(obj) => {
                let mut dict = Dict::new();
                for (k, v) in obj {
                    let typst_value = Self::json_to_typst_value(v)?;
                    dict.insert(k.as_str().into(), typst_value);
                }
                Ok(Value::Dict(dict))
            }
        }
    }
}

impl World for VirtualWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        self.fonts.book()
    }

    fn main(&self) -> FileId {
        self.filesystem.main_id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        self.filesystem
            .get_source(id)
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        self.filesystem
            .get_file(id)
            .cloned()
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.font(index)
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        let offset_hours = offset.unwrap_or(0);
        let adjusted = self.time + chrono::Duration::hours(offset_hours);

        Datetime::from_ymd_hms(
            adjusted.year(),
            adjusted.month() as u8,
            adjusted.day() as u8,
            adjusted.hour() as u8,
            adjusted.minute() as u8,
            adjusted.second() as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::FontConfig;
    use serde_json::json;

    fn fonts() -> Arc<FontCache> {
        Arc::new(FontCache::new(&FontConfig::embedded_only()))
    }

    fn inputs(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("inputs must be an object"),
        }
    }

    #[test]
    fn test_virtual_world_creation() {
        let world = VirtualWorld::new("Hello".to_string(), Default::default(), fonts()).unwrap();
        let source = world.source(world.main()).unwrap();
        assert_eq!(source.text(), "Hello");
        assert!(world.font(0).is_some());
    }

    #[test]
    fn test_nested_input_conversion() {
        let dict = VirtualWorld::convert_inputs(inputs(json!({
            "sheet": {
                "title": "Unit 3 Quiz",
                "blocks": [{"kind": "paragraph", "text": "Hello"}],
                "size": 11.5,
                "count": 2,
                "draft": false,
                "note": null
            }
        })))
        .unwrap();

        assert!(dict.contains("sheet"));
        let Ok(Value::Dict(sheet)) = dict.get("sheet").cloned() else {
            panic!("sheet should be a dict");
        };
        assert!(matches!(sheet.get("size"), Ok(Value::Float(_))));
        assert!(matches!(sheet.get("count"), Ok(Value::Int(2))));
        assert!(matches!(sheet.get("note"), Ok(Value::None)));
        assert!(matches!(sheet.get("blocks"), Ok(Value::Array(_))));
    }

    #[test]
    fn test_today_function() {
        let world = VirtualWorld::new("test".to_string(), Default::default(), fonts()).unwrap();
        assert!(world.today(None).is_some());
        assert!(world.today(Some(9)).is_some());
    }
}

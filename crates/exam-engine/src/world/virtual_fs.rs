//! In-memory source storage for one compilation
//!
//! The exam sheet template is the only source file. Extracted text never
//! becomes a file: it reaches the template through `sys.inputs`, so the
//! filesystem stays read-only and tiny.

use std::collections::HashMap;

use typst::foundations::Bytes;
use typst::syntax::{FileId, Source, VirtualPath};

/// Path of the entry point inside the virtual filesystem
pub const MAIN_PATH: &str = "/main.typ";

/// A file stored in the virtual filesystem
#[derive(Debug, Clone)]
struct VirtualFile {
    content: Bytes,
    source: Source,
}

/// A virtual filesystem holding the compilation's sources
#[derive(Debug, Clone)]
pub struct VirtualFilesystem {
    files: HashMap<FileId, VirtualFile>,
    main_id: FileId,
}

impl VirtualFilesystem {
    /// Create a filesystem whose entry point holds `content`
    pub fn with_main(content: impl Into<String>) -> Self {
        let main_id = Self::file_id(MAIN_PATH);
        let mut fs = Self {
            files: HashMap::new(),
            main_id,
        };
        fs.insert(main_id, content.into());
        fs
    }

    fn insert(&mut self, id: FileId, text: String) {
        let source = Source::new(id, text.clone());
        self.files.insert(
            id,
            VirtualFile {
                content: Bytes::from(text.into_bytes()),
                source,
            },
        );
    }

    /// Get the main file ID
    pub fn main_id(&self) -> FileId {
        self.main_id
    }

    /// Get a source file by ID
    pub fn get_source(&self, id: FileId) -> Option<Source> {
        self.files.get(&id).map(|file| file.source.clone())
    }

    /// Get raw file bytes by ID
    pub fn get_file(&self, id: FileId) -> Option<&Bytes> {
        self.files.get(&id).map(|f| &f.content)
    }

    fn file_id(path: &str) -> FileId {
        // No packages: every file lives in the project root
        FileId::new(None, VirtualPath::new(path))
    }
}

//! Where versification schemes, chunk lists and paragraph tables come from.

use crate::chunks::ChunkSpec;
use crate::error::{Result, UsfmError};
use crate::paragraphs::ParagraphSpec;
use crate::versification::VersificationScheme;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Source of the static reference data a book is checked against.
pub trait ResourceStore: Send + Sync {
    /// Load a versification scheme by name, e.g. `ufw`
    fn versification(&self, name: &str) -> Result<VersificationScheme>;

    /// Load the chunk boundaries of one book under a scheme
    fn chunks(&self, scheme: &str, book_id: &str) -> Result<ChunkSpec>;

    /// Load the paragraph table of one book. Books without an entry get an
    /// empty table.
    fn paragraphs(&self, book_id: &str) -> Result<ParagraphSpec>;
}

/// Reads reference data from a directory laid out as:
///
/// ```text
/// <root>/<scheme>/<scheme>.vrs
/// <root>/<scheme>/books.json
/// <root>/<scheme>/chunks/<book_id_lower>.json
/// <root>/paragraphs.json
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scheme_dir(&self, scheme: &str) -> PathBuf {
        self.root.join(scheme)
    }
}

impl ResourceStore for DirectoryStore {
    fn versification(&self, name: &str) -> Result<VersificationScheme> {
        let dir = self.scheme_dir(name);
        let read = |path: PathBuf| {
            fs::read_to_string(&path).map_err(|e| match e.kind() {
                ErrorKind::NotFound => UsfmError::SchemeNotFound(name.to_string()),
                _ => UsfmError::Io(e),
            })
        };

        let vrs = read(dir.join(format!("{}.vrs", name)))?;
        let books = read(dir.join("books.json"))?;
        log::debug!("Reading versification {} from {}", name, dir.display());

        VersificationScheme::parse(name, &vrs, &books)
    }

    fn chunks(&self, scheme: &str, book_id: &str) -> Result<ChunkSpec> {
        let path = self
            .scheme_dir(scheme)
            .join("chunks")
            .join(format!("{}.json", book_id.to_lowercase()));

        let json = fs::read_to_string(&path).map_err(|e| UsfmError::ChunkLoad {
            book_id: book_id.to_string(),
            reason: Some(format!("{}: {}", path.display(), e)),
        })?;
        ChunkSpec::parse(book_id, &json)
    }

    fn paragraphs(&self, book_id: &str) -> Result<ParagraphSpec> {
        let path = self.root.join("paragraphs.json");
        match fs::read_to_string(&path) {
            Ok(json) => ParagraphSpec::parse(book_id, &json),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No paragraph table at {}", path.display());
                Ok(ParagraphSpec::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Serves reference data held in memory, for tests and embedded use.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    schemes: HashMap<String, (String, String)>,
    chunks: HashMap<(String, String), String>,
    paragraphs: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scheme from the text of its `.vrs` file and `books.json`.
    pub fn with_scheme(
        mut self,
        name: impl Into<String>,
        vrs: impl Into<String>,
        books_json: impl Into<String>,
    ) -> Self {
        self.schemes
            .insert(name.into(), (vrs.into(), books_json.into()));
        self
    }

    pub fn with_chunks(
        mut self,
        scheme: impl Into<String>,
        book_id: impl Into<String>,
        json: impl Into<String>,
    ) -> Self {
        self.chunks
            .insert((scheme.into(), book_id.into()), json.into());
        self
    }

    pub fn with_paragraphs(mut self, json: impl Into<String>) -> Self {
        self.paragraphs = Some(json.into());
        self
    }
}

impl ResourceStore for MemoryStore {
    fn versification(&self, name: &str) -> Result<VersificationScheme> {
        let (vrs, books) = self
            .schemes
            .get(name)
            .ok_or_else(|| UsfmError::SchemeNotFound(name.to_string()))?;
        VersificationScheme::parse(name, vrs, books)
    }

    fn chunks(&self, scheme: &str, book_id: &str) -> Result<ChunkSpec> {
        let json = self
            .chunks
            .get(&(scheme.to_string(), book_id.to_string()))
            .ok_or_else(|| UsfmError::ChunkLoad {
                book_id: book_id.to_string(),
                reason: None,
            })?;
        ChunkSpec::parse(book_id, json)
    }

    fn paragraphs(&self, book_id: &str) -> Result<ParagraphSpec> {
        match &self.paragraphs {
            Some(json) => ParagraphSpec::parse(book_id, json),
            None => Ok(ParagraphSpec::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::Chunk;
    use tempfile::TempDir;

    const VRS: &str = "# test scheme\nRUT 1:22 2:23 3:18 4:22\n";
    const BOOKS: &str = r#"{"RUT": ["Ruth", 8]}"#;
    const RUT_CHUNKS: &str = r#"[{"chapter": 1, "first_verses": [1, 6]}]"#;

    fn data_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let scheme = dir.path().join("ufw");
        fs::create_dir_all(scheme.join("chunks")).unwrap();
        fs::write(scheme.join("ufw.vrs"), VRS).unwrap();
        fs::write(scheme.join("books.json"), BOOKS).unwrap();
        fs::write(scheme.join("chunks").join("rut.json"), RUT_CHUNKS).unwrap();
        dir
    }

    #[test]
    fn test_directory_store_loads_scheme() {
        let dir = data_dir();
        let store = DirectoryStore::new(dir.path());

        let scheme = store.versification("ufw").unwrap();
        assert_eq!(scheme.name(), "ufw");
        assert_eq!(scheme.book("RUT").unwrap().chapters.len(), 4);
    }

    #[test]
    fn test_directory_store_missing_scheme() {
        let dir = data_dir();
        let store = DirectoryStore::new(dir.path());
        assert!(matches!(
            store.versification("rsc"),
            Err(UsfmError::SchemeNotFound(name)) if name == "rsc"
        ));
    }

    #[test]
    fn test_directory_store_chunks() {
        let dir = data_dir();
        let store = DirectoryStore::new(dir.path());

        let spec = store.chunks("ufw", "RUT").unwrap();
        assert_eq!(spec.chunks(), &[Chunk::new(1, 1), Chunk::new(1, 6)]);

        let err = store.chunks("ufw", "GEN").unwrap_err();
        assert!(err.to_string().starts_with("Could not load chunks for GEN"));
    }

    #[test]
    fn test_directory_store_paragraphs_optional() {
        let dir = data_dir();
        let store = DirectoryStore::new(dir.path());
        assert_eq!(store.paragraphs("RUT").unwrap(), ParagraphSpec::default());

        fs::write(
            dir.path().join("paragraphs.json"),
            r#"[{"usfm_id": "RUT", "chapters": [{"number": 1, "paragraph_before": [6]}]}]"#,
        )
        .unwrap();
        assert_eq!(store.paragraphs("RUT").unwrap().paragraph_verses(1), &[6]);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new()
            .with_scheme("ufw", VRS, BOOKS)
            .with_chunks("ufw", "RUT", RUT_CHUNKS);

        assert!(store.versification("ufw").is_ok());
        assert!(matches!(
            store.versification("avd"),
            Err(UsfmError::SchemeNotFound(_))
        ));
        assert_eq!(store.chunks("ufw", "RUT").unwrap().chunks().len(), 2);
        assert_eq!(
            store.chunks("ufw", "JON").unwrap_err().to_string(),
            "Could not load chunks for JON"
        );
    }
}

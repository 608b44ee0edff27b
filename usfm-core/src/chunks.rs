//! Chunk boundaries: where each translation chunk of a book starts.

use crate::error::{Result, UsfmError};
use serde::Deserialize;
use std::fmt;

/// The first verse of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub chapter_number: u32,
    pub first_verse_number: u32,
}

impl Chunk {
    pub fn new(chapter_number: u32, first_verse_number: u32) -> Self {
        Self {
            chapter_number,
            first_verse_number,
        }
    }

    /// Identifier like `01-05`.
    pub fn chunk_id(&self) -> String {
        format!("{:02}-{:02}", self.chapter_number, self.first_verse_number)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chunk_id())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChapterChunks {
    chapter: u32,
    first_verses: Vec<u32>,
}

/// All chunk boundaries of one book, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpec {
    book_id: String,
    chunks: Vec<Chunk>,
}

impl ChunkSpec {
    /// Build a spec from boundaries that are already known.
    pub fn new(book_id: impl Into<String>, chunks: Vec<Chunk>) -> Self {
        Self {
            book_id: book_id.into(),
            chunks,
        }
    }

    /// Parse the JSON chunk list for a book:
    /// `[{"chapter": 1, "first_verses": [1, 4, 9]}, ...]`.
    ///
    /// Boundaries are kept in file order. They are expected to ascend within
    /// each chapter; nothing here re-sorts them.
    pub fn parse(book_id: &str, json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Err(UsfmError::ChunkLoad {
                book_id: book_id.to_string(),
                reason: Some("empty source".to_string()),
            });
        }

        let chapters: Vec<ChapterChunks> =
            serde_json::from_str(json).map_err(|e| UsfmError::ChunkLoad {
                book_id: book_id.to_string(),
                reason: Some(e.to_string()),
            })?;

        let chunks = chapters
            .iter()
            .flat_map(|c| c.first_verses.iter().map(|v| Chunk::new(c.chapter, *v)))
            .collect();

        Ok(Self::new(book_id, chunks))
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Boundaries belonging to one chapter, in source order.
    pub fn for_chapter(&self, chapter_number: u32) -> Vec<Chunk> {
        self.chunks
            .iter()
            .filter(|c| c.chapter_number == chapter_number)
            .copied()
            .collect()
    }
}

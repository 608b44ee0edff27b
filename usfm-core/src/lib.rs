//! USFM verification and re-chunking engine
//!
//! Checks a book of USFM scripture text against a versification scheme and
//! rewrites it with chunk boundary markers:
//! - Tag check against the USFM marker catalog
//! - Chapter and verse numbering check
//! - Chunk marker insertion from per-book chunk lists

pub mod book;
pub mod chunker;
pub mod chunks;
pub mod cleaner;
pub mod error;
pub mod findings;
mod markers;
pub mod metadata;
pub mod paragraphs;
pub mod store;
pub mod tags;
pub mod validate;
pub mod versification;

pub use book::{Book, Chapter, Chunked, detect_book_id};
pub use chunker::{Chunker, DEFAULT_CHUNK_MARKER};
pub use chunks::{Chunk, ChunkSpec};
pub use error::{Result, UsfmError};
pub use findings::Finding;
pub use metadata::{BibleMetadata, versification_for_language};
pub use paragraphs::ParagraphSpec;
pub use store::{DirectoryStore, MemoryStore, ResourceStore};
pub use tags::{TagCatalog, TagValidator};
pub use validate::ChapterVerseValidator;
pub use versification::{BookSpec, ChapterSpec, VersificationScheme};

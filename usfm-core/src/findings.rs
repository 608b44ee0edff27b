//! Validation findings accumulated while checking a book.

use thiserror::Error;

/// A single non-fatal problem found in a book's USFM.
///
/// The `Display` form is the human-readable line reported to translators, so
/// the wording here is part of the tool's output contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    #[error("Invalid chapter number, {book} \"{value}\"")]
    InvalidChapterNumber { book: String, value: String },

    #[error("Chapter not found, {book} {chapter}")]
    ChapterNotFound { book: String, chapter: u32 },

    #[error("All verse markers are missing for {book} {chapter}")]
    AllVersesMissing { book: String, chapter: u32 },

    #[error("Invalid verse bridge, {book} {chapter}:{value}")]
    InvalidVerseBridge {
        book: String,
        chapter: u32,
        value: String,
    },

    #[error("Invalid verse number, {book} {chapter}:{value}")]
    InvalidVerseNumber {
        book: String,
        chapter: u32,
        value: String,
    },

    #[error("Verse not found, {book} {chapter}:{verse}")]
    VerseNotFound { book: String, chapter: u32, verse: u32 },

    #[error("Verse out-of-order, {book} {chapter}:{verse}")]
    VerseOutOfOrder { book: String, chapter: u32, verse: u32 },

    #[error("Duplicate verse, {book} {chapter}:{verse}")]
    DuplicateVerse { book: String, chapter: u32, verse: u32 },

    #[error("Verses {first} through {last} are missing in {book} {chapter}")]
    MissingVerses {
        book: String,
        chapter: u32,
        first: u32,
        last: u32,
    },

    #[error("There {} in {book}", conflict_phrase(.count))]
    GitConflict { book: String, count: usize },

    #[error("Invalid USFM tag in {location}: {tag}")]
    InvalidTag { location: String, tag: String },

    #[error("Malformed USFM tag in {location}: \"{text}\"")]
    MalformedTag { location: String, text: String },

    #[error("Verse tag without text in {location}: \"{tag}\"")]
    VerseWithoutText { location: String, tag: String },
}

fn conflict_phrase(count: &usize) -> String {
    if *count == 1 {
        "is 1 Git conflict".to_string()
    } else {
        format!("are {} Git conflicts", count)
    }
}

//! Versification schemes: the expected chapters and verse counts of every book.

use crate::error::{Result, UsfmError};
use serde::Deserialize;
use std::collections::HashMap;

/// Expected shape of one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterSpec {
    pub number: u32,
    pub expected_max_verse_number: u32,
}

/// Expected shape of one book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSpec {
    /// Three character USFM book code, e.g. `GEN`
    pub book_id: String,
    /// Name shown to people, e.g. `Genesis`
    pub display_name: String,
    /// Canonical position of the book, 1 for Genesis
    pub ordinal_number: u32,
    /// Chapters in the order they appear in the `.vrs` line
    pub chapters: Vec<ChapterSpec>,
}

impl BookSpec {
    /// Look a chapter up by its number.
    pub fn chapter(&self, number: u32) -> Option<&ChapterSpec> {
        self.chapters.iter().find(|c| c.number == number)
    }
}

/// A loaded versification scheme such as `ufw` or `rsc`.
///
/// Immutable once parsed, so one instance can be shared by every book being
/// validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersificationScheme {
    name: String,
    books: Vec<BookSpec>,
}

/// Ordinals in `books.json` appear both as numbers and as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberValue {
    Int(u32),
    Text(String),
}

impl NumberValue {
    pub(crate) fn to_u32(&self) -> Option<u32> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl VersificationScheme {
    /// Parse a scheme from the text of its `.vrs` file and its `books.json`
    /// book list (`{"GEN": ["Genesis", 1], ...}`).
    ///
    /// Books listed in `books.json` that have no line in the `.vrs` file are
    /// left out of the scheme.
    pub fn parse(name: &str, vrs_text: &str, books_json: &str) -> Result<Self> {
        let book_list: HashMap<String, (String, NumberValue)> = serde_json::from_str(books_json)
            .map_err(|e| UsfmError::parse(format!("{}/books.json", name), e.to_string()))?;

        let cleaned = vrs_text.replace('\r', "");
        let lines: Vec<&str> = cleaned
            .split('\n')
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();

        let mut books = Vec::with_capacity(book_list.len());

        for (book_id, (display_name, ordinal)) in &book_list {
            let ordinal_number = ordinal.to_u32().ok_or_else(|| {
                UsfmError::parse(
                    format!("{}/books.json", name),
                    format!("book number for {} is not a number", book_id),
                )
            })?;

            let Some(line) = lines.iter().find(|l| l.get(..3) == Some(book_id.as_str())) else {
                log::warn!("No versification line for {} in {}.vrs", book_id, name);
                continue;
            };

            let chapters = parse_chapter_tokens(name, book_id, line.get(3..).unwrap_or(""))?;

            books.push(BookSpec {
                book_id: book_id.clone(),
                display_name: display_name.clone(),
                ordinal_number,
                chapters,
            });
        }

        books.sort_by(|a, b| {
            a.ordinal_number
                .cmp(&b.ordinal_number)
                .then_with(|| a.book_id.cmp(&b.book_id))
        });

        log::debug!("Loaded versification {} with {} books", name, books.len());

        Ok(Self {
            name: name.to_string(),
            books,
        })
    }

    /// Scheme name, e.g. `ufw`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All books, ordered by ordinal number.
    pub fn books(&self) -> &[BookSpec] {
        &self.books
    }

    /// Look a book up by its three character code.
    pub fn book(&self, book_id: &str) -> Option<&BookSpec> {
        self.books.iter().find(|b| b.book_id == book_id)
    }
}

/// Parse the `chapter:max_verse` tokens that follow a book code.
fn parse_chapter_tokens(scheme: &str, book_id: &str, tokens: &str) -> Result<Vec<ChapterSpec>> {
    tokens
        .split_whitespace()
        .map(|token| {
            let parsed = token
                .split_once(':')
                .and_then(|(c, v)| Some((c.parse::<u32>().ok()?, v.parse::<u32>().ok()?)));

            match parsed {
                Some((number, expected_max_verse_number)) => Ok(ChapterSpec {
                    number,
                    expected_max_verse_number,
                }),
                None => Err(UsfmError::parse(
                    format!("{}.vrs", scheme),
                    format!("invalid chapter token \"{}\" for {}", token, book_id),
                )),
            }
        })
        .collect()
}

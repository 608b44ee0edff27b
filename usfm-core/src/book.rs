//! The book aggregate and its processing pipeline.
//!
//! A [`Book`] moves through its states by value, so the steps can only run in
//! order:
//!
//! ```text
//! Empty -> TextSet -> Cleaned -> TagsChecked -> StructureChecked -> Chunked
//! ```

use crate::chunker::{Chunker, DEFAULT_CHUNK_MARKER};
use crate::chunks::{Chunk, ChunkSpec};
use crate::cleaner;
use crate::error::{Result, UsfmError};
use crate::findings::Finding;
use crate::paragraphs::{self, ParagraphSpec};
use crate::tags::{TagCatalog, TagValidator};
use crate::validate::ChapterVerseValidator;
use crate::versification::{BookSpec, ChapterSpec, VersificationScheme};
use once_cell::sync::Lazy;
use regex::Regex;
use std::marker::PhantomData;

static BOOK_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\id[ \t\u{00A0}]+(\w{3})").expect("book id pattern is valid"));

/// One chapter of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub number: u32,
    pub expected_max_verse_number: u32,
    /// Set once a `\c` marker for this chapter has been seen
    pub found: bool,
    /// This chapter's own text, starting with its `\c` line
    pub usfm: String,
}

impl Chapter {
    pub fn new(number: u32, expected_max_verse_number: u32) -> Self {
        Self {
            number,
            expected_max_verse_number,
            found: false,
            usfm: String::new(),
        }
    }
}

impl From<&ChapterSpec> for Chapter {
    fn from(spec: &ChapterSpec) -> Self {
        Self::new(spec.number, spec.expected_max_verse_number)
    }
}

/// No text yet.
#[derive(Debug, Clone, Copy)]
pub struct Empty;
/// Raw text set, line endings normalized.
#[derive(Debug, Clone, Copy)]
pub struct TextSet;
/// Old chunk markers and stray blank lines removed.
#[derive(Debug, Clone, Copy)]
pub struct Cleaned;
#[derive(Debug, Clone, Copy)]
pub struct TagsChecked;
/// Chapters located and verse numbering checked.
#[derive(Debug, Clone, Copy)]
pub struct StructureChecked;
/// Chunk markers inserted.
#[derive(Debug, Clone, Copy)]
pub struct Chunked;

/// A book of USFM text together with its versification and findings.
#[derive(Debug, Clone)]
pub struct Book<S = Empty> {
    book_id: String,
    display_name: String,
    ordinal_number: u32,
    chunk_marker: String,
    chapters: Vec<Chapter>,
    usfm: String,
    header_usfm: String,
    findings: Vec<Finding>,
    chunking_gaps: Vec<Chunk>,
    state: PhantomData<S>,
}

impl<S> Book<S> {
    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn ordinal_number(&self) -> u32 {
        self.ordinal_number
    }

    pub fn chunk_marker(&self) -> &str {
        &self.chunk_marker
    }

    /// Two-digit ordinal and book id, e.g. `01-GEN`.
    pub fn directory_name(&self) -> String {
        format!("{:02}-{}", self.ordinal_number, self.book_id)
    }

    pub fn file_name(&self) -> String {
        format!("{}.usfm", self.directory_name())
    }

    pub fn usfm(&self) -> &str {
        &self.usfm
    }

    pub fn header_usfm(&self) -> &str {
        &self.header_usfm
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Every finding so far as a message, in the order found.
    pub fn validation_errors(&self) -> Vec<String> {
        self.findings.iter().map(|f| f.to_string()).collect()
    }

    /// Chunk boundaries that could not be placed.
    pub fn chunking_gaps(&self) -> &[Chunk] {
        &self.chunking_gaps
    }

    fn into_state<T>(self) -> Book<T> {
        Book {
            book_id: self.book_id,
            display_name: self.display_name,
            ordinal_number: self.ordinal_number,
            chunk_marker: self.chunk_marker,
            chapters: self.chapters,
            usfm: self.usfm,
            header_usfm: self.header_usfm,
            findings: self.findings,
            chunking_gaps: self.chunking_gaps,
            state: PhantomData,
        }
    }

    fn record(&mut self, findings: Vec<Finding>) {
        for finding in &findings {
            log::warn!("** {}", finding);
        }
        self.findings.extend(findings);
    }
}

impl Book<Empty> {
    pub fn new(spec: &BookSpec) -> Self {
        Self {
            book_id: spec.book_id.clone(),
            display_name: spec.display_name.clone(),
            ordinal_number: spec.ordinal_number,
            chunk_marker: DEFAULT_CHUNK_MARKER.to_string(),
            chapters: spec.chapters.iter().map(Chapter::from).collect(),
            usfm: String::new(),
            header_usfm: String::new(),
            findings: Vec::new(),
            chunking_gaps: Vec::new(),
            state: PhantomData,
        }
    }

    /// Look up `book_id` in the scheme and build an empty book for it.
    pub fn create(scheme: &VersificationScheme, book_id: &str) -> Result<Self> {
        let well_formed = book_id.len() == 3
            && book_id
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if !well_formed {
            return Err(UsfmError::InvalidBookId(book_id.to_string()));
        }

        let spec = scheme.book(book_id).ok_or_else(|| UsfmError::UnknownBook {
            book_id: book_id.to_string(),
            scheme: scheme.name().to_string(),
        })?;
        Ok(Self::new(spec))
    }

    /// Use a chunk boundary marker other than `\s5`.
    pub fn with_chunk_marker(mut self, marker: impl Into<String>) -> Self {
        self.chunk_marker = marker.into();
        self
    }

    pub fn set_usfm(mut self, usfm: &str) -> Book<TextSet> {
        let text = cleaner::normalize_line_endings(usfm);
        self.usfm = cleaner::repair_tag_spacing(&text);
        self.into_state()
    }

    /// Run every step from raw text to chunked text.
    pub fn process(
        self,
        usfm: &str,
        chunks: &ChunkSpec,
        paragraphs: Option<&ParagraphSpec>,
    ) -> Book<Chunked> {
        let mut book = self
            .set_usfm(usfm)
            .clean_usfm()
            .verify_usfm_tags()
            .verify_chapters_and_verses();
        if let Some(paragraphs) = paragraphs {
            book.insert_paragraph_markers(paragraphs);
        }
        book.apply_chunks(chunks)
    }
}

impl Book<TextSet> {
    pub fn clean_usfm(mut self) -> Book<Cleaned> {
        self.usfm = cleaner::clean_usfm(&self.usfm, &self.chunk_marker);
        self.into_state()
    }
}

impl Book<Cleaned> {
    pub fn verify_usfm_tags(mut self) -> Book<TagsChecked> {
        log::info!("Verifying {}", self.book_id);

        let findings = TagValidator::new(TagCatalog::standard())
            .with_exception(self.chunk_marker.clone())
            .scan_book(&self.usfm);
        self.record(findings);
        self.into_state()
    }
}

impl Book<TagsChecked> {
    pub fn verify_chapters_and_verses(mut self) -> Book<StructureChecked> {
        let report = ChapterVerseValidator::new(&self.book_id).validate(&self.usfm, &mut self.chapters);
        self.header_usfm = report.header_usfm;
        self.findings.extend(report.findings);
        self.into_state()
    }
}

impl Book<StructureChecked> {
    /// Add `\p` lines before the listed verses of chapters that have none.
    pub fn insert_paragraph_markers(&mut self, spec: &ParagraphSpec) {
        for chapter in self.chapters.iter_mut().filter(|c| c.found) {
            let verses = spec.paragraph_verses(chapter.number);
            if verses.is_empty() {
                continue;
            }
            match paragraphs::insert_paragraph_markers(&chapter.usfm, verses) {
                Some(usfm) => chapter.usfm = usfm,
                None => log::debug!(
                    "{} {} already has paragraph markers",
                    self.book_id,
                    chapter.number
                ),
            }
        }
    }

    /// Rebuild the book text from the header and the found chapters.
    pub fn build_usfm_from_chapters(&mut self) {
        self.usfm = assemble(&self.header_usfm, &self.chapters);
    }

    pub fn apply_chunks(mut self, spec: &ChunkSpec) -> Book<Chunked> {
        if spec.book_id() != self.book_id {
            log::debug!(
                "Chunk list for {} applied to {}",
                spec.book_id(),
                self.book_id
            );
        }

        let chunker = Chunker::new(self.chunk_marker.clone());
        for chapter in self.chapters.iter_mut().filter(|c| c.found) {
            let missed = chunker.apply(chapter, &spec.for_chapter(chapter.number));
            for chunk in &missed {
                log::warn!("Could not place chunk {} in {}", chunk, self.book_id);
            }
            self.chunking_gaps.extend(missed);
        }

        self.usfm = assemble(&self.header_usfm, &self.chapters);
        self.into_state()
    }
}

impl Book<Chunked> {
    pub fn into_usfm(self) -> String {
        self.usfm
    }
}

/// Header, blank line, then each found chapter in order, separated by blank
/// lines.
fn assemble(header: &str, chapters: &[Chapter]) -> String {
    let mut found: Vec<&Chapter> = chapters.iter().filter(|c| c.found).collect();
    found.sort_by_key(|c| c.number);

    let mut parts: Vec<&str> = Vec::with_capacity(found.len() + 1);
    if !header.is_empty() {
        parts.push(header);
    }
    parts.extend(found.iter().map(|c| c.usfm.trim_matches('\n')));

    let mut usfm = parts.join("\n\n");
    usfm.push('\n');
    usfm
}

/// The book id from the `\id` line, if there is one.
pub fn detect_book_id(usfm: &str) -> Option<String> {
    BOOK_ID
        .captures(usfm)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOKS: &str = r#"{"RUT": ["Ruth", 8], "JON": ["Jonah", 32]}"#;
    const VRS: &str = "RUT 1:3 2:2\nJON 1:2\n";

    fn scheme() -> VersificationScheme {
        VersificationScheme::parse("test", VRS, BOOKS).unwrap()
    }

    fn ruth() -> Book {
        Book::create(&scheme(), "RUT").unwrap()
    }

    #[test]
    fn test_create_book() {
        let book = ruth();
        assert_eq!(book.display_name(), "Ruth");
        assert_eq!(book.directory_name(), "08-RUT");
        assert_eq!(book.file_name(), "08-RUT.usfm");
        assert_eq!(book.chapters().len(), 2);
        assert_eq!(book.chapters()[0].expected_max_verse_number, 3);
        assert!(book.chapters().iter().all(|c| !c.found));
    }

    #[test]
    fn test_create_rejects_bad_ids() {
        let scheme = scheme();
        assert!(matches!(
            Book::create(&scheme, "rut"),
            Err(UsfmError::InvalidBookId(_))
        ));
        assert!(matches!(
            Book::create(&scheme, "RUTH"),
            Err(UsfmError::InvalidBookId(_))
        ));
        assert!(matches!(
            Book::create(&scheme, "GEN"),
            Err(UsfmError::UnknownBook { .. })
        ));
    }

    #[test]
    fn test_set_usfm_normalizes() {
        let book = ruth().set_usfm("\\id\u{00A0}RUT\r\n\\c 1\r\n");
        assert_eq!(book.usfm(), "\\id RUT\n\\c 1\n");
    }

    #[test]
    fn test_clean_strips_old_chunks() {
        let book = ruth()
            .set_usfm("\\id RUT\n\n\n\\c 1\n\\s5\n\\v 1 a\n")
            .clean_usfm();
        assert_eq!(book.usfm(), "\\id RUT\n\n\\c 1\n\\v 1 a\n");
    }

    #[test]
    fn test_tag_findings_recorded() {
        let book = ruth()
            .set_usfm("\\id RUT\n\\c 1\n\\v 1 a \\bogus b\n")
            .clean_usfm()
            .verify_usfm_tags();
        assert_eq!(
            book.validation_errors(),
            vec!["Invalid USFM tag in \\c 1: \\bogus"]
        );
    }

    #[test]
    fn test_custom_marker_is_not_a_finding() {
        let book = ruth()
            .with_chunk_marker("\\zchunk")
            .set_usfm("\\id RUT\n\\c 1\n\\v 1 a\n")
            .clean_usfm()
            .verify_usfm_tags();
        assert!(book.findings().is_empty());
        assert_eq!(book.chunk_marker(), "\\zchunk");
    }

    #[test]
    fn test_structure_check_fills_chapters() {
        let book = ruth()
            .set_usfm("\\id RUT\n\\c 2\n\\v 1 x\n\\v 2 y\n\\c 1\n\\v 1 a\n\\v 2 b\n\\v 3 c\n")
            .clean_usfm()
            .verify_usfm_tags()
            .verify_chapters_and_verses();

        assert!(book.findings().is_empty(), "{:?}", book.validation_errors());
        assert_eq!(book.header_usfm(), "\\id RUT");
        assert_eq!(book.chapters()[0].usfm, "\\c 1\n\\v 1 a\n\\v 2 b\n\\v 3 c\n");
    }

    #[test]
    fn test_build_sorts_chapters() {
        let mut book = ruth()
            .set_usfm("\\id RUT\n\\c 2\n\\v 1 x\n\\v 2 y\n\\c 1\n\\v 1 a\n\\v 2 b\n\\v 3 c\n")
            .clean_usfm()
            .verify_usfm_tags()
            .verify_chapters_and_verses();
        book.build_usfm_from_chapters();

        assert_eq!(
            book.usfm(),
            "\\id RUT\n\n\\c 1\n\\v 1 a\n\\v 2 b\n\\v 3 c\n\n\\c 2\n\\v 1 x\n\\v 2 y\n"
        );
    }

    #[test]
    fn test_build_without_header() {
        let chapters = vec![Chapter {
            number: 1,
            expected_max_verse_number: 1,
            found: true,
            usfm: "\n\\c 1\n\\v 1 a\n".to_string(),
        }];
        assert_eq!(assemble("", &chapters), "\\c 1\n\\v 1 a\n");
    }

    #[test]
    fn test_paragraphs_then_chunks() {
        let paragraphs = ParagraphSpec::parse(
            "RUT",
            r#"[{"usfm_id": "RUT", "chapters": [{"number": 1, "paragraph_before": [3]}]}]"#,
        )
        .unwrap();
        let chunks = ChunkSpec::new(
            "RUT",
            vec![Chunk::new(1, 1), Chunk::new(1, 3), Chunk::new(2, 1)],
        );

        let book = ruth().process(
            "\\id RUT\n\\c 1\n\\v 1 a \\v 2 b \\v 3 c\n\\c 2\n\\v 1 x\n\\v 2 y\n",
            &chunks,
            Some(&paragraphs),
        );

        assert!(book.findings().is_empty(), "{:?}", book.validation_errors());
        assert!(book.chunking_gaps().is_empty());
        assert_eq!(
            book.into_usfm(),
            "\\id RUT\n\n\\s5\n\\c 1\n\\v 1 a \\v 2 b \n\n\\s5\n\\p\n\\v 3 c\n\n\\s5\n\\c 2\n\\v 1 x\n\\v 2 y\n"
        );
    }

    #[test]
    fn test_unplaced_chunk_is_a_gap() {
        let chunks = ChunkSpec::new("JON", vec![Chunk::new(1, 1), Chunk::new(1, 2)]);
        let book = Book::create(&scheme(), "JON")
            .unwrap()
            .process("\\id JON\n\\c 1\n\\v 1-2 a\n", &chunks, None);

        assert!(book.findings().is_empty(), "{:?}", book.validation_errors());
        assert_eq!(book.chunking_gaps(), &[Chunk::new(1, 2)]);
    }

    #[test]
    fn test_detect_book_id() {
        assert_eq!(detect_book_id("\\id RUT EN_ULT\n"), Some("RUT".to_string()));
        assert_eq!(detect_book_id("\\id\u{00A0}1jn\n"), Some("1JN".to_string()));
        assert_eq!(detect_book_id("\\c 1\n"), None);
    }
}

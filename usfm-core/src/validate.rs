//! Chapter and verse numbering checks.

use crate::book::Chapter;
use crate::findings::Finding;
use crate::markers::{self, CHAPTER_MARKER, VERSE_MARKER};
use std::collections::HashSet;

/// Literal left behind by an unresolved merge.
pub const GIT_CONFLICT_MARKER: &str = "<<<< HEAD";

/// What the structure check produced besides the per-chapter text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureReport {
    /// Text before the first chapter marker, trimmed
    pub header_usfm: String,
    /// Findings in the order they were discovered
    pub findings: Vec<Finding>,
}

/// Walks the chapter and verse markers of one book.
///
/// Every problem is recorded and the walk carries on, so one pass reports
/// everything that is wrong with the book.
#[derive(Debug)]
pub struct ChapterVerseValidator<'a> {
    book_id: &'a str,
    findings: Vec<Finding>,
}

impl<'a> ChapterVerseValidator<'a> {
    pub fn new(book_id: &'a str) -> Self {
        Self {
            book_id,
            findings: Vec::new(),
        }
    }

    /// Check `text` against `chapters`, marking the chapters that were found
    /// and appending each chapter's own text to its `usfm`.
    pub fn validate(mut self, text: &str, chapters: &mut [Chapter]) -> StructureReport {
        let conflicts = text.matches(GIT_CONFLICT_MARKER).count();
        if conflicts > 0 {
            self.push(Finding::GitConflict {
                book: self.book_id.to_string(),
                count: conflicts,
            });
        }

        let split = markers::split_on(&CHAPTER_MARKER, text);
        let header_usfm = split.head.trim().to_string();

        for section in &split.sections {
            let Some(number) = parse_number(section.token) else {
                self.push(Finding::InvalidChapterNumber {
                    book: self.book_id.to_string(),
                    value: section.token.to_string(),
                });
                continue;
            };

            let Some(chapter) = chapters.iter_mut().find(|c| c.number == number) else {
                self.push(Finding::InvalidChapterNumber {
                    book: self.book_id.to_string(),
                    value: section.token.to_string(),
                });
                continue;
            };

            chapter.found = true;
            self.check_verses(chapter.number, chapter.expected_max_verse_number, section.body);

            let body = section.body.trim_start_matches('\n').trim_end();
            chapter.usfm.push_str(section.marker.trim());
            chapter.usfm.push('\n');
            if !body.is_empty() {
                chapter.usfm.push_str(body);
                chapter.usfm.push('\n');
            }
        }

        for chapter in chapters.iter().filter(|c| !c.found) {
            self.push(Finding::ChapterNotFound {
                book: self.book_id.to_string(),
                chapter: chapter.number,
            });
        }

        StructureReport {
            header_usfm,
            findings: self.findings,
        }
    }

    /// Check the verse markers of one chapter body.
    fn check_verses(&mut self, chapter: u32, max_verse: u32, body: &str) {
        let split = markers::split_on(&VERSE_MARKER, body);
        if split.sections.is_empty() {
            self.push(Finding::AllVersesMissing {
                book: self.book_id.to_string(),
                chapter,
            });
            return;
        }

        let mut tracker = VerseTracker::new(chapter, max_verse);

        for section in &split.sections {
            let token = section.token;

            if token.contains('-') {
                match parse_bridge(token) {
                    Some((first, last)) => {
                        for verse in first..=last.min(max_verse) {
                            tracker.check(self, verse);
                        }
                        if last > max_verse {
                            tracker.check(self, last);
                        }
                    }
                    None => self.push(Finding::InvalidVerseBridge {
                        book: self.book_id.to_string(),
                        chapter,
                        value: token.to_string(),
                    }),
                }
            } else {
                match parse_number(token) {
                    Some(verse) if verse > 0 => tracker.check(self, verse),
                    _ => self.push(Finding::InvalidVerseNumber {
                        book: self.book_id.to_string(),
                        chapter,
                        value: token.to_string(),
                    }),
                }
            }
        }

        if tracker.last_verse < max_verse {
            self.push(Finding::MissingVerses {
                book: self.book_id.to_string(),
                chapter,
                first: tracker.last_verse + 1,
                last: max_verse,
            });
        }
    }

    fn push(&mut self, finding: Finding) {
        log::warn!("** {}", finding);
        self.findings.push(finding);
    }
}

/// Running state of the verse walk through one chapter.
#[derive(Debug)]
struct VerseTracker {
    chapter: u32,
    max_verse: u32,
    last_verse: u32,
    processed: HashSet<u32>,
}

impl VerseTracker {
    fn new(chapter: u32, max_verse: u32) -> Self {
        Self {
            chapter,
            max_verse,
            last_verse: 0,
            processed: HashSet::new(),
        }
    }

    fn check(&mut self, validator: &mut ChapterVerseValidator<'_>, verse: u32) {
        let book = validator.book_id.to_string();
        let chapter = self.chapter;

        // Past the end of the chapter: report it, count the rest of the
        // chapter as skipped, and keep tracking from one past the end.
        if verse > self.max_verse {
            validator.push(Finding::InvalidVerseNumber {
                book: book.clone(),
                chapter,
                value: verse.to_string(),
            });
            self.report_gap(validator, &book, self.max_verse.saturating_add(1));
            self.last_verse = self.last_verse.max(self.max_verse.saturating_add(1));
            return;
        }

        self.report_gap(validator, &book, verse);

        if verse < self.last_verse {
            validator.push(Finding::VerseOutOfOrder {
                book,
                chapter,
                verse,
            });
        } else if verse == self.last_verse || self.processed.contains(&verse) {
            validator.push(Finding::DuplicateVerse {
                book,
                chapter,
                verse,
            });
        }

        if verse > self.last_verse {
            self.last_verse = verse;
        }
        self.processed.insert(verse);
    }

    /// Report the verses between the last one seen and `verse` as not found,
    /// stopping at the end of the chapter.
    fn report_gap(&mut self, validator: &mut ChapterVerseValidator<'_>, book: &str, verse: u32) {
        while verse > self.last_verse.saturating_add(1) && self.last_verse < self.max_verse {
            validator.push(Finding::VerseNotFound {
                book: book.to_string(),
                chapter: self.chapter,
                verse: self.last_verse + 1,
            });
            self.last_verse += 1;
        }
    }
}

/// A chapter or verse number: ASCII digits only.
fn parse_number(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// A verse bridge such as `3-5`, with a non-empty ascending range.
fn parse_bridge(token: &str) -> Option<(u32, u32)> {
    let (first, last) = token.split_once('-')?;
    let first = parse_number(first.trim())?;
    let last = parse_number(last.trim())?;
    (first > 0 && first <= last).then_some((first, last))
}

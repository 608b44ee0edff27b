//! Paragraph break tables used to add `\p` markers to unparagraphed text.

use crate::error::{Result, UsfmError};
use crate::versification::NumberValue;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BookParagraphs {
    usfm_id: String,
    chapters: Vec<ChapterParagraphs>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChapterParagraphs {
    number: NumberValue,
    paragraph_before: Vec<NumberValue>,
}

/// The verses of one book that begin a new paragraph, by chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphSpec {
    chapters: HashMap<u32, Vec<u32>>,
}

impl ParagraphSpec {
    /// Select one book out of a paragraph table in the
    /// `[{"usfm_id": "GEN", "chapters": [{"number": "1", "paragraph_before": [1, 3]}]}]`
    /// format. A book missing from the table yields an empty spec.
    pub fn parse(book_id: &str, json: &str) -> Result<Self> {
        let books: Vec<BookParagraphs> = serde_json::from_str(json)
            .map_err(|e| UsfmError::parse("paragraph table", e.to_string()))?;

        let Some(book) = books.into_iter().find(|b| b.usfm_id == book_id) else {
            log::debug!("No paragraph data for {}", book_id);
            return Ok(Self::default());
        };

        let mut chapters = HashMap::new();
        for chapter in book.chapters {
            let number = chapter.number.to_u32().ok_or_else(|| {
                UsfmError::parse("paragraph table", format!("bad chapter number in {}", book_id))
            })?;
            let verses = chapter
                .paragraph_before
                .iter()
                .map(|v| {
                    v.to_u32().ok_or_else(|| {
                        UsfmError::parse(
                            "paragraph table",
                            format!("bad verse number in {} {}", book_id, number),
                        )
                    })
                })
                .collect::<Result<Vec<u32>>>()?;
            chapters.insert(number, verses);
        }

        Ok(Self { chapters })
    }

    /// Verses that start a paragraph in the given chapter.
    pub fn paragraph_verses(&self, chapter_number: u32) -> &[u32] {
        self.chapters
            .get(&chapter_number)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Put a `\p` line before each listed verse, unless the chapter already has
/// paragraph markers of its own.
pub fn insert_paragraph_markers(chapter_usfm: &str, paragraph_verses: &[u32]) -> Option<String> {
    if chapter_usfm.contains("\n\\p") {
        return None;
    }

    let mut usfm = chapter_usfm.to_string();
    for verse in paragraph_verses {
        let marker = format!("\\v {} ", verse);
        usfm = usfm.replace(&marker, &format!("\n\\p\n{}", marker));
    }
    Some(usfm)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[
        {"usfm_id": "RUT", "chapters": [
            {"number": "1", "paragraph_before": [1, "3"]},
            {"number": 2, "paragraph_before": [2]}
        ]}
    ]"#;

    #[test]
    fn test_parse_table() {
        let spec = ParagraphSpec::parse("RUT", TABLE).unwrap();
        assert_eq!(spec.paragraph_verses(1), &[1, 3]);
        assert_eq!(spec.paragraph_verses(2), &[2]);
        assert!(spec.paragraph_verses(3).is_empty());
    }

    #[test]
    fn test_missing_book_is_empty() {
        let spec = ParagraphSpec::parse("GEN", TABLE).unwrap();
        assert_eq!(spec, ParagraphSpec::default());
    }

    #[test]
    fn test_insert_markers() {
        let usfm = "\\c 1\n\\v 1 one \\v 2 two \\v 3 three\n";
        let result = insert_paragraph_markers(usfm, &[1, 3]).unwrap();
        assert_eq!(
            result,
            "\\c 1\n\n\\p\n\\v 1 one \\v 2 two \n\\p\n\\v 3 three\n"
        );
    }

    #[test]
    fn test_existing_paragraphs_left_alone() {
        let usfm = "\\c 1\n\\p\n\\v 1 one\n";
        assert!(insert_paragraph_markers(usfm, &[1]).is_none());
    }
}

//! Chunk boundary insertion.

use crate::book::Chapter;
use crate::chunks::Chunk;
use crate::markers::VERSE_MARKER;

/// Chunk boundary marker used when none is configured.
pub const DEFAULT_CHUNK_MARKER: &str = "\\s5";

/// Inserts chunk boundary markers into chapter text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunker {
    marker: String,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_MARKER)
    }
}

impl Chunker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Rewrite `chapter.usfm` with a boundary marker line before the start of
    /// each chunk.
    ///
    /// Blank lines are dropped. A boundary always goes before the first line,
    /// which covers the chunk starting at verse 1. Every other boundary goes
    /// before the line holding its first verse, or before the `\p` directly
    /// above that line. The boundaries must be in verse order: once one cannot
    /// be found, none of the following ones are placed either.
    ///
    /// Returns the boundaries that were not placed. Running this twice on the
    /// same chapter inserts every marker twice.
    pub fn apply(&self, chapter: &mut Chapter, chunks: &[Chunk]) -> Vec<Chunk> {
        let lines: Vec<&str> = chapter
            .usfm
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();

        if lines.is_empty() {
            return chunks
                .iter()
                .filter(|c| c.first_verse_number != 1)
                .copied()
                .collect();
        }

        let boundary = format!("\n{}", self.marker);
        let mut output: Vec<&str> = vec![boundary.as_str()];
        let mut next = 0;
        let mut previous_line = "";

        for line in lines {
            while next < chunks.len() && chunks[next].first_verse_number == 1 {
                next += 1;
            }

            if next < chunks.len() && starts_verse(line, chunks[next].first_verse_number) {
                if previous_line.trim() == "\\p" {
                    output.insert(output.len() - 1, &boundary);
                } else {
                    output.push(&boundary);
                }
                next += 1;
            }

            output.push(line);
            previous_line = line;
        }

        let mut usfm = output.join("\n");
        usfm.push('\n');
        chapter.usfm = usfm;

        chunks[next.min(chunks.len())..]
            .iter()
            .filter(|c| c.first_verse_number != 1)
            .copied()
            .collect()
    }

    /// Remove exactly the boundary lines `apply` inserted.
    pub fn strip(&self, text: &str) -> String {
        text.replace(&format!("\n{}\n", self.marker), "")
    }
}

/// Whether the line has a `\v` marker for `verse`, alone or as the start of a
/// bridge.
fn starts_verse(line: &str, verse: u32) -> bool {
    let number = verse.to_string();
    VERSE_MARKER.captures_iter(line).any(|caps| {
        let token = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        token == number
            || token
                .strip_prefix(number.as_str())
                .is_some_and(|rest| rest.starts_with('-'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(usfm: &str) -> Chapter {
        let mut chapter = Chapter::new(1, 10);
        chapter.found = true;
        chapter.usfm = usfm.to_string();
        chapter
    }

    fn chunks(verses: &[u32]) -> Vec<Chunk> {
        verses.iter().map(|v| Chunk::new(1, *v)).collect()
    }

    #[test]
    fn test_insert_boundaries() {
        let mut ch = chapter("\\c 1\n\\v 1 a\n\\v 2 b\n\\v 3 c\n");
        let missed = Chunker::default().apply(&mut ch, &chunks(&[1, 3]));

        assert!(missed.is_empty());
        assert_eq!(ch.usfm, "\n\\s5\n\\c 1\n\\v 1 a\n\\v 2 b\n\n\\s5\n\\v 3 c\n");
    }

    #[test]
    fn test_boundary_goes_before_paragraph() {
        let mut ch = chapter("\\c 1\n\\p\n\\v 1 a\n\\v 2 b\n\\p\n\\v 3 c\n");
        Chunker::default().apply(&mut ch, &chunks(&[1, 3]));

        assert_eq!(
            ch.usfm,
            "\n\\s5\n\\c 1\n\\p\n\\v 1 a\n\\v 2 b\n\n\\s5\n\\p\n\\v 3 c\n"
        );
    }

    #[test]
    fn test_bridge_start_matches() {
        let mut ch = chapter("\\c 1\n\\v 1 a\n\\v 4-6 b\n");
        let missed = Chunker::default().apply(&mut ch, &chunks(&[1, 4]));
        assert!(missed.is_empty());
        assert!(ch.usfm.contains("\n\\s5\n\\v 4-6 b"));
    }

    #[test]
    fn test_verse_inside_bridge_is_missed() {
        let mut ch = chapter("\\c 1\n\\v 1 a\n\\v 2-4 b\n\\v 5 c\n\\v 6 d\n");
        let missed = Chunker::default().apply(&mut ch, &chunks(&[1, 3, 6]));

        assert_eq!(missed, chunks(&[3, 6]));
        assert_eq!(ch.usfm.matches("\\s5").count(), 1);
    }

    #[test]
    fn test_similar_numbers_do_not_match() {
        assert!(starts_verse("\\v 5 text", 5));
        assert!(starts_verse("\\v 5", 5));
        assert!(starts_verse("x \\v 5-6 text", 5));
        assert!(!starts_verse("\\v 15 text", 5));
        assert!(!starts_verse("\\v 51 text", 5));
        assert!(!starts_verse("\\v 5a text", 5));
    }

    #[test]
    fn test_blank_lines_dropped() {
        let mut ch = chapter("\\c 1\n\n  \n\\v 1 a\n");
        Chunker::default().apply(&mut ch, &[]);
        assert_eq!(ch.usfm, "\n\\s5\n\\c 1\n\\v 1 a\n");
    }

    #[test]
    fn test_empty_chapter_untouched() {
        let mut ch = Chapter::new(2, 5);
        let missed = Chunker::default().apply(&mut ch, &[Chunk::new(2, 1), Chunk::new(2, 3)]);
        assert_eq!(ch.usfm, "");
        assert_eq!(missed, vec![Chunk::new(2, 3)]);
    }

    #[test]
    fn test_strip_restores_text() {
        let original = "\\c 1\n\\p\n\\v 1 a\n\\v 2 b\n\\p\n\\v 3 c\n";
        let chunker = Chunker::default();
        let mut ch = chapter(original);
        chunker.apply(&mut ch, &chunks(&[1, 2, 3]));
        assert_eq!(chunker.strip(&ch.usfm), original);
    }

    #[test]
    fn test_applying_twice_duplicates_markers() {
        let chunker = Chunker::default();
        let mut ch = chapter("\\c 1\n\\v 1 a\n\\v 2 b\n");
        chunker.apply(&mut ch, &chunks(&[1, 2]));
        assert_eq!(ch.usfm.matches("\\s5").count(), 2);

        chunker.apply(&mut ch, &chunks(&[1, 2]));
        assert_eq!(ch.usfm.matches("\\s5").count(), 4);
    }

    #[test]
    fn test_custom_marker() {
        let mut ch = chapter("\\c 1\n\\v 1 a\n\\v 2 b\n");
        Chunker::new("\\ts\\*").apply(&mut ch, &chunks(&[1, 2]));
        assert_eq!(ch.usfm, "\n\\ts\\*\n\\c 1\n\\v 1 a\n\n\\ts\\*\n\\v 2 b\n");
    }
}

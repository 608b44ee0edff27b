//! Text clean-up applied to USFM before it is checked.

use once_cell::sync::Lazy;
use regex::Regex;

/// Non-breaking space directly after a tag such as `\v` or `\id`.
static NBSP_AFTER_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(r"(\\\+?[A-Za-z][A-Za-z0-9]*\*?)", "\u{00A0}"))
        .expect("nbsp-after-tag pattern is valid")
});

/// Non-breaking space directly before a backslash.
static NBSP_BEFORE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(concat!("\u{00A0}", r"\\")).expect("nbsp-before-tag pattern is valid"));

/// Normalize Windows and old Mac line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Replace non-breaking spaces that touch a tag with a plain space.
///
/// Some editors write `\v\u{00A0}1` or `word\u{00A0}\f`; the tag parser needs
/// ordinary whitespace there. Non-breaking spaces inside the text itself are
/// left alone.
pub fn repair_tag_spacing(text: &str) -> String {
    let text = NBSP_AFTER_TAG.replace_all(text, "$1 ");
    NBSP_BEFORE_TAG.replace_all(&text, r" \").into_owned()
}

/// Remove every chunk boundary marker (and the whitespace after it).
pub fn strip_chunk_markers(text: &str, marker: &str) -> String {
    let pattern = format!(r"{}(?:\s+|$)", regex::escape(marker));
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(text, "").into_owned(),
        Err(e) => {
            log::warn!("Cannot build pattern for chunk marker {:?}: {}", marker, e);
            text.to_string()
        }
    }
}

/// Collapse runs of blank (or whitespace-only) lines into a single empty line
/// and drop blank lines at the start of the text.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut prev_was_blank = true;

    for line in text.split('\n') {
        if line.trim().is_empty() {
            if !prev_was_blank {
                lines.push("");
            }
            prev_was_blank = true;
        } else {
            lines.push(line);
            prev_was_blank = false;
        }
    }

    lines.join("\n")
}

/// Full clean-up pass run before validation.
///
/// This function:
/// - Removes chunk boundary markers left over from an earlier chunking
/// - Replaces non-breaking spaces next to tags
/// - Collapses blank lines
pub fn clean_usfm(text: &str, chunk_marker: &str) -> String {
    let text = strip_chunk_markers(text, chunk_marker);
    let text = repair_tag_spacing(&text);
    collapse_blank_lines(&text)
}

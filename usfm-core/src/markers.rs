//! Marker patterns shared by the validators and the chunker.

use once_cell::sync::Lazy;
use regex::Regex;

/// `\c <n>` on the end of its line. The number is captured, and may be empty
/// or non-numeric so that bad chapter numbers can be reported.
pub(crate) static CHAPTER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\c(?:[ \t]+(\S*))?[ \t]*(?:\n|$)").expect("chapter pattern is valid")
});

/// `\v <n>` or `\v <n>-<m>`. The number token runs up to whitespace or the
/// next backslash. A bare `\v` at the end of a line matches with no number.
pub(crate) static VERSE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\v(?:[ \t]+([^\s\\]*)\s*|\n\s*|$)").expect("verse pattern is valid")
});

/// Any backslash tag: `\p`, `\q2`, `\+nd`, `\f*`, `\qt-s`, or a bare `\*`.
pub(crate) static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:\+?[A-Za-z0-9]+(?:-[se])?\*?|\*)").expect("tag pattern is valid")
});

/// One marker and the text that follows it up to the next marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Section<'a> {
    /// The full marker text as matched, e.g. `\c 3\n`
    pub marker: &'a str,
    /// The captured number token, e.g. `3`
    pub token: &'a str,
    pub body: &'a str,
}

/// Text split on a marker pattern whose first group is the marker's number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Split<'a> {
    /// Everything before the first marker
    pub head: &'a str,
    pub sections: Vec<Section<'a>>,
}

/// Split `text` on every match of `marker`, keeping each marker with the
/// text that follows it.
pub(crate) fn split_on<'a>(marker: &Regex, text: &'a str) -> Split<'a> {
    let found: Vec<(usize, usize, &'a str)> = marker
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let token = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            Some((whole.start(), whole.end(), token))
        })
        .collect();

    let head_end = found.first().map(|(start, _, _)| *start).unwrap_or(text.len());

    let sections = found
        .iter()
        .enumerate()
        .map(|(i, &(start, end, token))| {
            let body_end = found.get(i + 1).map(|(next, _, _)| *next).unwrap_or(text.len());
            Section {
                marker: &text[start..end],
                token,
                body: &text[end..body_end],
            }
        })
        .collect();

    Split {
        head: &text[..head_end],
        sections,
    }
}

/// Chapter location label used in tag findings, e.g. `\c 5`.
pub(crate) fn chapter_label(token: &str) -> String {
    format!("\\c {}", token)
}

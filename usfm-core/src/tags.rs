//! USFM tag catalog and tag-level checks.

use crate::findings::Finding;
use crate::markers::{self, TAG, VERSE_MARKER};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Broad role of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Identification,
    Introduction,
    Title,
    Heading,
    Chapter,
    Verse,
    Paragraph,
    Poetry,
    List,
    Table,
    /// Character styles, closed with `*`
    Character,
    /// Footnote and cross reference containers, closed with `*`
    Note,
    /// Parts of a footnote or cross reference
    NoteContent,
    /// Milestones written as `\qt-s ... \*`
    Milestone,
    Special,
}

/// One entry in the tag catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDef {
    pub name: &'static str,
    pub kind: TagKind,
    /// Highest numbered variant (`\q4` has level 4); 0 when unnumbered
    pub max_level: u8,
    /// Whether the tag has a `\name*` closing form
    pub closes: bool,
}

const fn tag(name: &'static str, kind: TagKind, max_level: u8, closes: bool) -> TagDef {
    TagDef {
        name,
        kind,
        max_level,
        closes,
    }
}

use TagKind::*;

/// Markers recognized by the checker (USFM 2 plus the common USFM 3 additions).
const USFM_TAGS: &[TagDef] = &[
    // Identification
    tag("id", Identification, 0, false),
    tag("ide", Identification, 0, false),
    tag("usfm", Identification, 0, false),
    tag("sts", Identification, 0, false),
    tag("rem", Identification, 0, false),
    tag("restore", Identification, 0, false),
    tag("h", Identification, 3, false),
    tag("toc", Identification, 3, false),
    tag("toca", Identification, 3, false),
    // Introductions
    tag("imt", Introduction, 4, false),
    tag("is", Introduction, 4, false),
    tag("ip", Introduction, 0, false),
    tag("ipi", Introduction, 0, false),
    tag("im", Introduction, 0, false),
    tag("imi", Introduction, 0, false),
    tag("ipq", Introduction, 0, false),
    tag("imq", Introduction, 0, false),
    tag("ipr", Introduction, 0, false),
    tag("iq", Introduction, 3, false),
    tag("ib", Introduction, 0, false),
    tag("ili", Introduction, 2, false),
    tag("iot", Introduction, 0, false),
    tag("io", Introduction, 4, false),
    tag("ior", Introduction, 0, true),
    tag("iqt", Introduction, 0, true),
    tag("iex", Introduction, 0, false),
    tag("imte", Introduction, 2, false),
    tag("ie", Introduction, 0, false),
    // Titles and headings
    tag("mt", Title, 4, false),
    tag("mte", Title, 2, false),
    tag("ms", Heading, 3, false),
    tag("mr", Heading, 0, false),
    tag("s", Heading, 4, false),
    tag("sr", Heading, 0, false),
    tag("r", Heading, 0, false),
    tag("rq", Heading, 0, true),
    tag("d", Heading, 0, false),
    tag("sp", Heading, 0, false),
    tag("sd", Heading, 4, false),
    // Chapters and verses
    tag("c", Chapter, 0, false),
    tag("ca", Chapter, 0, true),
    tag("cl", Chapter, 0, false),
    tag("cp", Chapter, 0, false),
    tag("cd", Chapter, 0, false),
    tag("v", Verse, 0, false),
    tag("va", Verse, 0, true),
    tag("vp", Verse, 0, true),
    // Paragraphs
    tag("p", Paragraph, 0, false),
    tag("m", Paragraph, 0, false),
    tag("po", Paragraph, 0, false),
    tag("pr", Paragraph, 0, false),
    tag("cls", Paragraph, 0, false),
    tag("pmo", Paragraph, 0, false),
    tag("pm", Paragraph, 0, false),
    tag("pmc", Paragraph, 0, false),
    tag("pmr", Paragraph, 0, false),
    tag("pi", Paragraph, 3, false),
    tag("mi", Paragraph, 0, false),
    tag("nb", Paragraph, 0, false),
    tag("pc", Paragraph, 0, false),
    tag("ph", Paragraph, 3, false),
    tag("b", Paragraph, 0, false),
    tag("pb", Paragraph, 0, false),
    // Poetry
    tag("q", Poetry, 4, false),
    tag("qr", Poetry, 0, false),
    tag("qc", Poetry, 0, false),
    tag("qs", Poetry, 0, true),
    tag("qa", Poetry, 0, false),
    tag("qac", Poetry, 0, true),
    tag("qm", Poetry, 3, false),
    tag("qd", Poetry, 0, false),
    // Lists
    tag("lh", List, 0, false),
    tag("li", List, 4, false),
    tag("lf", List, 0, false),
    tag("lim", List, 4, false),
    tag("litl", List, 0, true),
    tag("lik", List, 0, true),
    tag("liv", List, 5, true),
    // Tables
    tag("tr", Table, 0, false),
    tag("th", Table, 5, false),
    tag("thr", Table, 5, false),
    tag("tc", Table, 5, false),
    tag("tcr", Table, 5, false),
    // Footnotes and cross references
    tag("f", Note, 0, true),
    tag("fe", Note, 0, true),
    tag("ef", Note, 0, true),
    tag("x", Note, 0, true),
    tag("ex", Note, 0, true),
    tag("fr", NoteContent, 0, true),
    tag("fq", NoteContent, 0, true),
    tag("fqa", NoteContent, 0, true),
    tag("fk", NoteContent, 0, true),
    tag("fl", NoteContent, 0, true),
    tag("fw", NoteContent, 0, true),
    tag("fp", NoteContent, 0, true),
    tag("fv", NoteContent, 0, true),
    tag("ft", NoteContent, 0, true),
    tag("fdc", NoteContent, 0, true),
    tag("fm", NoteContent, 0, true),
    tag("xo", NoteContent, 0, true),
    tag("xk", NoteContent, 0, true),
    tag("xq", NoteContent, 0, true),
    tag("xt", NoteContent, 0, true),
    tag("xta", NoteContent, 0, true),
    tag("xop", NoteContent, 0, true),
    tag("xot", NoteContent, 0, true),
    tag("xnt", NoteContent, 0, true),
    tag("xdc", NoteContent, 0, true),
    // Character styles
    tag("add", Character, 0, true),
    tag("bk", Character, 0, true),
    tag("dc", Character, 0, true),
    tag("k", Character, 0, true),
    tag("nd", Character, 0, true),
    tag("ord", Character, 0, true),
    tag("pn", Character, 0, true),
    tag("png", Character, 0, true),
    tag("addpn", Character, 0, true),
    tag("qt", Character, 0, true),
    tag("sig", Character, 0, true),
    tag("sls", Character, 0, true),
    tag("tl", Character, 0, true),
    tag("wj", Character, 0, true),
    tag("em", Character, 0, true),
    tag("bd", Character, 0, true),
    tag("it", Character, 0, true),
    tag("bdit", Character, 0, true),
    tag("no", Character, 0, true),
    tag("sc", Character, 0, true),
    tag("sup", Character, 0, true),
    tag("ndx", Character, 0, true),
    tag("rb", Character, 0, true),
    tag("pro", Character, 0, true),
    tag("w", Character, 0, true),
    tag("wg", Character, 0, true),
    tag("wh", Character, 0, true),
    tag("wa", Character, 0, true),
    tag("jmp", Character, 0, true),
    tag("cat", Character, 0, true),
    // Milestones and special content
    tag("ts", Milestone, 0, false),
    tag("fig", Special, 0, true),
    tag("periph", Special, 0, false),
];

/// Tokens accepted without a catalog lookup.
const DEFAULT_EXCEPTIONS: &[&str] = &["\\s5", "\\f*", "\\fe*", "\\x*"];

/// Notes are written glued to the word they annotate.
const GLUED_OPENERS: &[&str] = &["f", "fe", "ef", "x", "ex"];

/// Lookup table over the recognized markers.
#[derive(Debug, Clone)]
pub struct TagCatalog {
    tags: HashMap<&'static str, TagDef>,
}

static STANDARD: Lazy<TagCatalog> = Lazy::new(|| TagCatalog::new(USFM_TAGS));

impl TagCatalog {
    pub fn new(defs: &[TagDef]) -> Self {
        Self {
            tags: defs.iter().map(|d| (d.name, *d)).collect(),
        }
    }

    /// The shared catalog of standard USFM markers.
    pub fn standard() -> &'static TagCatalog {
        &STANDARD
    }

    pub fn get(&self, name: &str) -> Option<&TagDef> {
        self.tags.get(name)
    }

    /// Whether a full token such as `\q2`, `\nd*` or `\+wj` is a legal marker.
    pub fn is_valid(&self, token: &str) -> bool {
        let Some(parts) = TagParts::parse(token) else {
            return false;
        };
        if parts.is_milestone_end {
            return true;
        }

        let Some(def) = self.get(parts.name) else {
            return false;
        };

        if let Some(level) = parts.level {
            if level == 0 || level > def.max_level as u32 {
                return false;
            }
        }
        if parts.closing && !def.closes {
            return false;
        }
        if parts.milestone && !matches!(def.kind, Milestone | Character) {
            return false;
        }
        true
    }
}

/// A tag token taken apart: `\+nd*` is name `nd`, nested, closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TagParts<'a> {
    name: &'a str,
    level: Option<u32>,
    closing: bool,
    milestone: bool,
    is_milestone_end: bool,
}

impl<'a> TagParts<'a> {
    fn parse(token: &'a str) -> Option<Self> {
        let body = token.strip_prefix('\\')?;
        if body == "*" {
            return Some(Self {
                name: "",
                level: None,
                closing: true,
                milestone: true,
                is_milestone_end: true,
            });
        }

        let body = body.strip_prefix('+').unwrap_or(body);
        let (body, closing) = match body.strip_suffix('*') {
            Some(b) => (b, true),
            None => (body, false),
        };
        let (body, milestone) = match body.strip_suffix("-s").or_else(|| body.strip_suffix("-e")) {
            Some(b) => (b, true),
            None => (body, false),
        };

        let split = body
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(body.len());
        let (name, digits) = body.split_at(split);
        if name.is_empty() {
            return None;
        }

        let level = if digits.is_empty() {
            None
        } else {
            Some(digits.parse().ok()?)
        };

        Some(Self {
            name,
            level,
            closing,
            milestone,
            is_milestone_end: false,
        })
    }
}

/// Checks the markers of a block of USFM against a catalog.
#[derive(Debug, Clone)]
pub struct TagValidator<'c> {
    catalog: &'c TagCatalog,
    exceptions: Vec<String>,
}

impl<'c> TagValidator<'c> {
    pub fn new(catalog: &'c TagCatalog) -> Self {
        Self {
            catalog,
            exceptions: DEFAULT_EXCEPTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Accept an extra token without checking it, e.g. a custom chunk marker.
    pub fn with_exception(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if !self.exceptions.contains(&token) {
            self.exceptions.push(token);
        }
        self
    }

    fn is_exception(&self, token: &str) -> bool {
        self.exceptions.iter().any(|e| e == token)
    }

    /// Check one block of text. `location` names the block in the findings,
    /// e.g. `\c 5`.
    pub fn scan(&self, location: &str, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for m in TAG.find_iter(text) {
            let token = m.as_str();

            if !self.is_exception(token) && !self.catalog.is_valid(token) {
                findings.push(Finding::InvalidTag {
                    location: location.to_string(),
                    tag: token.to_string(),
                });
            }

            if let Some(word) = glued_word(text, m.start()) {
                if !may_be_glued(token) {
                    findings.push(Finding::MalformedTag {
                        location: location.to_string(),
                        text: format!("{}{}", word, token),
                    });
                }
            }
        }

        findings.extend(self.empty_verses(location, text));
        findings
    }

    /// Check a whole book: the text before the first chapter, then each
    /// chapter block.
    pub fn scan_book(&self, text: &str) -> Vec<Finding> {
        let split = markers::split_on(&markers::CHAPTER_MARKER, text);

        let mut findings = self.scan("book header", split.head);
        for section in &split.sections {
            let location = markers::chapter_label(section.token);
            findings.extend(self.scan(&location, section.body));
        }
        findings
    }

    /// Verse markers with nothing but other markers after them.
    fn empty_verses(&self, location: &str, text: &str) -> Vec<Finding> {
        markers::split_on(&VERSE_MARKER, text)
            .sections
            .iter()
            .filter(|s| TAG.replace_all(s.body, "").trim().is_empty())
            .map(|s| Finding::VerseWithoutText {
                location: location.to_string(),
                tag: s.marker.trim_end().to_string(),
            })
            .collect()
    }
}

/// The non-space text a tag is glued onto, if any.
fn glued_word(text: &str, tag_start: usize) -> Option<&str> {
    let before = &text[..tag_start];
    let prev = before.chars().last()?;
    if prev.is_whitespace() || prev == '*' {
        return None;
    }
    let word_start = before
        .rfind(|c: char| c.is_whitespace())
        .map(|i| i + before[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    let word = &before[word_start..];

    // A tag written straight after another tag, e.g. `\p\v 1`.
    if let Some(i) = word.rfind('\\') {
        if TAG.find(&word[i..]).is_some_and(|m| m.start() == 0 && m.end() == word.len() - i) {
            return None;
        }
    }
    Some(word)
}

/// Closing tags and note openers are written directly after a word.
fn may_be_glued(token: &str) -> bool {
    if token.ends_with('*') {
        return true;
    }
    let name = token.trim_start_matches('\\').trim_start_matches('+');
    GLUED_OPENERS.contains(&name)
}

//! Manuscript metadata (`meta.json`) and versification selection.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Versification used when nothing else is known.
pub const DEFAULT_VERSIFICATION: &str = "ufw";

fn default_versification() -> String {
    DEFAULT_VERSIFICATION.to_string()
}

/// Descriptive data that travels with a translated Bible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BibleMetadata {
    pub lang: String,
    pub name: String,
    pub slug: String,
    pub checking_entity: String,
    pub checking_level: String,
    pub comments: String,
    pub contributors: String,
    pub publish_date: String,
    pub source_text: String,
    pub source_text_version: String,
    pub version: String,
    #[serde(default = "default_versification")]
    pub versification: String,
}

impl Default for BibleMetadata {
    fn default() -> Self {
        Self {
            lang: String::new(),
            name: String::new(),
            slug: String::new(),
            checking_entity: String::new(),
            checking_level: "1".to_string(),
            comments: String::new(),
            contributors: String::new(),
            publish_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            source_text: String::new(),
            source_text_version: String::new(),
            version: String::new(),
            versification: default_versification(),
        }
    }
}

impl BibleMetadata {
    /// Read a `meta.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let meta = serde_json::from_str(&content)?;
        Ok(meta)
    }
}

/// Versification scheme a language's translations are numbered with.
pub fn versification_for_language(lang: &str) -> &'static str {
    match lang {
        "ru" => "rsc",
        "hi" | "sr-Latn" | "hu" | "ta" => "ufw-odx",
        "bn" => "ufw-bn",
        "ar" => "avd",
        "kn" => "ufw-rev",
        _ => DEFAULT_VERSIFICATION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UsfmError;
    use tempfile::TempDir;

    const META: &str = r#"{
        "lang": "ru",
        "name": "Russian Bible",
        "slug": "rsb",
        "checking_entity": "Wycliffe",
        "checking_level": "3",
        "comments": "",
        "contributors": "",
        "publish_date": "2016-05-01",
        "source_text": "en",
        "source_text_version": "4",
        "version": "1"
    }"#;

    #[test]
    fn test_load_defaults_versification() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.json");
        fs::write(&path, META).unwrap();

        let meta = BibleMetadata::load(&path).unwrap();
        assert_eq!(meta.lang, "ru");
        assert_eq!(meta.checking_level, "3");
        assert_eq!(meta.versification, "ufw");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.json");
        fs::write(&path, META.replace("\"version\": \"1\"", "\"version\": \"1\", \"extra\": 2")).unwrap();

        assert!(matches!(BibleMetadata::load(&path), Err(UsfmError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            BibleMetadata::load(&dir.path().join("meta.json")),
            Err(UsfmError::Io(_))
        ));
    }

    #[test]
    fn test_default_metadata() {
        let meta = BibleMetadata::default();
        assert_eq!(meta.checking_level, "1");
        assert_eq!(meta.versification, "ufw");
        assert_eq!(meta.publish_date.len(), 10);
    }

    #[test]
    fn test_versification_for_language() {
        assert_eq!(versification_for_language("ru"), "rsc");
        assert_eq!(versification_for_language("sr-Latn"), "ufw-odx");
        assert_eq!(versification_for_language("bn"), "ufw-bn");
        assert_eq!(versification_for_language("ar"), "avd");
        assert_eq!(versification_for_language("kn"), "ufw-rev");
        assert_eq!(versification_for_language("en"), "ufw");
    }
}

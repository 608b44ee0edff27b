//! usfm-tools configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use usfm_core::DEFAULT_CHUNK_MARKER;
use usfm_core::metadata::DEFAULT_VERSIFICATION;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Directory holding versification schemes and chunk lists
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Scheme used when none is given on the command line
    #[serde(default = "default_versification")]
    pub versification: String,

    /// Chunk boundary marker written into re-chunked text
    #[serde(default = "default_chunk_marker")]
    pub chunk_marker: String,
}

fn default_versification() -> String {
    DEFAULT_VERSIFICATION.to_string()
}

fn default_chunk_marker() -> String {
    DEFAULT_CHUNK_MARKER.to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            versification: default_versification(),
            chunk_marker: default_chunk_marker(),
        }
    }
}

impl ToolConfig {
    /// Get the config file path: <config dir>/cli-programs/usfm-tools.toml
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cli-programs")
            .join("usfm-tools.toml")
    }

    /// Load config from the default location, returning defaults if the file
    /// doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ToolConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}

//! Finding manuscript files on disk.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All USFM files directly inside `dir`, sorted by name.
pub fn find_usfm_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).max_depth(1).follow_links(true) {
        let entry = entry.context("Failed to read directory entry")?;
        if entry.file_type().is_file() && is_usfm(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// `.usfm`, `.sfm` or `.SFM`
fn is_usfm(path: &Path) -> bool {
    matches!(
        path.extension().and_then(OsStr::to_str),
        Some("usfm" | "sfm" | "SFM")
    )
}

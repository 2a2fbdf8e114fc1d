//! `icons` fragment of a browser extension manifest
//!
//! Extension manifests (`manifest.json`) declare their icons as an object that
//! maps the pixel size, written as a string, to a path relative to the
//! extension root:
//!
//! ```json
//! { "icons": { "16": "icons/icon16.png", "128": "icons/icon128.png" } }
//! ```
//!
//! This module builds that fragment for the generated icons so it can be pasted
//! into (or merged with) the real manifest.

use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub const MANIFEST_FILE_NAME: &str = "icons.json";

/// Root of the written `icons.json` file
#[derive(Serialize, Debug, Clone, Default)]
pub struct ManifestIcons {
    /// Size in pixels to relative icon path, ordered by size
    pub icons: BTreeMap<u32, String>,
}

impl ManifestIcons {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the icon of the given size. `prefix` is the directory the
    /// extension sees the icons in (e.g. `icons`); an empty prefix means the
    /// icon sits at the extension root.
    pub fn add_icon(&mut self, size: u32, prefix: &str, file_name: &str) {
        let path = if prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{prefix}/{file_name}")
        };
        self.icons.insert(size, path);
    }
}

/// Directory component used as the path prefix for icons written to `out_dir`.
pub fn icon_prefix(out_dir: &Path) -> String {
    out_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Writes `icons.json` into `dir` and returns its path.
pub fn write_manifest(dir: &Path, manifest: &ManifestIcons) -> Result<PathBuf> {
    let json =
        serde_json::to_string_pretty(manifest).context("Failed to serialize icons.json")?;
    let path = dir.join(MANIFEST_FILE_NAME);
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

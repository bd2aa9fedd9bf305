use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::TrainerError;
use crate::words::WordMap;

const OVERLAY_FILE: &str = "number_words.json";

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("majordrill")
}

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(data_dir())
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// The saved word edits. `Ok(None)` when nothing has been saved yet.
    pub fn load_overlay(&self) -> std::result::Result<Option<WordMap>, TrainerError> {
        let path = self.file_path(OVERLAY_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| TrainerError::MalformedPersistedOverlay(e.to_string()))?;
        WordMap::from_json(&content)
            .map(Some)
            .map_err(|e| TrainerError::MalformedPersistedOverlay(e.to_string()))
    }

    pub fn save_overlay(&self, words: &WordMap) -> Result<()> {
        write_atomic(&self.file_path(OVERLAY_FILE), &words.to_export_json()?)
    }

    /// Merge saved edits over `base`. A malformed overlay is logged and
    /// skipped so the base dataset still loads.
    pub fn merged_words(&self, mut base: WordMap) -> WordMap {
        match self.load_overlay() {
            Ok(Some(overlay)) => {
                tracing::debug!(entries = overlay.len(), "merging saved word edits");
                base.merge_overlay(overlay);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(%err, "discarding saved word edits"),
        }
        base
    }
}

/// Write through a sibling `.tmp` file and rename it into place.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Load a replacement dataset in the bundled `numbers.json` format.
pub fn load_dataset(path: &Path) -> Result<WordMap> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    WordMap::from_json(&content).with_context(|| format!("parsing {}", path.display()))
}

pub fn export_words(words: &WordMap, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_atomic(path, &words.to_export_json()?)
}

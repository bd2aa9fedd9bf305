use std::collections::BTreeMap;

use rust_embed::Embed;
use serde::{Deserialize, Serialize};

use crate::engine::range::{self, Key};

#[derive(Embed)]
#[folder = "assets/words/"]
struct WordAssets;

const BUNDLED_DATASET: &str = "numbers.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Read-only lookup of the word for a key. Unknown keys read as "".
pub trait WordLookup {
    fn word(&self, key: &Key) -> &str;
}

/// Key -> word associations, kept sorted by key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordMap {
    entries: BTreeMap<Key, WordEntry>,
}

impl WordMap {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The dataset compiled into the binary.
    pub fn bundled() -> Self {
        WordAssets::get(BUNDLED_DATASET)
            .and_then(|file| serde_json::from_slice(file.data.as_ref()).ok())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&WordEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &WordEntry)> {
        self.entries.iter()
    }

    /// Lay `overlay` over this map; overlay entries replace same-key entries.
    pub fn merge_overlay(&mut self, overlay: WordMap) {
        self.entries.extend(overlay.entries);
    }

    pub fn set_word(&mut self, key: &Key, word: &str) {
        self.entries.entry(key.clone()).or_default().word = word.to_string();
    }

    /// Replace the suggestions from comma-separated text. Blank items are dropped.
    pub fn set_suggestions(&mut self, key: &Key, text: &str) {
        self.entries.entry(key.clone()).or_default().suggestions = parse_suggestions(text);
    }

    /// Make sure every key has an entry, inserting empty ones where missing.
    pub fn ensure_entries<'a>(&mut self, keys: impl IntoIterator<Item = &'a Key>) {
        for key in keys {
            self.entries.entry(key.clone()).or_default();
        }
    }

    pub fn to_export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl WordLookup for WordMap {
    fn word(&self, key: &Key) -> &str {
        self.entries.get(key).map(|e| e.word.as_str()).unwrap_or("")
    }
}

pub fn parse_suggestions(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A labelled block of keys in the word editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditGroup {
    pub label: String,
    pub keys: Vec<Key>,
}

/// "Numbers 0-9", "Numbers 00-09", "Numbers 10-19" .. "Numbers 90-99".
pub fn edit_groups() -> Vec<EditGroup> {
    range::catalog(false)
        .into_iter()
        .map(|r| EditGroup {
            label: format!("Numbers {r}"),
            keys: r.expand().keys().to_vec(),
        })
        .collect()
}

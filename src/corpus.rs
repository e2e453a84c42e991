use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::assets::bundled_text;

pub type WordId = u32;

const BUNDLED_WORDS: &str = "words.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub id: WordId,
    #[serde(rename = "word")]
    pub headword: String,
    pub definition: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub part_of_speech: String,
}

/// Read-only word reference data, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct WordCorpus {
    words: BTreeMap<WordId, WordEntry>,
}

impl WordCorpus {
    pub fn new(entries: Vec<WordEntry>) -> Result<Self> {
        let mut words = BTreeMap::new();
        for entry in entries {
            let id = entry.id;
            if words.insert(id, entry).is_some() {
                bail!("duplicate word id {id} in corpus");
            }
        }
        Ok(Self { words })
    }

    /// The word list shipped with the binary.
    pub fn bundled() -> Result<Self> {
        let json = bundled_text(BUNDLED_WORDS).context("bundled word list is missing")?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<WordEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading word list {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn get(&self, id: WordId) -> Option<&WordEntry> {
        self.words.get(&id)
    }

    pub fn contains(&self, id: WordId) -> bool {
        self.words.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = WordId> + '_ {
        self.words.keys().copied()
    }
}

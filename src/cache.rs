//! Persisted lemma → record cache.
//!
//! One JSON object per word class, rewritten in full on every insert.
//! There is no eviction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::lexicon::WordClass;
use crate::record::ConjugationRecord;

#[derive(Debug)]
pub struct ConjugationCache {
    path: PathBuf,
    entries: HashMap<String, ConjugationRecord>,
}

impl ConjugationCache {
    /// Cache file name for a word class, e.g. `verb_cache.json`
    pub fn file_name(class: WordClass) -> String {
        format!("{}_cache.json", class.name())
    }

    /// Open the cache for a word class inside `dir`.
    ///
    /// A missing file is an empty cache. An unreadable one is logged and
    /// replaced on the next write.
    pub fn open(dir: &Path, class: WordClass) -> Self {
        let path = dir.join(Self::file_name(class));
        let entries = match Self::read(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache {}: {:#}", path.display(), e);
                HashMap::new()
            }
        };
        tracing::debug!("Opened {} with {} entries", path.display(), entries.len());
        Self { path, entries }
    }

    fn read(path: &Path) -> Result<HashMap<String, ConjugationRecord>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored record, returned exactly as it was written
    pub fn get(&self, lemma: &str) -> Option<&ConjugationRecord> {
        self.entries.get(lemma)
    }

    /// Store a record and persist the whole cache. Last write wins.
    pub fn insert(&mut self, lemma: &str, record: ConjugationRecord) -> Result<()> {
        self.entries.insert(lemma.to_string(), record);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

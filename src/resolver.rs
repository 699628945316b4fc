use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use thiserror::Error;

use crate::record::{ConjugationRecord, RawRecord};

/// Why a lookup produced no record
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no lemma given")]
    EmptyInput,

    /// Shown to the user as a "no data" message
    #[error("no conjugation data for 「{0}」")]
    NotFound(String),

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

/// Preloaded lemma → record mapping
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: HashMap<String, RawRecord>,
}

impl RecordStore {
    pub fn new(records: HashMap<String, RawRecord>) -> Self {
        Self { records }
    }

    /// Parse a lemma → record mapping. Entries that do not parse as a record
    /// are logged and skipped; the rest of the file still loads.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut records = HashMap::with_capacity(entries.len());
        for (lemma, value) in entries {
            match serde_json::from_value::<RawRecord>(value) {
                Ok(record) => {
                    records.insert(lemma, record);
                }
                Err(e) => tracing::warn!("Skipping conjugation record for {}: {}", lemma, e),
            }
        }
        Ok(Self::new(records))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load the mapping, logging a failure and falling back to an empty one
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => {
                tracing::info!("Loaded {} conjugation records", store.len());
                store
            }
            Err(e) => {
                tracing::error!("Error loading conjugation records: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, lemma: &str) -> bool {
        self.records.contains_key(lemma)
    }

    /// Look up a lemma by exact text.
    ///
    /// Examples given per tense are sampled afresh on every call.
    pub fn resolve(&self, lemma: &str) -> Result<ConjugationRecord, LookupError> {
        self.resolve_with(lemma, &mut rand::rng())
    }

    pub fn resolve_with<R: Rng + ?Sized>(
        &self,
        lemma: &str,
        rng: &mut R,
    ) -> Result<ConjugationRecord, LookupError> {
        let record = self
            .records
            .get(lemma)
            .ok_or_else(|| LookupError::NotFound(lemma.to_string()))?;
        Ok(record.clone().resolve(rng))
    }
}

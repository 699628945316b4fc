//! Lemma lists shown in the sidebar.
//!
//! The list files wrap the entries in a key named after the word class:
//! `{"verbs": [{"id": 1, "verb": "食べる", "category": "Ichidan"}]}` or
//! `{"adjectives": [{"id": 1, "adjective": "高い", "category": "i-adjective"}]}`.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Which conjugator a lemma belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordClass {
    Verb,
    Adjective,
}

impl WordClass {
    /// Categories offered by the filter, besides "all"
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            WordClass::Verb => &["Godan", "Ichidan", "Irregular"],
            WordClass::Adjective => &["i-adjective", "na-adjective"],
        }
    }

    /// Top-level key of the lemma list file
    fn list_key(self) -> &'static str {
        match self {
            WordClass::Verb => "verbs",
            WordClass::Adjective => "adjectives",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WordClass::Verb => "verb",
            WordClass::Adjective => "adjective",
        }
    }
}

impl fmt::Display for WordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WordClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "verb" | "verbs" => Ok(WordClass::Verb),
            "adjective" | "adjectives" => Ok(WordClass::Adjective),
            _ => Err(anyhow!("Unknown word class: {}", s)),
        }
    }
}

/// One lemma in a list file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LemmaEntry {
    pub id: u32,
    /// Surface text, stored under `verb` or `adjective`
    #[serde(alias = "verb", alias = "adjective")]
    pub text: String,
    pub category: String,
}

/// Category filter value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Parse a filter value, accepting "all" or a category of the word class
    pub fn parse(class: WordClass, value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        class
            .categories()
            .iter()
            .find(|c| c.eq_ignore_ascii_case(value))
            .map(|c| CategoryFilter::Only(c.to_string()))
            .ok_or_else(|| {
                anyhow!(
                    "Unknown {} category \"{}\" (expected all, {})",
                    class,
                    value,
                    class.categories().join(", ")
                )
            })
    }

    pub fn matches(&self, entry: &LemmaEntry) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => entry.category == *category,
        }
    }
}

/// Lemma list for one word class
#[derive(Debug, Clone)]
pub struct Lexicon {
    class: WordClass,
    entries: Vec<LemmaEntry>,
}

impl Lexicon {
    pub fn new(class: WordClass, entries: Vec<LemmaEntry>) -> Self {
        Self { class, entries }
    }

    pub fn empty(class: WordClass) -> Self {
        Self::new(class, Vec::new())
    }

    /// Parse a list file's contents
    pub fn from_json(class: WordClass, json: &str) -> Result<Self> {
        let mut file: HashMap<String, Vec<LemmaEntry>> = serde_json::from_str(json)?;
        let entries = file
            .remove(class.list_key())
            .ok_or_else(|| anyhow!("Missing \"{}\" list", class.list_key()))?;
        Ok(Self::new(class, entries))
    }

    pub fn load(class: WordClass, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(class, &content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load the list, logging a failure and falling back to an empty list
    pub fn load_or_empty(class: WordClass, path: &Path) -> Self {
        match Self::load(class, path) {
            Ok(lexicon) => {
                tracing::info!("Loaded {} {} lemmas", lexicon.len(), class);
                lexicon
            }
            Err(e) => {
                tracing::error!("Error loading {} list: {:#}", class, e);
                Self::empty(class)
            }
        }
    }

    pub fn class(&self) -> WordClass {
        self.class
    }

    pub fn entries(&self) -> &[LemmaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&LemmaEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn filtered<'a>(
        &'a self,
        filter: &'a CategoryFilter,
    ) -> impl Iterator<Item = &'a LemmaEntry> + 'a {
        self.entries.iter().filter(move |e| filter.matches(e))
    }
}

//! Conjugation records as stored in the data files.
//!
//! Field names follow the existing JSON files, so both the verb shape
//! (`group`) and the adjective shape (`type`) deserialize into the same type.

use std::fmt;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Title suffix stripped for display
pub const TITLE_SUFFIX: &str = " Conjugation Table";

/// A conjugation table for one lemma.
///
/// `E` is the shape of `examples`: [`Examples`] as read from data files,
/// or a flat `Vec<Example>` once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConjugationRecord<E = Vec<Example>> {
    #[serde(default)]
    pub title: String,
    /// Verb group, e.g. "Group 1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Adjective type, e.g. "i-adjective"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
    #[serde(default)]
    pub conjugations: Vec<Conjugation>,
    #[serde(default)]
    pub examples: E,
}

/// Record as found in a data file, examples not yet resolved
pub type RawRecord = ConjugationRecord<Examples>;

impl<E> ConjugationRecord<E> {
    /// Title without the " Conjugation Table" suffix
    pub fn heading(&self) -> &str {
        self.title
            .strip_suffix(TITLE_SUFFIX)
            .unwrap_or(&self.title)
    }

    /// Group for verbs, type for adjectives
    pub fn badge(&self) -> Option<&str> {
        self.group.as_deref().or(self.kind.as_deref())
    }

    fn with_examples<F>(self, examples: F) -> ConjugationRecord<F> {
        ConjugationRecord {
            title: self.title,
            group: self.group,
            kind: self.kind,
            meaning: self.meaning,
            conjugations: self.conjugations,
            examples,
        }
    }
}

impl RawRecord {
    /// Flatten examples to a list, picking one variant per tense at random
    /// when they are given as a mapping.
    pub fn resolve<R: Rng + ?Sized>(mut self, rng: &mut R) -> ConjugationRecord {
        let examples = std::mem::take(&mut self.examples).into_list(rng);
        self.with_examples(examples)
    }
}

/// One row of the conjugation table. Missing text fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conjugation {
    pub conjugation: String,
    pub polite: String,
    pub plain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub te: Option<String>,
}

/// Example sentence for one tense
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Example {
    pub tense: String,
    pub english: String,
    pub japanese_polite: String,
    pub japanese_plain: String,
}

/// Example sentence without its tense, as listed under a tense key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExampleVariant {
    pub english: String,
    pub japanese_polite: String,
    pub japanese_plain: String,
}

impl ExampleVariant {
    pub fn with_tense(self, tense: impl Into<String>) -> Example {
        Example {
            tense: tense.into(),
            english: self.english,
            japanese_polite: self.japanese_polite,
            japanese_plain: self.japanese_plain,
        }
    }
}

/// The two shapes `examples` takes in the data files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Examples {
    List(Vec<Example>),
    ByTense(TenseMap),
}

impl Default for Examples {
    fn default() -> Self {
        Examples::List(Vec::new())
    }
}

impl Examples {
    /// Normalize to a list. Tenses with no variants are dropped.
    pub fn into_list<R: Rng + ?Sized>(self, rng: &mut R) -> Vec<Example> {
        match self {
            Examples::List(list) => list,
            Examples::ByTense(map) => map
                .0
                .into_iter()
                .filter_map(|(tense, variants)| match variants.choose(&mut *rng) {
                    Some(variant) => Some(variant.clone().with_tense(tense)),
                    None => {
                        tracing::debug!("No example variants for tense {:?}", tense);
                        None
                    }
                })
                .collect(),
        }
    }
}

/// Tense → variants mapping that keeps the order keys appear in the file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenseMap(pub Vec<(String, Vec<ExampleVariant>)>);

impl Serialize for TenseMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (tense, variants) in &self.0 {
            map.serialize_entry(tense, variants)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TenseMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TenseMapVisitor;

        impl<'de> Visitor<'de> for TenseMapVisitor {
            type Value = TenseMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from tense to example variants")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TenseMap, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((tense, variants)) = access.next_entry()? {
                    entries.push((tense, variants));
                }
                Ok(TenseMap(entries))
            }
        }

        deserializer.deserialize_map(TenseMapVisitor)
    }
}

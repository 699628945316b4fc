//! katsuyou - Japanese conjugation study tool
//!
//! Conjugation tables and example sentences for verbs and adjectives, with
//! furigana from morphological analysis and hidden cells for self-testing.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod conjugator;
pub mod furigana;
pub mod kana;
pub mod lexicon;
pub mod llm;
pub mod record;
pub mod resolver;
pub mod rules;
pub mod view;

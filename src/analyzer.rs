use std::sync::{Arc, OnceLock};

use anyhow::Result;
use lindera::dictionary::load_dictionary;
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;
use lindera::tokenizer::Tokenizer;
use tokio::task::JoinHandle;

/// Reading the dictionary reports for words it does not know.
pub const UNKNOWN_READING: &str = "*";

/// Morpheme produced by the tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Surface form (表層形)
    pub surface_form: String,
    /// Reading in katakana (読み), `*` or empty when unknown
    pub reading: String,
}

impl Token {
    pub fn new(surface_form: impl Into<String>, reading: impl Into<String>) -> Self {
        Self {
            surface_form: surface_form.into(),
            reading: reading.into(),
        }
    }

    /// Reading usable for furigana, if the dictionary supplied one
    pub fn known_reading(&self) -> Option<&str> {
        match self.reading.as_str() {
            "" | UNKNOWN_READING => None,
            reading => Some(reading),
        }
    }
}

/// Morphological analysis capability
pub trait Tokenize: Send + Sync {
    /// Split text into morphemes in input order
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Morphological analyzer using Lindera
pub struct MorphologicalAnalyzer {
    tokenizer: Tokenizer,
}

impl MorphologicalAnalyzer {
    pub fn new() -> Result<Self> {
        let dictionary = load_dictionary("embedded://ipadic")?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        let tokenizer = Tokenizer::new(segmenter);
        Ok(Self { tokenizer })
    }
}

impl Tokenize for MorphologicalAnalyzer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = match self.tokenizer.tokenize(text) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Tokenization failed: {}", e);
                return Vec::new();
            }
        };

        let mut result = Vec::with_capacity(tokens.len());
        for token in tokens.iter_mut() {
            let surface_form = token.surface.as_ref().to_string();

            // IPADIC details: pos, pos1, pos2, pos3, conj type, conj form, base, reading, pron
            let details = token.details();

            result.push(Token {
                reading: details.get(7).map(|s| s.to_string()).unwrap_or_default(),
                surface_form,
            });
        }

        result
    }
}

/// Shared handle to a tokenizer that becomes ready at some point after startup.
///
/// Readiness is checked without blocking; callers that race ahead of the
/// dictionary load see `None` and must degrade.
#[derive(Clone, Default)]
pub struct TokenizerHandle {
    slot: Arc<OnceLock<Arc<dyn Tokenize>>>,
}

impl TokenizerHandle {
    /// A handle that is not ready yet
    pub fn pending() -> Self {
        Self::default()
    }

    /// A handle that is ready immediately
    pub fn ready(tokenizer: impl Tokenize + 'static) -> Self {
        let handle = Self::default();
        handle.install(tokenizer);
        handle
    }

    /// Install the tokenizer. Returns false if one was already installed.
    pub fn install(&self, tokenizer: impl Tokenize + 'static) -> bool {
        self.slot.set(Arc::new(tokenizer)).is_ok()
    }

    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn get(&self) -> Option<&dyn Tokenize> {
        self.slot.get().map(|t| &**t)
    }

    /// Load the embedded IPADIC dictionary on the blocking pool and install
    /// it when done. A failed load is logged and leaves the handle pending.
    pub fn spawn_ipadic(&self) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::task::spawn_blocking(move || match MorphologicalAnalyzer::new() {
            Ok(analyzer) => {
                if handle.install(analyzer) {
                    tracing::info!("Tokenizer ready");
                }
            }
            Err(e) => {
                tracing::error!("Failed to load tokenizer dictionary: {:#}", e);
            }
        })
    }
}

impl std::fmt::Debug for TokenizerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}

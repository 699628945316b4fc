//! Configuration management for katsuyou
//!
//! Handles loading and parsing of the `katsuyou.toml` configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lexicon::WordClass;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Reference data files
    #[serde(default)]
    pub data: DataConfig,

    /// Persisted lookup cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Paths of the lemma lists and conjugation record files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_verbs")]
    pub verbs: PathBuf,

    #[serde(default = "default_adjectives")]
    pub adjectives: PathBuf,

    #[serde(default = "default_verb_records")]
    pub verb_records: PathBuf,

    #[serde(default = "default_adjective_records")]
    pub adjective_records: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            verbs: default_verbs(),
            adjectives: default_adjectives(),
            verb_records: default_verb_records(),
            adjective_records: default_adjective_records(),
        }
    }
}

impl DataConfig {
    /// Lemma list file for a word class
    pub fn lemmas(&self, class: WordClass) -> &Path {
        match class {
            WordClass::Verb => &self.verbs,
            WordClass::Adjective => &self.adjectives,
        }
    }

    /// Conjugation record file for a word class
    pub fn records(&self, class: WordClass) -> &Path {
        match class {
            WordClass::Verb => &self.verb_records,
            WordClass::Adjective => &self.adjective_records,
        }
    }
}

/// Persisted cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory for cache files (defaults to the user data directory)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "claude", "openai", or "none"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key (can also be set via environment variable)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name (e.g., "gpt-3.5-turbo", "claude-3-5-sonnet-20241022")
    #[serde(default)]
    pub model: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            model: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_verbs() -> PathBuf {
    PathBuf::from("data/verbs.json")
}

fn default_adjectives() -> PathBuf {
    PathBuf::from("data/adjectives.json")
}

fn default_verb_records() -> PathBuf {
    PathBuf::from("data/verb_conjugations.json")
}

fn default_adjective_records() -> PathBuf {
    PathBuf::from("data/adjective_conjugations.json")
}

fn default_provider() -> String {
    "none".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "katsuyou")
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config file path
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("katsuyou.toml"))
    }

    /// Load configuration from the working directory or the user config directory
    pub fn load_from_default() -> Self {
        let workspace_path = PathBuf::from("katsuyou.toml");
        if workspace_path.exists() {
            match Self::load(&workspace_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("{:#}", e),
            }
        }

        if let Some(default_path) = Self::default_path() {
            match Self::load(&default_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("{:#}", e),
            }
        }

        Config::default()
    }

    /// Directory for cache files, if caching is enabled
    pub fn cache_dir(&self) -> Option<PathBuf> {
        if !self.cache.enabled {
            return None;
        }
        self.cache
            .dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
    }

    /// Get the effective API key (from config or environment)
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.llm.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        match self.llm.provider.as_str() {
            "claude" => std::env::var("ANTHROPIC_API_KEY").ok(),
            "openai" => std::env::var("OPENAI_API_KEY").ok(),
            _ => None,
        }
    }

    /// Get the effective model name
    pub fn get_model(&self) -> String {
        self.llm
            .model
            .clone()
            .unwrap_or_else(|| match self.llm.provider.as_str() {
                "claude" => "claude-3-5-sonnet-20241022".to_string(),
                "openai" => "gpt-3.5-turbo".to_string(),
                _ => String::new(),
            })
    }

    /// Check if LLM integration is enabled
    pub fn is_llm_enabled(&self) -> bool {
        self.llm.provider != "none" && self.get_api_key().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "none");
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.llm.max_tokens, 1024);
        assert!((config.llm.temperature - 0.3).abs() < f32::EPSILON);
        assert!(config.cache.enabled);
        assert_eq!(config.data.verbs, PathBuf::from("data/verbs.json"));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[data]
verbs = "/srv/verbs.json"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();

        assert_eq!(config.data.verbs, PathBuf::from("/srv/verbs.json"));
        assert_eq!(
            config.data.adjectives,
            PathBuf::from("data/adjectives.json")
        );
        assert_eq!(config.llm.provider, "none");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[data]
verbs = "v.json"
adjectives = "a.json"
verb_records = "vr.json"
adjective_records = "ar.json"

[cache]
enabled = false
dir = "/tmp/katsuyou"

[llm]
provider = "openai"
api_key = "sk-test-key"
model = "gpt-4o-mini"
max_tokens = 2048
temperature = 0.7
"#;
        let config: Config = toml::from_str(toml_str).unwrap();

        assert_eq!(config.data.lemmas(WordClass::Verb), Path::new("v.json"));
        assert_eq!(config.data.lemmas(WordClass::Adjective), Path::new("a.json"));
        assert_eq!(config.data.records(WordClass::Verb), Path::new("vr.json"));
        assert_eq!(config.data.records(WordClass::Adjective), Path::new("ar.json"));

        assert!(!config.cache.enabled);
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/katsuyou")));
        assert_eq!(config.cache_dir(), None);

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.api_key, Some("sk-test-key".to_string()));
        assert_eq!(config.llm.model, Some("gpt-4o-mini".to_string()));
        assert_eq!(config.llm.max_tokens, 2048);
    }

    #[test]
    fn test_cache_dir_override() {
        let mut config = Config::default();
        config.cache.dir = Some(PathBuf::from("/var/cache/katsuyou"));
        assert_eq!(config.cache_dir(), Some(PathBuf::from("/var/cache/katsuyou")));
    }

    #[test]
    fn test_get_model_defaults() {
        let mut config = Config::default();

        config.llm.provider = "claude".to_string();
        assert_eq!(config.get_model(), "claude-3-5-sonnet-20241022");

        config.llm.provider = "openai".to_string();
        assert_eq!(config.get_model(), "gpt-3.5-turbo");

        config.llm.model = Some("custom-model".to_string());
        assert_eq!(config.get_model(), "custom-model");
    }

    #[test]
    fn test_is_llm_enabled() {
        let mut config = Config::default();

        // Default: disabled (provider = "none")
        assert!(!config.is_llm_enabled());

        config.llm.provider = "openai".to_string();
        config.llm.api_key = Some("test-key".to_string());
        assert!(config.is_llm_enabled());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let path = PathBuf::from("/nonexistent/path/katsuyou.toml");
        let config = Config::load(&path).unwrap();

        assert_eq!(config.llm.provider, "none");
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("katsuyou.toml");
        std::fs::write(&path, "[cache\nenabled = ").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_serialize_config() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();

        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[cache]"));
        assert!(toml_str.contains("[llm]"));
    }
}

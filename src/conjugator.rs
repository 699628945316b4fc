use crate::analyzer::TokenizerHandle;
use crate::cache::ConjugationCache;
use crate::config::Config;
use crate::furigana::FuriganaAnnotator;
use crate::lexicon::{CategoryFilter, LemmaEntry, Lexicon, WordClass};
use crate::llm::{ConjugationGenerator, GenerateRequest};
use crate::record::ConjugationRecord;
use crate::resolver::{LookupError, RecordStore};
use crate::view::ConjugationView;

/// Where a looked-up record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Store,
    Generated,
}

/// Everything needed to look up and display one word class
pub struct Conjugator {
    class: WordClass,
    lexicon: Lexicon,
    store: RecordStore,
    cache: Option<ConjugationCache>,
    generator: Option<ConjugationGenerator>,
    annotator: FuriganaAnnotator,
}

impl Conjugator {
    pub fn new(
        class: WordClass,
        lexicon: Lexicon,
        store: RecordStore,
        annotator: FuriganaAnnotator,
    ) -> Self {
        Self {
            class,
            lexicon,
            store,
            cache: None,
            generator: None,
            annotator,
        }
    }

    /// Build from configuration. Data files that fail to load leave the
    /// corresponding list or mapping empty.
    pub fn from_config(config: &Config, class: WordClass, tokenizer: TokenizerHandle) -> Self {
        let lexicon = Lexicon::load_or_empty(class, config.data.lemmas(class));
        let store = RecordStore::load_or_empty(config.data.records(class));
        let mut conjugator = Self::new(class, lexicon, store, FuriganaAnnotator::new(tokenizer));

        if let Some(dir) = config.cache_dir() {
            conjugator = conjugator.with_cache(ConjugationCache::open(&dir, class));
        }
        let generator = ConjugationGenerator::new(config.clone());
        if generator.is_available() {
            conjugator = conjugator.with_generator(generator);
        }
        conjugator
    }

    pub fn with_cache(mut self, cache: ConjugationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_generator(mut self, generator: ConjugationGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn class(&self) -> WordClass {
        self.class
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn annotator(&self) -> &FuriganaAnnotator {
        &self.annotator
    }

    /// Look up a lemma: persisted cache first, then the loaded records, then
    /// the generator if one is configured. Found records are written through
    /// to the cache.
    pub async fn conjugate(
        &mut self,
        lemma: &str,
        category: Option<&str>,
    ) -> Result<(ConjugationRecord, Source), LookupError> {
        let lemma = lemma.trim();
        if lemma.is_empty() {
            return Err(LookupError::EmptyInput);
        }

        if let Some(record) = self.cache.as_ref().and_then(|c| c.get(lemma)) {
            tracing::debug!("Cache hit for {}", lemma);
            return Ok((record.clone(), Source::Cache));
        }

        let (record, source) = match self.store.resolve(lemma) {
            Ok(record) => (record, Source::Store),
            Err(LookupError::NotFound(_)) if self.generator.is_some() => {
                (self.generate(lemma, category).await?, Source::Generated)
            }
            Err(e) => return Err(e),
        };

        if let Some(cache) = self.cache.as_mut() {
            if let Err(e) = cache.insert(lemma, record.clone()) {
                tracing::warn!("Failed to cache {}: {:#}", lemma, e);
            }
        }

        Ok((record, source))
    }

    async fn generate(
        &self,
        lemma: &str,
        category: Option<&str>,
    ) -> Result<ConjugationRecord, LookupError> {
        let Some(generator) = self.generator.as_ref() else {
            return Err(LookupError::NotFound(lemma.to_string()));
        };
        let request = GenerateRequest {
            lemma: lemma.to_string(),
            class: self.class,
            category: category.map(str::to_string),
        };
        let raw = generator.generate(&request).await?;
        tracing::info!("Generated {} table for {}", self.class, lemma);
        Ok(raw.resolve(&mut rand::rng()))
    }

    /// Annotated view of a record, cells hidden
    pub fn view(&self, record: &ConjugationRecord) -> ConjugationView {
        ConjugationView::build(record, &self.annotator, self.class)
    }
}

/// Per-session selection state
#[derive(Debug, Clone)]
pub struct StudySession {
    pub class: WordClass,
    pub category: CategoryFilter,
    pub input: String,
    pub selected_id: Option<u32>,
}

impl StudySession {
    pub fn new(class: WordClass) -> Self {
        Self {
            class,
            category: CategoryFilter::All,
            input: String::new(),
            selected_id: None,
        }
    }

    /// Lemmas passing the current category filter
    pub fn visible<'a>(&'a self, lexicon: &'a Lexicon) -> Vec<&'a LemmaEntry> {
        lexicon.filtered(&self.category).collect()
    }

    /// Select a list entry. Returns its category as the lookup hint.
    pub fn select<'a>(&mut self, entry: &'a LemmaEntry) -> &'a str {
        self.selected_id = Some(entry.id);
        self.input = entry.text.clone();
        &entry.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::furigana::tests::annotator;
    use pretty_assertions::assert_eq;

    const LEMMAS: &str = r#"{"adjectives": [
        {"id": 1, "adjective": "高い", "category": "i-adjective"},
        {"id": 2, "adjective": "静か", "category": "na-adjective"}
    ]}"#;

    const RECORDS: &str = r#"{
        "高い": {
            "title": "高い Conjugation Table",
            "type": "i-adjective",
            "meaning": "tall/expensive",
            "conjugations": [
                { "conjugation": "Base Form", "polite": "たかいです", "plain": "たかい" }
            ],
            "examples": {
                "Positive": [
                    { "english": "It is tall.", "japanese_polite": "たかいです", "japanese_plain": "たかい" },
                    { "english": "It is expensive.", "japanese_polite": "たかいです", "japanese_plain": "たかい" }
                ]
            }
        }
    }"#;

    fn conjugator() -> Conjugator {
        Conjugator::new(
            WordClass::Adjective,
            Lexicon::from_json(WordClass::Adjective, LEMMAS).unwrap(),
            RecordStore::from_json(RECORDS).unwrap(),
            annotator(&[("高い", &[("高い", "タカイ")])]),
        )
    }

    #[tokio::test]
    async fn test_conjugate_from_store() {
        let mut conjugator = conjugator();
        let (record, source) = conjugator.conjugate("高い", None).await.unwrap();

        assert_eq!(source, Source::Store);
        assert_eq!(record.examples.len(), 1);
        assert_eq!(record.examples[0].tense, "Positive");
    }

    #[tokio::test]
    async fn test_conjugate_trims_input() {
        let mut conjugator = conjugator();
        assert!(conjugator.conjugate("  高い \n", None).await.is_ok());
        assert!(matches!(
            conjugator.conjugate("   ", None).await,
            Err(LookupError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_conjugate_not_found() {
        let mut conjugator = conjugator();
        let result = conjugator.conjugate("ねこねこ", None).await;
        assert!(matches!(result, Err(LookupError::NotFound(ref l)) if l == "ねこねこ"));
    }

    #[tokio::test]
    async fn test_cache_hit_returns_stored_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut conjugator = conjugator()
            .with_cache(ConjugationCache::open(dir.path(), WordClass::Adjective));

        let (first, source) = conjugator.conjugate("高い", None).await.unwrap();
        assert_eq!(source, Source::Store);

        for _ in 0..8 {
            let (again, source) = conjugator.conjugate("高い", None).await.unwrap();
            assert_eq!(source, Source::Cache);
            assert_eq!(again, first);
        }

        let reopened = ConjugationCache::open(dir.path(), WordClass::Adjective);
        assert_eq!(reopened.get("高い"), Some(&first));
    }

    const GENERATED: &str = r#"{
        "title": "赤い Conjugation Table",
        "type": "i-adjective",
        "meaning": "red",
        "conjugations": [
            { "conjugation": "Base Form", "polite": "あかいです", "plain": "あかい" }
        ],
        "examples": {
            "Positive": [
                { "english": "The apple is red.", "japanese_polite": "りんごはあかいです", "japanese_plain": "りんごはあかい" }
            ],
            "Past": [
                { "english": "The sky was red.", "japanese_polite": "そらはあかかったです", "japanese_plain": "そらはあかかった" }
            ]
        }
    }"#;

    fn llm_config(base_url: Option<String>) -> Config {
        let mut config = Config::default();
        config.llm = LlmConfig {
            provider: "openai".to_string(),
            api_key: Some("test-key".to_string()),
            base_url,
            ..Default::default()
        };
        config
    }

    /// Answer a single chat completion request with `content`, then stop
    async fn serve_one_completion(content: &str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
        .to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
                    let length = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, server)
    }

    #[tokio::test]
    async fn test_generated_record_is_flattened_and_cached() {
        let (url, server) = serve_one_completion(GENERATED).await;
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let generator = ConjugationGenerator::with_client(llm_config(Some(url)), client);
        let dir = tempfile::tempdir().unwrap();
        let mut conjugator = conjugator()
            .with_cache(ConjugationCache::open(dir.path(), WordClass::Adjective))
            .with_generator(generator);

        let (record, source) = conjugator.conjugate("赤い", Some("i-adjective")).await.unwrap();
        assert_eq!(source, Source::Generated);
        assert_eq!(record.heading(), "赤い");
        let tenses: Vec<&str> = record.examples.iter().map(|e| e.tense.as_str()).collect();
        assert_eq!(tenses, vec!["Positive", "Past"]);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.contains("adjective \\\"赤い\\\""));
        assert!(request.contains("category \\\"i-adjective\\\""));

        // The stub is gone, so only the cache can answer now
        let (again, source) = conjugator.conjugate("赤い", None).await.unwrap();
        assert_eq!(source, Source::Cache);
        assert_eq!(again, record);

        let reopened = ConjugationCache::open(dir.path(), WordClass::Adjective);
        assert_eq!(reopened.get("赤い"), Some(&record));
    }

    #[tokio::test]
    async fn test_store_hit_skips_generator() {
        let generator = ConjugationGenerator::new(llm_config(Some("http://127.0.0.1:9".to_string())));
        let mut conjugator = conjugator().with_generator(generator);

        let (_, source) = conjugator.conjugate("高い", None).await.unwrap();
        assert_eq!(source, Source::Store);
    }

    #[tokio::test]
    async fn test_generator_failure_is_remote_error() {
        let generator = ConjugationGenerator::new(llm_config(Some("http://127.0.0.1:9".to_string())));
        let mut conjugator = conjugator().with_generator(generator);

        assert!(matches!(
            conjugator.conjugate("ねこねこ", None).await,
            Err(LookupError::Remote(_))
        ));
    }

    #[test]
    fn test_from_config_attaches_generator_only_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = llm_config(None);
        config.data.adjectives = dir.path().join("missing.json");
        config.data.adjective_records = dir.path().join("missing_records.json");
        config.cache.enabled = false;

        let enabled =
            Conjugator::from_config(&config, WordClass::Adjective, TokenizerHandle::pending());
        assert!(enabled.generator.is_some());
        assert!(enabled.cache.is_none());

        config.llm.provider = "none".to_string();
        let disabled =
            Conjugator::from_config(&config, WordClass::Adjective, TokenizerHandle::pending());
        assert!(disabled.generator.is_none());
    }

    #[tokio::test]
    async fn test_from_config_with_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data.adjectives = dir.path().join("missing.json");
        config.data.adjective_records = dir.path().join("missing_records.json");
        config.cache.dir = Some(dir.path().to_path_buf());

        let mut conjugator =
            Conjugator::from_config(&config, WordClass::Adjective, TokenizerHandle::pending());

        assert!(conjugator.lexicon().is_empty());
        assert!(!conjugator.annotator().is_ready());
        assert!(matches!(
            conjugator.conjugate("高い", None).await,
            Err(LookupError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_shipped_data_files() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
        let mut config = Config::default();
        config.data.verbs = root.join("data/verbs.json");
        config.data.verb_records = root.join("data/verb_conjugations.json");
        config.cache.enabled = false;

        let mut conjugator =
            Conjugator::from_config(&config, WordClass::Verb, TokenizerHandle::pending());
        assert_eq!(conjugator.lexicon().len(), 8);

        let (record, source) = conjugator.conjugate("食べる", Some("Ichidan")).await.unwrap();
        assert_eq!(source, Source::Store);
        let tenses: Vec<&str> = record.examples.iter().map(|e| e.tense.as_str()).collect();
        assert_eq!(
            tenses,
            vec![
                "Non-past Affirmative",
                "Non-past Negative",
                "Past Affirmative",
                "Past Negative",
                "Te-form",
            ]
        );
        assert!(matches!(
            conjugator.conjugate("見る", None).await,
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_view_uses_annotator() {
        let conjugator = conjugator();
        let record = conjugator.store.resolve("高い").unwrap();
        let view = conjugator.view(&record);

        assert_eq!(crate::furigana::to_inline(&view.heading), "高い(たかい)");
    }

    #[test]
    fn test_session_filter_and_select() {
        let conjugator = conjugator();
        let mut session = StudySession::new(WordClass::Adjective);
        assert_eq!(session.visible(conjugator.lexicon()).len(), 2);

        session.category = CategoryFilter::parse(WordClass::Adjective, "na-adjective").unwrap();
        let visible = session.visible(conjugator.lexicon());
        assert_eq!(visible.len(), 1);

        let entry = visible[0].clone();
        let hint = session.select(&entry);
        assert_eq!(hint, "na-adjective");
        assert_eq!(session.input, "静か");
        assert_eq!(session.selected_id, Some(2));
    }
}

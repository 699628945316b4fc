//! LLM-backed conjugation table generator
//!
//! Supports Claude (Anthropic) and OpenAI APIs.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::lexicon::WordClass;
use crate::record::RawRecord;

/// LLM client for making API requests
pub struct ConjugationGenerator {
    client: Client,
    config: Config,
}

/// Request for a conjugation table
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Lemma to conjugate
    pub lemma: String,
    pub class: WordClass,
    /// Category from the lemma list, if the lemma was picked there
    pub category: Option<String>,
}

// Claude API types
#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    text: String,
}

// OpenAI API types
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessageResponse,
}

#[derive(Deserialize)]
struct OpenAiMessageResponse {
    content: String,
}

const VERB_FORMAT: &str = r#"{
  "title": "<Verb in kanji> Conjugation Table",
  "group": "Group information (e.g. Group 1)",
  "meaning": "Meaning of the verb",
  "conjugations": [
    { "conjugation": "Non-past Affirmative", "polite": "...", "plain": "..." },
    { "conjugation": "Non-past Negative", "polite": "...", "plain": "..." },
    { "conjugation": "Past Affirmative", "polite": "...", "plain": "...", "te": "..." },
    { "conjugation": "Past Negative", "polite": "...", "plain": "..." }
  ],
  "examples": [
    { "tense": "Non-past Affirmative", "english": "English example sentence", "japanese_polite": "japanese polite translation", "japanese_plain": "japanese plain translation" },
    { "tense": "Non-past Negative", "english": "English example sentence", "japanese_polite": "japanese polite translation", "japanese_plain": "japanese plain translation" },
    { "tense": "Past Affirmative", "english": "English example sentence", "japanese_polite": "japanese polite translation", "japanese_plain": "japanese plain translation" },
    { "tense": "Past Negative", "english": "English example sentence", "japanese_polite": "japanese polite translation", "japanese_plain": "japanese plain translation" },
    { "tense": "Te-form", "english": "English example sentence", "japanese_polite": "japanese polite translation", "japanese_plain": "japanese plain translation" }
  ]
}"#;

const ADJECTIVE_FORMAT: &str = r#"{
  "title": "<Adjective> Conjugation Table",
  "type": "i-adjective or na-adjective",
  "meaning": "Meaning of the adjective",
  "conjugations": [
    { "conjugation": "Base Form", "polite": "...", "plain": "..." },
    { "conjugation": "Negative", "polite": "...", "plain": "..." },
    { "conjugation": "Past", "polite": "...", "plain": "..." },
    { "conjugation": "Past Negative", "polite": "...", "plain": "..." },
    { "conjugation": "Adverbial", "polite": "...", "plain": "..." }
  ],
  "examples": [
    { "tense": "Positive", "english": "English example sentence", "japanese_polite": "japanese polite translation", "japanese_plain": "japanese plain translation" },
    { "tense": "Negative", "english": "English example sentence", "japanese_polite": "japanese polite translation", "japanese_plain": "japanese plain translation" },
    { "tense": "Past", "english": "English example sentence", "japanese_polite": "japanese polite translation", "japanese_plain": "japanese plain translation" },
    { "tense": "Past Negative", "english": "English example sentence", "japanese_polite": "japanese polite translation", "japanese_plain": "japanese plain translation" },
    { "tense": "Adverbial", "english": "English example sentence using adverbial form", "japanese_polite": "japanese polite translation using adverbial form", "japanese_plain": "japanese plain translation using adverbial form" }
  ]
}"#;

impl ConjugationGenerator {
    /// Create a new generator with the given configuration
    pub fn new(config: Config) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create a generator that sends its requests through `client`
    pub fn with_client(config: Config, client: Client) -> Self {
        Self { client, config }
    }

    /// Check if LLM integration is available
    pub fn is_available(&self) -> bool {
        self.config.is_llm_enabled()
    }

    /// Ask the model for a conjugation table
    pub async fn generate(&self, request: &GenerateRequest) -> Result<RawRecord> {
        if !self.is_available() {
            return Err(anyhow!("LLM integration is not configured"));
        }

        let prompt = build_prompt(request);
        tracing::debug!("Requesting {} table for {}", request.class, request.lemma);
        let response = match self.config.llm.provider.as_str() {
            "claude" => self.call_claude(&prompt).await?,
            "openai" => self.call_openai(&prompt).await?,
            _ => return Err(anyhow!("Unknown LLM provider: {}", self.config.llm.provider)),
        };

        parse_response(&response)
    }

    /// Call Claude API
    async fn call_claude(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .config
            .get_api_key()
            .ok_or_else(|| anyhow!("Claude API key not found"))?;

        let base_url = self
            .config
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com".to_string());

        let request = ClaudeRequest {
            model: self.config.get_model(),
            max_tokens: self.config.llm.max_tokens,
            temperature: self.config.llm.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Claude API error: {} - {}", status, body));
        }

        let claude_response: ClaudeResponse = response.json().await?;
        claude_response
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| anyhow!("Empty response from Claude"))
    }

    /// Call OpenAI API
    async fn call_openai(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .config
            .get_api_key()
            .ok_or_else(|| anyhow!("OpenAI API key not found"))?;

        let base_url = self
            .config
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        let request = OpenAiRequest {
            model: self.config.get_model(),
            max_tokens: self.config.llm.max_tokens,
            temperature: self.config.llm.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error: {} - {}", status, body));
        }

        let openai_response: OpenAiResponse = response.json().await?;
        openai_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow!("Empty response from OpenAI"))
    }
}

/// Build the prompt for a conjugation table
fn build_prompt(request: &GenerateRequest) -> String {
    let lemma = &request.lemma;
    let mut prompt = match request.class {
        WordClass::Verb => format!(
            "Please provide a Japanese verb conjugation table for the verb \"{}\".\n",
            lemma
        ),
        WordClass::Adjective => format!(
            "Please provide a Japanese adjective conjugation table for the adjective \"{}\".\n",
            lemma
        ),
    };

    if let Some(ref category) = request.category {
        prompt.push_str(&format!(
            "It belongs to the category \"{}\".\n",
            category
        ));
    }

    match request.class {
        WordClass::Verb => {
            prompt.push_str(
                "Include the main meaning of the verb and specify which verb group it belongs to \
                 (e.g. Group 1: Godan Verbs, Group 2: Ichidan Verbs, or Group 3: Irregular Verbs) in the output.\n",
            );
            prompt.push_str(
                "Additionally, provide example sentences for each conjugation at a JLPT N5 level \
                 using exactly the same verb.\n",
            );
        }
        WordClass::Adjective => {
            prompt.push_str("Include the main meaning of the adjective.\n");
            prompt.push_str(
                "Include the following conjugation forms: Base Form, Negative Form, Past Form, \
                 Past Negative Form, Adverbial Form.\n",
            );
            prompt.push_str(
                "Additionally, provide example sentences for each form at a JLPT N5 level.\n",
            );
        }
    }

    prompt.push_str(
        "For each conjugation, output an example sentence in English and two Japanese translations, \
         one in polite form and one in plain form, in hiragana only (no kanji).\n",
    );
    prompt.push_str("Output a JSON object with the following structure (and no additional text):\n\n");
    prompt.push_str(match request.class {
        WordClass::Verb => VERB_FORMAT,
        WordClass::Adjective => ADJECTIVE_FORMAT,
    });

    prompt
}

/// Parse the LLM response into a record
fn parse_response(response: &str) -> Result<RawRecord> {
    let json_str = extract_json(response)?;

    serde_json::from_str(&json_str)
        .map_err(|e| anyhow!("Failed to parse LLM response: {} - Response: {}", e, json_str))
}

/// Extract JSON from potentially wrapped response
fn extract_json(response: &str) -> Result<String> {
    let trimmed = response.trim();

    // If it starts with {, assume it's JSON
    if trimmed.starts_with('{') {
        // Find the matching closing brace, ignoring braces inside strings
        let mut depth = 0;
        let mut end_idx = 0;
        let mut in_string = false;
        let mut escaped = false;
        for (i, c) in trimmed.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end_idx = i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        if end_idx > 0 {
            return Ok(trimmed[..end_idx].to_string());
        }
    }

    // Try to find JSON in code blocks
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return Ok(trimmed[json_start..json_start + end].trim().to_string());
        }
    }

    // Try to find any JSON object
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            return Ok(trimmed[start..=end].to_string());
        }
    }

    Err(anyhow!("Could not extract JSON from response: {}", response))
}

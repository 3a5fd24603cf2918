//! LLM classifier backed by an Ollama server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ClassificationError, Classifier, TaxonomyEntry};
use crate::models::Label;

/// Default prompt for picking a label.
pub const DEFAULT_CLASSIFY_PROMPT: &str = r#"You are filing an uploaded document into a folder structure. Read the document and choose the ONE label below that best describes it.

Available labels (Category / Subcategory):
{labels}

Document Content:
{content}

Respond with ONLY the chosen label exactly as written above, in the form "Category / Subcategory". No explanation."#;

/// Configuration for the LLM classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama API endpoint (default: http://localhost:11434)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model used for classification
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Custom prompt (uses {labels} and {content} placeholders)
    #[serde(default)]
    pub prompt: Option<String>,
    /// Maximum characters of document content to send to the model
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3.2:3b".to_string()
}
fn default_max_tokens() -> u32 {
    32
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_content_chars() -> usize {
    8000
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            prompt: None,
            max_content_chars: default_max_content_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Get the prompt, using custom or default.
    pub fn get_prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or(DEFAULT_CLASSIFY_PROMPT)
    }
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Classifier that asks an LLM to choose a taxonomy entry.
pub struct LlmClassifier {
    config: LlmConfig,
    taxonomy: Vec<TaxonomyEntry>,
    client: Client,
}

impl LlmClassifier {
    pub fn new(config: LlmConfig, taxonomy: Vec<TaxonomyEntry>) -> Result<Self, ClassificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassificationError::Unavailable(e.to_string()))?;

        Ok(Self {
            config,
            taxonomy,
            client,
        })
    }

    fn build_prompt(&self, text: &str) -> String {
        let labels = self
            .taxonomy
            .iter()
            .map(|e| format!("- {} / {}", e.category, e.subcategory))
            .collect::<Vec<_>>()
            .join("\n");

        self.config
            .get_prompt()
            .replace("{labels}", &labels)
            .replace("{content}", self.truncate_content(text))
    }

    /// Truncate content to the configured number of characters.
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.config.max_content_chars) {
            Some((end, _)) => &text[..end],
            None => text,
        }
    }

    /// Map a model answer onto a taxonomy entry.
    ///
    /// Accepts "Category / Subcategory" (also `>` or `:` as separator, with
    /// optional quotes or a "Label:" prefix) on the first non-empty line, then
    /// falls back to looking for any known label inside the whole answer.
    fn parse_label(&self, response: &str) -> Option<Label> {
        let first_line = response
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())?
            .trim_start_matches("Label:")
            .trim_start_matches("label:")
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*' || c == '.')
            .trim();

        for sep in ['/', '>', ':'] {
            if let Some((category, subcategory)) = first_line.split_once(sep) {
                if let Some(entry) = self
                    .taxonomy
                    .iter()
                    .find(|e| e.label().matches(category, subcategory))
                {
                    return Some(entry.label());
                }
            }
        }

        let lowered = response.to_lowercase();
        self.taxonomy
            .iter()
            .find(|e| {
                let slash = format!("{} / {}", e.category, e.subcategory).to_lowercase();
                let tight = format!("{}/{}", e.category, e.subcategory).to_lowercase();
                lowered.contains(&slash) || lowered.contains(&tight)
            })
            .map(TaxonomyEntry::label)
    }

    /// Call Ollama API with a prompt.
    async fn call_ollama(&self, prompt: &str) -> Result<String, ClassificationError> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassificationError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassificationError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| ClassificationError::Api(e.to_string()))?;

        Ok(ollama_resp.response)
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    fn name(&self) -> &str {
        "llm"
    }

    async fn classify(&self, text: &str) -> Result<Label, ClassificationError> {
        if text.trim().is_empty() {
            return Err(ClassificationError::EmptyText);
        }

        debug!("Classifying {} chars with {}", text.len(), self.config.model);
        let prompt = self.build_prompt(text);
        let response = self.call_ollama(&prompt).await?;

        self.parse_label(&response)
            .ok_or_else(|| ClassificationError::Unrecognized(response.trim().to_string()))
    }
}

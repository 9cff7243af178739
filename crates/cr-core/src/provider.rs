use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::message::{Message, Usage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Output of a completion call.
///
/// `content` is the extracted generated text when the provider's output had
/// the expected shape; `raw` always holds the whole decoded output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub raw: serde_json::Value,
    pub usage: Usage,
    pub model: String,
    pub finish_reason: FinishReason,
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            raw: serde_json::json!({ "text": content }),
            content: Some(content),
            usage: Usage::default(),
            model: String::new(),
            finish_reason: FinishReason::Stop,
        }
    }

    /// The generated text, or the string form of the raw output when no text
    /// field could be extracted.
    pub fn text_or_raw(&self) -> String {
        match &self.content {
            Some(text) => text.clone(),
            None => self.raw.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Get the default model, if one is configured.
    fn default_model(&self) -> Option<&str>;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error>;
}

/// The stable configuration a provider client is built from.
///
/// Two configs are equal only when every field matches, including the
/// credential; a cached client is reusable only for an equal config.
#[derive(Clone, Serialize)]
pub struct CompletionConfig {
    pub model_id: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    #[serde(skip)]
    pub api_key: String,
}

impl CompletionConfig {
    pub fn new(model_id: impl Into<String>, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            model_id: model_id.into(),
            temperature,
            max_output_tokens,
            api_key: String::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("model_id", &self.model_id)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("api_key", &if self.has_credential() { "(set)" } else { "(missing)" })
            .finish()
    }
}

// f32 has no Eq/Hash; compare temperatures bitwise so the config can key a map.
impl PartialEq for CompletionConfig {
    fn eq(&self, other: &Self) -> bool {
        self.model_id == other.model_id
            && self.temperature.to_bits() == other.temperature.to_bits()
            && self.max_output_tokens == other.max_output_tokens
            && self.api_key == other.api_key
    }
}

impl Eq for CompletionConfig {}

impl std::hash::Hash for CompletionConfig {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.model_id.hash(state);
        self.temperature.to_bits().hash(state);
        self.max_output_tokens.hash(state);
        self.api_key.hash(state);
    }
}

/// Builds provider clients for a given configuration.
pub trait ProviderFactory: Send + Sync {
    fn build(&self, config: &CompletionConfig) -> Result<Arc<dyn Provider>, Error>;
}

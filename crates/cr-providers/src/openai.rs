use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cr_core::{
    CompletionRequest, CompletionResponse, Error, FinishReason, Message, Provider, Usage,
};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any OpenAI-compatible chat completions endpoint.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: Option<String>,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            default_model: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    fn build_request(&self, request: &CompletionRequest) -> OpenAIChatRequest {
        // Model priority: request > provider default
        let model = request
            .model
            .clone()
            .or_else(|| self.default_model.clone());

        let messages = request
            .messages
            .iter()
            .map(|m| self.convert_message(m))
            .collect();

        OpenAIChatRequest {
            model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }

    fn convert_message(&self, message: &Message) -> OpenAIMessage {
        OpenAIMessage {
            role: message.role.to_string(),
            content: message.content.clone(),
        }
    }

    /// Pull the generated text out of a raw response body.
    ///
    /// The body is kept as-is in `raw`; a missing or non-string
    /// `choices[0].message.content` leaves `content` empty instead of failing.
    fn parse_response(&self, raw: serde_json::Value) -> CompletionResponse {
        let parsed: Option<OpenAIChatResponse> = serde_json::from_value(raw.clone()).ok();

        let (content, finish_reason, usage, model) = match parsed {
            Some(response) => {
                let choice = response.choices.into_iter().next();
                let finish_reason = match choice.as_ref().and_then(|c| c.finish_reason.as_deref()) {
                    Some("length") => FinishReason::Length,
                    Some("content_filter") => FinishReason::ContentFilter,
                    _ => FinishReason::Stop,
                };
                let content = choice.and_then(|c| c.message).and_then(|m| m.content);
                let usage = response
                    .usage
                    .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
                    .unwrap_or_default();
                (content, finish_reason, usage, response.model.unwrap_or_default())
            }
            None => (None, FinishReason::Error, Usage::default(), String::new()),
        };

        if content.is_none() {
            warn!("Completion response had no message content");
        }

        CompletionResponse {
            content,
            raw,
            usage,
            model,
            finish_reason,
        }
    }

    fn parse_error(&self, status: u16, body: &str) -> Error {
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: ErrorDetail,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: String,
        }

        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|err| err.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status {
            401 => Error::auth(message),
            429 => Error::rate_limit(message),
            400 => Error::invalid_request(message),
            _ => Error::api(status, message),
        }
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error> {
        let api_request = self.build_request(&request);
        debug!(
            model = ?api_request.model,
            messages = api_request.messages.len(),
            "Chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &error_text));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::serialization(e.to_string()))?;

        Ok(self.parse_response(raw))
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    /// Model to use. Optional for servers that have a default model.
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    #[serde(default)]
    message: Option<OpenAIResponseMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

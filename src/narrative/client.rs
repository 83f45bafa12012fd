//! Completion provider client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{classify_http_status, LlmError, LlmErrorKind};
use crate::config::NarrativeConfig;

/// Provider request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Role in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// A completed chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// First choice's content; `None` when the provider returned no choices.
    pub content: Option<String>,
}

/// Trait for completion providers.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one completion request for the given user prompt.
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError>;
}

/// HTTP client for the xAI chat-completions API.
pub struct XaiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl XaiClient {
    pub fn new(config: &NarrativeConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionClient for XaiClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: Role::User,
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| LlmError::network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match classify_http_status(status.as_u16()) {
                LlmErrorKind::RateLimited => LlmError::rate_limited(message),
                _ => LlmError::http(status.as_u16(), message),
            });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|err| LlmError::malformed(err.to_string()))?;

        Ok(Completion {
            content: body.choices.into_iter().next().map(|c| c.message.content),
        })
    }
}

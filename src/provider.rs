//! Model Provider Clients
//!
//! Chat-completion clients for OpenAI-compatible endpoints (OpenAI itself,
//! Ollama, and self-hosted servers speaking the same API). The LLM engine
//! talks to providers only through [`ModelProviderClient`].

use crate::error::EngineError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider type discriminator used in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    Ollama,
}

impl ProviderType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Ollama => "ollama",
        }
    }
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Completion options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>, // 0.0-2.0
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: None,
        }
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub finish_reason: Option<String>,
}

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, EngineError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

pub(crate) fn map_http_error(error: reqwest::Error) -> EngineError {
    if error.is_timeout() {
        EngineError::Request(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        EngineError::Request(format!("Connection error: {}", error))
    } else if let Some(status) = error.status() {
        EngineError::Request(format!("Request failed with status {}: {}", status, error))
    } else {
        EngineError::Request(format!("HTTP error: {}", error))
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn build_http_client() -> Result<Client, EngineError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| EngineError::NotConfigured(format!("Failed to create HTTP client: {}", e)))
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionClient {
    client: Client,
    provider_type: ProviderType,
    model: String,
    api_key: Option<String>,
    url: String,
}

impl ChatCompletionClient {
    pub fn new(
        provider_type: ProviderType,
        model: String,
        api_key: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self, EngineError> {
        let url = match (provider_type, endpoint) {
            (_, Some(endpoint)) => format!("{}/chat/completions", endpoint.trim_end_matches('/')),
            (ProviderType::OpenAI, None) => "https://api.openai.com/v1/chat/completions".to_string(),
            (ProviderType::Ollama, None) => "http://localhost:11434/v1/chat/completions".to_string(),
        };
        if provider_type == ProviderType::OpenAI && api_key.is_none() {
            return Err(EngineError::NotConfigured(
                "OpenAI provider requires an API key".to_string(),
            ));
        }

        Ok(Self {
            client: build_http_client()?,
            provider_type,
            model,
            api_key,
            url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ModelProviderClient for ChatCompletionClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, EngineError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .into_iter()
                .map(|msg| OpenAIMessage {
                    role: role_to_string(msg.role).to_string(),
                    content: msg.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let mut builder = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder.send().await.map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status.as_u16() {
                401 => EngineError::NotConfigured(format!("Authentication failed: {}", error_text)),
                404 => EngineError::NotConfigured(format!("Model not found: {}", error_text)),
                _ => EngineError::Request(format!(
                    "Request failed with status {}: {}",
                    status, error_text
                )),
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| EngineError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::InvalidResponse("No choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: completion.model,
            finish_reason: choice.finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        self.provider_type.as_str()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

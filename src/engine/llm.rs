//! LLM-backed generation engine.
//!
//! Drafts and revisions go through a chat-completion provider; publishing
//! goes through an optional [`Publisher`].

use crate::config::EngineConfig;
use crate::engine::{EngineStep, GenerationEngine, StateDelta};
use crate::error::EngineError;
use crate::provider::{
    build_http_client, map_http_error, ChatCompletionClient, ChatMessage, CompletionOptions,
    ModelProviderClient,
};
use crate::workflow::WorkflowState;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You write social media posts. Reply with a JSON object \
containing two string fields: \"caption\" (the post text, hashtags included) and \
\"image_prompt\" (a one-sentence description of an accompanying image). \
Reply with the JSON object only.";

/// Final publication step, run once a human approved the draft.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, state: &WorkflowState) -> Result<StateDelta, EngineError>;
}

/// Engine that drafts with a model provider and publishes via a [`Publisher`].
pub struct LlmEngine {
    client: Box<dyn ModelProviderClient>,
    options: CompletionOptions,
    publisher: Option<Box<dyn Publisher>>,
}

impl LlmEngine {
    pub fn new(client: Box<dyn ModelProviderClient>, options: CompletionOptions) -> Self {
        Self {
            client,
            options,
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: Box<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Build the engine described by the `[engine]` configuration section.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = ChatCompletionClient::new(
            config.provider_type,
            config.model.clone(),
            config.resolve_api_key(),
            config.endpoint.clone(),
        )?;
        let options = CompletionOptions {
            temperature: config
                .temperature
                .or(CompletionOptions::default().temperature),
            max_tokens: config.max_tokens,
        };
        let engine = Self::new(Box::new(client), options);
        match config.publish_url {
            Some(ref url) => Ok(engine.with_publisher(Box::new(WebhookPublisher::new(url.clone())?))),
            None => Ok(engine),
        }
    }

    async fn draft(&self, state: &WorkflowState) -> Result<StateDelta, EngineError> {
        let messages = build_messages(state);
        let response = self.client.complete(messages, self.options.clone()).await?;
        debug!(
            provider = self.client.provider_name(),
            model = %response.model,
            finish_reason = ?response.finish_reason,
            "completion received"
        );
        Ok(parse_reply(&response.content))
    }

    async fn publish(&self, state: &WorkflowState) -> Result<StateDelta, EngineError> {
        match self.publisher {
            Some(ref publisher) => publisher.publish(state).await,
            None => {
                info!(thread_id = %state.thread_id, "no publisher configured; confirming draft");
                Ok(StateDelta {
                    generated_content: state.generated_content.clone(),
                    image_prompt: None,
                    image_url: state.image_url.clone(),
                })
            }
        }
    }
}

#[async_trait]
impl GenerationEngine for LlmEngine {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateDelta, EngineError> {
        match EngineStep::for_state(state) {
            EngineStep::Draft | EngineStep::Revise => self.draft(state).await,
            EngineStep::Publish => self.publish(state).await,
        }
    }

    fn name(&self) -> &str {
        self.client.model_name()
    }
}

/// A revision replays the previous draft as the model's own turn, followed
/// by the reviewer's feedback.
fn build_messages(state: &WorkflowState) -> Vec<ChatMessage> {
    let mut messages = vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("Topic: {}", state.topic)),
    ];
    if let (Some(feedback), Some(previous)) = (&state.feedback, &state.generated_content) {
        let draft = serde_json::json!({
            "caption": previous,
            "image_prompt": state.image_prompt,
        });
        messages.push(ChatMessage::assistant(draft.to_string()));
        messages.push(ChatMessage::user(format!(
            "Revise the draft according to this feedback:\n{}",
            feedback
        )));
    }
    messages
}

#[derive(Deserialize)]
struct DraftReply {
    caption: Option<String>,
    image_prompt: Option<String>,
}

/// Parse a model reply. Accepts the requested JSON object, optionally
/// wrapped in a markdown fence; anything else becomes the caption.
fn parse_reply(raw: &str) -> StateDelta {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    match serde_json::from_str::<DraftReply>(unfenced) {
        Ok(reply) => StateDelta {
            generated_content: reply.caption.filter(|c| !c.trim().is_empty()),
            image_prompt: reply.image_prompt.filter(|p| !p.trim().is_empty()),
            image_url: None,
        },
        Err(_) if trimmed.is_empty() => StateDelta::default(),
        Err(_) => StateDelta::content(trimmed),
    }
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    thread_id: String,
    topic: &'a str,
    caption: Option<&'a str>,
    image_prompt: Option<&'a str>,
    image_url: Option<&'a str>,
}

#[derive(Deserialize, Default)]
struct PublishResponse {
    #[serde(default)]
    image_url: Option<String>,
}

/// Publishes by POSTing the approved post to a webhook.
pub struct WebhookPublisher {
    client: Client,
    url: String,
}

impl WebhookPublisher {
    pub fn new(url: impl Into<String>) -> Result<Self, EngineError> {
        Ok(Self {
            client: build_http_client()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Publisher for WebhookPublisher {
    async fn publish(&self, state: &WorkflowState) -> Result<StateDelta, EngineError> {
        let request = PublishRequest {
            thread_id: state.thread_id.to_string(),
            topic: &state.topic,
            caption: state.generated_content.as_deref(),
            image_prompt: state.image_prompt.as_deref(),
            image_url: state.image_url.as_deref(),
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            return Err(EngineError::Request(format!(
                "Publish webhook returned status {}",
                response.status()
            )));
        }

        // An empty body is a valid acknowledgement.
        let body = response.text().await.map_err(map_http_error)?;
        let parsed: PublishResponse = if body.trim().is_empty() {
            PublishResponse::default()
        } else {
            serde_json::from_str(&body)
                .map_err(|e| EngineError::InvalidResponse(format!("Publish response: {}", e)))?
        };

        Ok(StateDelta {
            generated_content: state.generated_content.clone(),
            image_prompt: None,
            image_url: parsed.image_url.or_else(|| state.image_url.clone()),
        })
    }
}

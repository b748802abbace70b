use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use crate::error::AppError;

/// Produces a natural-language answer for a fully assembled prompt.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn chat(&self, prompt: &str) -> Result<String, AppError>;
}

/// Single-turn chat completion against an OpenAI-compatible endpoint. The
/// prompt is sent as one `user` message with no system message.
pub struct OpenAiChatGenerator {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiChatGenerator {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl AnswerGenerator for OpenAiChatGenerator {
    async fn chat(&self, prompt: &str) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestUserMessage::from(prompt).into()])
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::Provider(format!("chat completion failed: {e}")))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Provider("No content found in LLM response".into()))?;

        debug!(model = %self.model, answer_chars = content.len(), "Chat completion received");
        Ok(content)
    }
}

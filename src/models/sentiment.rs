//! Sentiment classification via an OpenAI chat model.
//!
//! The model is asked for a single-object JSON response with the top label
//! and its confidence. Replies wrapped in markdown code fences are unwrapped
//! before parsing.

use super::SentimentModel;
use crate::error::{Result, TubelensError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

const SYSTEM_PROMPT: &str = "You are a sentiment classifier. Classify the overall sentiment \
of the text as POSITIVE, NEGATIVE or NEUTRAL. Respond with a single JSON object of the form \
{\"label\": \"POSITIVE\", \"score\": 0.93} where score is your confidence between 0 and 1. \
Respond with JSON only, no other text.";

#[derive(Debug, Deserialize)]
struct Classification {
    label: String,
    score: f32,
}

/// OpenAI-based sentiment model.
pub struct OpenAiSentimentModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiSentimentModel {
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SentimentModel for OpenAiSentimentModel {
    #[instrument(skip(self, text), fields(text_chars = text.len()))]
    async fn classify(&self, text: &str) -> Result<(String, f32)> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| TubelensError::Classification(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(text.to_string())
                .build()
                .map_err(|e| TubelensError::Classification(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .max_completion_tokens(50u32)
            .build()
            .map_err(|e| TubelensError::Classification(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TubelensError::OpenAI(format!("Sentiment API error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| {
                TubelensError::Classification("Empty response from sentiment model".to_string())
            })?;

        let parsed: Classification = serde_json::from_str(strip_code_fence(content))
            .map_err(|e| {
                TubelensError::Classification(format!("Unparseable sentiment reply: {}", e))
            })?;

        Ok((parsed.label.to_uppercase(), parsed.score.clamp(0.0, 1.0)))
    }
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

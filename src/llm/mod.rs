//! Client for an OpenAI-compatible chat-completions endpoint.

use std::sync::Arc;

use reqwest::Client;

use crate::{
    config::Config,
    error::AppError,
    snapshot::RenderedSnapshot,
    types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage},
};

const SYSTEM_PROMPT: &str = "You are a music taste assistant. Answer the user's question \
using only the Spotify listening data provided. If the data does not contain the answer, \
say so. Keep answers short and concrete.";

const PING_PROMPT: &str = "Reply with the single word: pong";

/// Answer of the chat endpoint together with the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    config: Arc<Config>,
}

impl ChatClient {
    pub fn new(http: Client, config: Arc<Config>) -> Self {
        Self { http, config }
    }

    pub fn model(&self) -> &str {
        &self.config.llm_model
    }

    /// Asks `question` about the listening data in `snapshot`.
    pub async fn ask(
        &self,
        question: &str,
        snapshot: &RenderedSnapshot,
    ) -> Result<Completion, AppError> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Listening data (JSON{}):\n{}\n\nQuestion: {}",
                if snapshot.truncated { ", truncated" } else { "" },
                snapshot.text,
                question
            )),
        ];

        self.complete(&messages).await
    }

    /// Sends a fixed prompt to check connectivity and credentials.
    pub async fn ping(&self) -> Result<Completion, AppError> {
        let messages = [
            ChatMessage::system("You are a connectivity check."),
            ChatMessage::user(PING_PROMPT),
        ];

        self.complete(&messages).await
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, AppError> {
        let api_key = self
            .config
            .llm_api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("LLM_API_KEY must be set".to_string()))?;

        let request = ChatCompletionRequest {
            model: &self.config.llm_model,
            messages,
            max_tokens: self.config.llm_max_tokens,
        };

        tracing::debug!(
            model = %self.config.llm_model,
            messages = messages.len(),
            "sending chat completion"
        );

        let response = self
            .http
            .post(&self.config.llm_api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                service: "chat completions",
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatCompletionResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Upstream {
                service: "chat completions",
                status: status.as_u16(),
                body: "response contained no message content".to_string(),
            })?;

        Ok(Completion {
            content: content.trim().to_string(),
            model: body.model.unwrap_or_else(|| self.config.llm_model.clone()),
        })
    }
}

//! Reasoning model client
//!
//! `ReasoningModel` is an opaque, fallible text completion: system
//! instruction + user payload in, free-form text out. No schema is assumed
//! on the response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::AzureOpenAiConfig;
use crate::utils::{is_transient_status, retry_transient, RetryPolicy, Transient};

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Chat completion API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Model returned no content")]
    EmptyResponse,
}

impl Transient for ReasoningError {
    fn is_transient(&self) -> bool {
        match self {
            ReasoningError::NetworkError(_) => true,
            ReasoningError::ApiError(status, _) => reqwest::StatusCode::from_u16(*status)
                .map(is_transient_status)
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Text completion capability
#[async_trait]
pub trait ReasoningModel: Send + Sync {
    async fn complete(
        &self,
        system_instruction: &str,
        user_payload: &str,
    ) -> Result<String, ReasoningError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Azure OpenAI chat completions client
pub struct AzureChatClient {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl AzureChatClient {
    pub fn new(config: &AzureOpenAiConfig) -> Result<Self, ReasoningError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ReasoningError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            url: chat_url(config),
            api_key: config.api_key.clone(),
            retry: RetryPolicy::default(),
        })
    }
}

fn chat_url(config: &AzureOpenAiConfig) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        config.endpoint.trim_end_matches('/'),
        config.chat_deployment,
        config.api_version
    )
}

fn first_content(response: ChatResponse) -> Result<String, ReasoningError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(ReasoningError::EmptyResponse)
}

#[async_trait]
impl ReasoningModel for AzureChatClient {
    async fn complete(
        &self,
        system_instruction: &str,
        user_payload: &str,
    ) -> Result<String, ReasoningError> {
        let request = ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_payload,
                },
            ],
            temperature: 0.0,
        };
        let request = &request;
        let this = self;

        let response: ChatResponse =
            retry_transient("openai.chat_completion", &self.retry, || async move {
                let response = this
                    .http_client
                    .post(&this.url)
                    .header("api-key", &this.api_key)
                    .json(request)
                    .send()
                    .await
                    .map_err(|e| ReasoningError::NetworkError(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(ReasoningError::ApiError(status.as_u16(), error_text));
                }

                response
                    .json()
                    .await
                    .map_err(|e| ReasoningError::ParseError(e.to_string()))
            })
            .await?;

        let content = first_content(response)?;
        tracing::debug!(response_chars = content.len(), "Chat completion received");
        Ok(content)
    }
}

//! Azure OpenAI embeddings client
//!
//! Turns a query string into the vector the rule index was built with.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::AzureOpenAiConfig;
use crate::utils::{is_transient_status, retry_transient, RetryPolicy, Transient};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Embeddings API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Embeddings API returned no vectors")]
    Empty,
}

impl Transient for EmbeddingError {
    fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::NetworkError(_) => true,
            EmbeddingError::ApiError(status, _) => reqwest::StatusCode::from_u16(*status)
                .map(is_transient_status)
                .unwrap_or(false),
            _ => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct AzureEmbeddingClient {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl AzureEmbeddingClient {
    pub fn new(config: &AzureOpenAiConfig) -> Result<Self, EmbeddingError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EmbeddingError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            url: embeddings_url(config),
            api_key: config.api_key.clone(),
            retry: RetryPolicy::default(),
        })
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let this = self;
        retry_transient("openai.embeddings", &self.retry, || async move {
            let response = this
                .http_client
                .post(&this.url)
                .header("api-key", &this.api_key)
                .json(&EmbeddingRequest { input: text })
                .send()
                .await
                .map_err(|e| EmbeddingError::NetworkError(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(EmbeddingError::ApiError(status.as_u16(), error_text));
            }

            let body: EmbeddingResponse = response
                .json()
                .await
                .map_err(|e| EmbeddingError::ParseError(e.to_string()))?;

            body.data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .ok_or(EmbeddingError::Empty)
        })
        .await
    }
}

fn embeddings_url(config: &AzureOpenAiConfig) -> String {
    format!(
        "{}/openai/deployments/{}/embeddings?api-version={}",
        config.endpoint.trim_end_matches('/'),
        config.embeddings_deployment,
        config.api_version
    )
}

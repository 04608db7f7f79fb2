//! Compliance rule retrieval
//!
//! `RuleRetriever` is the stable interface over the rule knowledge base.
//! `AzureSearchRetriever` embeds the query and runs a vector search against
//! the Azure AI Search index populated by the offline ingestion job.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use super::embedding_client::{AzureEmbeddingClient, EmbeddingError};
use crate::config::AzureSearchConfig;
use crate::utils::{is_transient_status, retry_transient, RetryPolicy, Transient};

/// Index field holding the passage text
const CONTENT_FIELD: &str = "content";
/// Index field holding the passage embedding
const VECTOR_FIELD: &str = "content_vector";

/// A rule passage returned by the knowledge base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePassage {
    pub text: String,
}

impl RulePassage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Error)]
pub enum RetrieverError {
    #[error("Query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Search API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl Transient for RetrieverError {
    fn is_transient(&self) -> bool {
        match self {
            RetrieverError::NetworkError(_) => true,
            RetrieverError::ApiError(status, _) => reqwest::StatusCode::from_u16(*status)
                .map(is_transient_status)
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Knowledge-base search capability
#[async_trait]
pub trait RuleRetriever: Send + Sync {
    /// Top `k` passages, most relevant first
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RulePassage>, RetrieverError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    value: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    content: Option<String>,
}

pub struct AzureSearchRetriever {
    http_client: reqwest::Client,
    embeddings: AzureEmbeddingClient,
    url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl AzureSearchRetriever {
    pub fn new(
        config: &AzureSearchConfig,
        embeddings: AzureEmbeddingClient,
    ) -> Result<Self, RetrieverError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RetrieverError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            embeddings,
            url: search_url(config),
            api_key: config.api_key.clone(),
            retry: RetryPolicy::default(),
        })
    }
}

fn search_url(config: &AzureSearchConfig) -> String {
    format!(
        "{}/indexes/{}/docs/search?api-version={}",
        config.endpoint.trim_end_matches('/'),
        config.index_name,
        config.api_version
    )
}

fn search_body(vector: &[f32], k: usize) -> serde_json::Value {
    json!({
        "select": CONTENT_FIELD,
        "top": k,
        "vectorQueries": [{
            "kind": "vector",
            "vector": vector,
            "k": k,
            "fields": VECTOR_FIELD,
        }],
    })
}

#[async_trait]
impl RuleRetriever for AzureSearchRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RulePassage>, RetrieverError> {
        let vector = self.embeddings.embed(query).await?;
        let body = search_body(&vector, k);
        let this = self;
        let body = &body;

        let response: SearchResponse =
            retry_transient("search.vector_query", &self.retry, || async move {
                let response = this
                    .http_client
                    .post(&this.url)
                    .header("api-key", &this.api_key)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| RetrieverError::NetworkError(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(RetrieverError::ApiError(status.as_u16(), error_text));
                }

                response
                    .json()
                    .await
                    .map_err(|e| RetrieverError::ParseError(e.to_string()))
            })
            .await?;

        let passages: Vec<RulePassage> = response
            .value
            .into_iter()
            .filter_map(|hit| hit.content)
            .map(RulePassage::new)
            .collect();

        tracing::debug!(k, returned = passages.len(), "Rule search complete");
        Ok(passages)
    }
}

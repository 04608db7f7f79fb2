//! Azure Video Indexer client
//!
//! Uploads staged media, polls until remote indexing finishes, and turns the
//! raw index document into transcript / OCR / metadata.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use super::video_extractor::ExtractedContent;
use crate::config::VideoIndexerConfig;
use crate::utils::{is_transient_status, retry_transient, RetryPolicy, Transient};

const VIDEO_INDEXER_BASE_URL: &str = "https://api.videoindexer.ai";
const USER_AGENT: &str = concat!("bg-audit/", env!("CARGO_PKG_VERSION"));

/// Video Indexer client errors
#[derive(Debug, Error)]
pub enum VideoIndexerError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Video Indexer API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Failed to read staged media: {0}")]
    Io(#[from] std::io::Error),

    #[error("Video Indexer processing failed for video {0}")]
    ProcessingFailed(String),

    #[error("Video Indexer processing timed out after {0} seconds")]
    Timeout(u64),
}

impl Transient for VideoIndexerError {
    fn is_transient(&self) -> bool {
        match self {
            VideoIndexerError::NetworkError(_) => true,
            VideoIndexerError::ApiError(status, _) => reqwest::StatusCode::from_u16(*status)
                .map(is_transient_status)
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Remote media-processing capability
#[async_trait]
pub trait VideoIndexer: Send + Sync {
    /// Upload a local file, returning the remote video id
    async fn upload(&self, local_path: &Path, video_name: &str) -> Result<String, VideoIndexerError>;

    /// Block until the remote index is ready, returning the raw index document
    async fn wait_for_processing(&self, remote_id: &str) -> Result<Value, VideoIndexerError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

/// Azure Video Indexer REST client
pub struct AzureVideoIndexerClient {
    http_client: reqwest::Client,
    base_url: String,
    config: VideoIndexerConfig,
    retry: RetryPolicy,
}

impl AzureVideoIndexerClient {
    pub fn new(config: VideoIndexerConfig) -> Result<Self, VideoIndexerError> {
        Self::with_base_url(config, VIDEO_INDEXER_BASE_URL)
    }

    pub fn with_base_url(
        config: VideoIndexerConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, VideoIndexerError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| VideoIndexerError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            config,
            retry: RetryPolicy::default(),
        })
    }

    fn account_url(&self) -> String {
        format!(
            "{}/{}/Accounts/{}",
            self.base_url, self.config.location, self.config.account_id
        )
    }

    /// Fetch a short-lived account access token
    async fn access_token(&self) -> Result<String, VideoIndexerError> {
        let url = format!(
            "{}/Auth/{}/Accounts/{}/AccessToken?allowEdit=true",
            self.base_url, self.config.location, self.config.account_id
        );
        let url = url.as_str();

        retry_transient("video_indexer.access_token", &self.retry, || async move {
            let response = self
                .http_client
                .get(url)
                .header("Ocp-Apim-Subscription-Key", &self.config.subscription_key)
                .send()
                .await
                .map_err(|e| VideoIndexerError::NetworkError(e.to_string()))?;

            let response = check_status(response).await?;
            response
                .json::<String>()
                .await
                .map_err(|e| VideoIndexerError::ParseError(e.to_string()))
        })
        .await
    }

    async fn fetch_index(&self, remote_id: &str, token: &str) -> Result<Value, VideoIndexerError> {
        let url = format!("{}/Videos/{}/Index", self.account_url(), remote_id);
        let url = url.as_str();

        retry_transient("video_indexer.index", &self.retry, || async move {
            let response = self
                .http_client
                .get(url)
                .query(&[("accessToken", token)])
                .send()
                .await
                .map_err(|e| VideoIndexerError::NetworkError(e.to_string()))?;

            let response = check_status(response).await?;
            response
                .json::<Value>()
                .await
                .map_err(|e| VideoIndexerError::ParseError(e.to_string()))
        })
        .await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, VideoIndexerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    Err(VideoIndexerError::ApiError(status.as_u16(), error_text))
}

#[async_trait]
impl VideoIndexer for AzureVideoIndexerClient {
    async fn upload(&self, local_path: &Path, video_name: &str) -> Result<String, VideoIndexerError> {
        let token = self.access_token().await?;
        let bytes = tokio::fs::read(local_path).await?;
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.mp4", video_name));

        tracing::info!(
            video_name,
            size_bytes = bytes.len(),
            "Uploading video to Video Indexer"
        );

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http_client
            .post(format!("{}/Videos", self.account_url()))
            .query(&[
                ("accessToken", token.as_str()),
                ("name", video_name),
                ("privacy", "Private"),
                ("indexingPreset", "Default"),
            ])
            .multipart(form)
            .send()
            .await
            .map_err(|e| VideoIndexerError::NetworkError(e.to_string()))?;

        let upload: UploadResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| VideoIndexerError::ParseError(e.to_string()))?;

        tracing::info!(remote_id = %upload.id, "Video uploaded to Video Indexer");
        Ok(upload.id)
    }

    async fn wait_for_processing(&self, remote_id: &str) -> Result<Value, VideoIndexerError> {
        let started = Instant::now();

        loop {
            // Tokens are short-lived; a long index can outlast one
            let token = self.access_token().await?;
            let index = self.fetch_index(remote_id, &token).await?;
            let state = index
                .get("state")
                .and_then(Value::as_str)
                .unwrap_or("Unknown");

            match state {
                "Processed" => {
                    tracing::info!(
                        remote_id,
                        elapsed_secs = started.elapsed().as_secs(),
                        "Video Indexer processing complete"
                    );
                    return Ok(index);
                }
                "Failed" | "Quarantined" => {
                    return Err(VideoIndexerError::ProcessingFailed(remote_id.to_string()));
                }
                _ => {}
            }

            if started.elapsed() >= self.config.timeout {
                return Err(VideoIndexerError::Timeout(self.config.timeout.as_secs()));
            }

            tracing::info!(remote_id, state, "Waiting for Video Indexer processing");
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

/// Pull transcript, OCR text and basic metadata out of a raw index document
///
/// Missing sections yield empty values rather than errors; the analysis
/// stage decides whether an empty transcript is fatal.
pub fn extract_insights(index: &Value) -> ExtractedContent {
    let insights = index
        .get("videos")
        .and_then(Value::as_array)
        .and_then(|videos| videos.first())
        .and_then(|video| video.get("insights"));

    let texts = |section: &str| -> Vec<String> {
        insights
            .and_then(|i| i.get(section))
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.get("text").and_then(Value::as_str))
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    let transcript = texts("transcript").join(" ");
    let on_screen_text = texts("ocr");

    let mut video_metadata = Map::new();
    if let Some(duration) = index
        .get("summarizedInsights")
        .and_then(|s| s.get("duration"))
        .and_then(|d| d.get("seconds"))
    {
        video_metadata.insert("duration".to_string(), duration.clone());
    }
    video_metadata.insert("platform".to_string(), Value::String("youtube".to_string()));

    ExtractedContent {
        video_metadata,
        transcript,
        on_screen_text,
    }
}

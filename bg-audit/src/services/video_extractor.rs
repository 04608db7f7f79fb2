//! Video content extraction capability
//!
//! `VideoExtractor` is the narrow interface the extraction stage consumes:
//! video reference in, transcript / on-screen text / metadata out.
//! `VideoIndexerExtractor` implements it on top of a downloader and the
//! Video Indexer client.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use super::media_downloader::{DownloadError, MediaDownloader};
use super::video_indexer::{extract_insights, VideoIndexer, VideoIndexerError};

/// Content pulled out of a video
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    pub video_metadata: Map<String, Value>,
    pub transcript: String,
    pub on_screen_text: Vec<String>,
}

/// Extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Failed to stage temporary media: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Video Indexer error: {0}")]
    Indexer(#[from] VideoIndexerError),
}

/// Turns a video reference into extracted content
#[async_trait]
pub trait VideoExtractor: Send + Sync {
    async fn extract(
        &self,
        video_url: &str,
        video_id: &str,
    ) -> Result<ExtractedContent, ExtractionError>;
}

/// Download → upload → poll → insight extraction
pub struct VideoIndexerExtractor {
    downloader: Arc<dyn MediaDownloader>,
    indexer: Arc<dyn VideoIndexer>,
}

impl VideoIndexerExtractor {
    pub fn new(downloader: Arc<dyn MediaDownloader>, indexer: Arc<dyn VideoIndexer>) -> Self {
        Self {
            downloader,
            indexer,
        }
    }

    /// Download and upload while the staging directory is alive
    ///
    /// The directory (and the media inside it) is removed when `staging`
    /// drops at the end of this function, on success and on every error.
    async fn stage_and_upload(
        &self,
        video_url: &str,
        video_id: &str,
    ) -> Result<String, ExtractionError> {
        let staging = tempfile::Builder::new()
            .prefix("bg-audit-")
            .tempdir()
            .map_err(ExtractionError::Staging)?;

        let local_path = self.downloader.download(video_url, staging.path()).await?;
        let remote_id = self.indexer.upload(&local_path, video_id).await?;

        tracing::debug!(
            video_id,
            staging = %staging.path().display(),
            "Releasing staged media"
        );
        Ok(remote_id)
    }
}

#[async_trait]
impl VideoExtractor for VideoIndexerExtractor {
    async fn extract(
        &self,
        video_url: &str,
        video_id: &str,
    ) -> Result<ExtractedContent, ExtractionError> {
        let remote_id = self.stage_and_upload(video_url, video_id).await?;

        let index = self.indexer.wait_for_processing(&remote_id).await?;
        let content = extract_insights(&index);

        tracing::info!(
            video_id,
            remote_id = %remote_id,
            transcript_chars = content.transcript.len(),
            ocr_lines = content.on_screen_text.len(),
            "Extraction completed"
        );

        Ok(content)
    }
}

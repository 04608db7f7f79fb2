//! Extraction stage
//!
//! Validates the video reference, delegates extraction to the
//! `VideoExtractor` capability and converts the outcome into a partial
//! state update. Never fails across its boundary.

use async_trait::async_trait;
use std::sync::Arc;

use super::{Stage, StageError};
use crate::models::{AuditState, StateUpdate};
use crate::services::VideoExtractor;

/// Hosts accepted as video sources
const SUPPORTED_HOSTS: &[&str] = &["youtube.com", "youtu.be"];

/// True if `video_url` is an http(s) URL on a supported video host
///
/// Subdomains (www., m., music.) of a supported host are accepted.
pub fn is_supported_source(video_url: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(video_url.trim()) else {
        return false;
    };
    if url.scheme() != "https" && url.scheme() != "http" {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    SUPPORTED_HOSTS
        .iter()
        .any(|supported| host == *supported || host.ends_with(&format!(".{}", supported)))
}

pub struct ExtractionStage {
    extractor: Arc<dyn VideoExtractor>,
}

impl ExtractionStage {
    pub fn new(extractor: Arc<dyn VideoExtractor>) -> Self {
        Self { extractor }
    }

    /// Failure-shaped update: error + FAIL, with content fields blanked
    fn failure(error: StageError) -> StateUpdate {
        StateUpdate {
            transcript: Some(String::new()),
            on_screen_text: Some(Vec::new()),
            ..error.into_update()
        }
    }
}

#[async_trait]
impl Stage for ExtractionStage {
    fn name(&self) -> &'static str {
        "extraction"
    }

    async fn run(&self, state: &AuditState) -> StateUpdate {
        let video_url = state.video_url();
        let video_id = state.video_id();

        tracing::info!(video_id, video_url, "Extraction stage: processing video");

        if !is_supported_source(video_url) {
            let error = StageError::UnsupportedSource(video_url.to_string());
            tracing::error!(video_id, kind = error.kind(), error = %error, "Extraction rejected");
            return Self::failure(error);
        }

        match self.extractor.extract(video_url, video_id).await {
            Ok(content) => {
                tracing::info!(
                    video_id,
                    transcript_chars = content.transcript.len(),
                    ocr_lines = content.on_screen_text.len(),
                    "Extraction stage complete"
                );
                StateUpdate {
                    video_metadata: Some(content.video_metadata),
                    transcript: Some(content.transcript),
                    on_screen_text: Some(content.on_screen_text),
                    ..Default::default()
                }
            }
            Err(e) => {
                let error = StageError::Extraction(e.to_string());
                tracing::error!(video_id, kind = error.kind(), error = %error, "Extraction failed");
                Self::failure(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditStatus;
    use crate::services::{ExtractedContent, ExtractionError, VideoIndexerError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeExtractor {
        result: fn() -> Result<ExtractedContent, ExtractionError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VideoExtractor for FakeExtractor {
        async fn extract(&self, _url: &str, _id: &str) -> Result<ExtractedContent, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn stage(result: fn() -> Result<ExtractedContent, ExtractionError>) -> (Arc<FakeExtractor>, ExtractionStage) {
        let fake = Arc::new(FakeExtractor {
            result,
            calls: AtomicUsize::new(0),
        });
        (fake.clone(), ExtractionStage::new(fake))
    }

    #[test]
    fn test_supported_sources() {
        assert!(is_supported_source("https://www.youtube.com/watch?v=abc"));
        assert!(is_supported_source("https://youtu.be/abc"));
        assert!(is_supported_source("http://m.youtube.com/watch?v=abc"));
        assert!(is_supported_source("  https://YOUTU.BE/abc  "));
    }

    #[test]
    fn test_unsupported_sources() {
        assert!(!is_supported_source("https://vimeo.com/123"));
        assert!(!is_supported_source("https://notyoutube.com/watch?v=abc"));
        assert!(!is_supported_source("https://evil.com/youtube.com/watch"));
        assert!(!is_supported_source("ftp://youtube.com/video"));
        assert!(!is_supported_source("not a url"));
        assert!(!is_supported_source(""));
    }

    #[tokio::test]
    async fn test_unsupported_source_never_calls_extractor() {
        let (fake, stage) = stage(|| Ok(ExtractedContent::default()));
        let state = AuditState::new("https://vimeo.com/123", "vid_1");

        let update = stage.run(&state).await;

        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
        assert_eq!(update.final_status, Some(AuditStatus::Fail));
        assert_eq!(update.errors.len(), 1);
        assert!(update.errors[0].contains("Unsupported video source"));
        assert_eq!(update.transcript.as_deref(), Some(""));
        assert_eq!(update.on_screen_text, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_success_update() {
        let (fake, stage) = stage(|| {
            Ok(ExtractedContent {
                transcript: "hello".to_string(),
                on_screen_text: vec!["SALE".to_string()],
                ..Default::default()
            })
        });
        let state = AuditState::new("https://youtu.be/abc", "vid_1");

        let update = stage.run(&state).await;

        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        assert_eq!(update.transcript.as_deref(), Some("hello"));
        assert_eq!(update.on_screen_text, Some(vec!["SALE".to_string()]));
        assert!(update.video_metadata.is_some());
        assert!(update.errors.is_empty());
        assert_eq!(update.final_status, None);
    }

    #[tokio::test]
    async fn test_capability_failure_is_captured() {
        let (_fake, stage) = stage(|| Err(ExtractionError::Indexer(VideoIndexerError::Timeout(1800))));
        let state = AuditState::new("https://youtu.be/abc", "vid_1");

        let update = stage.run(&state).await;

        assert_eq!(update.final_status, Some(AuditStatus::Fail));
        assert_eq!(update.errors.len(), 1);
        assert!(update.errors[0].contains("timed out"));
        assert_eq!(update.transcript.as_deref(), Some(""));
    }
}

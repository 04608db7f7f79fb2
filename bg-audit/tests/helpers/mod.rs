//! In-process fakes for the external capabilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bg_audit::services::{
    ExtractedContent, ExtractionError, ReasoningError, ReasoningModel, RetrieverError,
    RulePassage, RuleRetriever, VideoExtractor, VideoIndexerError,
};
use bg_audit::workflow::{AnalysisStage, AuditWorkflow, ExtractionStage};

pub const TRANSCRIPT: &str = "This herbal tea cures the flu in one day";

pub enum ExtractorBehaviour {
    Succeed,
    Fail,
    Panic,
}

pub struct FakeExtractor {
    behaviour: ExtractorBehaviour,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(behaviour: ExtractorBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl VideoExtractor for FakeExtractor {
    async fn extract(
        &self,
        _video_url: &str,
        _video_id: &str,
    ) -> Result<ExtractedContent, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            ExtractorBehaviour::Succeed => Ok(ExtractedContent {
                transcript: TRANSCRIPT.to_string(),
                on_screen_text: vec!["100% NATURAL".to_string()],
                ..Default::default()
            }),
            ExtractorBehaviour::Fail => Err(ExtractionError::Indexer(
                VideoIndexerError::ProcessingFailed("Failed".to_string()),
            )),
            ExtractorBehaviour::Panic => panic!("extractor exploded"),
        }
    }
}

pub struct FakeRetriever {
    pub calls: AtomicUsize,
}

impl FakeRetriever {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl RuleRetriever for FakeRetriever {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<RulePassage>, RetrieverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            RulePassage::new("Health claims require substantiation."),
            RulePassage::new("Sponsored content must be disclosed."),
        ]
        .into_iter()
        .take(k)
        .collect())
    }
}

pub struct FakeModel {
    reply: String,
    pub calls: AtomicUsize,
}

impl FakeModel {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ReasoningModel for FakeModel {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, ReasoningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

pub const TWO_ISSUES_REPLY: &str = r#"```json
{
  "compliance_results": [
    {"category": "Claim Validation", "severity": "CRITICAL", "description": "Claims to cure the flu"},
    {"category": "Disclosure", "severity": "WARNING", "description": "No sponsorship disclosure"}
  ],
  "status": "FAIL",
  "final_report": "Two violations found."
}
```"#;

pub const CLEAN_REPLY: &str =
    r#"{"compliance_results": [], "status": "PASS", "final_report": "No violations."}"#;

pub fn workflow(
    extractor: Arc<FakeExtractor>,
    retriever: Arc<FakeRetriever>,
    model: Arc<FakeModel>,
) -> AuditWorkflow {
    AuditWorkflow::new(
        ExtractionStage::new(extractor),
        AnalysisStage::new(retriever, model),
    )
}

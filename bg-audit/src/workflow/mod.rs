//! Audit workflow engine
//!
//! A fixed two-stage sequential pipeline:
//! - **Extraction**: video reference → transcript, on-screen text, metadata
//! - **Analysis**: extracted content + retrieved rules → compliance verdict
//!
//! # Architecture
//!
//! Stages read the current `AuditState` and return a `StateUpdate`; they
//! never fail across their boundary. Every failure is encoded into the
//! update (`errors` + `final_status = FAIL`). The engine applies the merge
//! rules after each stage and always runs both stages in order.

pub mod analysis;
pub mod engine;
pub mod extraction;
pub mod output_parser;
pub mod prompt;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AuditState, AuditStatus, StateUpdate};

pub use analysis::AnalysisStage;
pub use engine::{AuditResponse, AuditWorkflow};
pub use extraction::ExtractionStage;
pub use output_parser::{parse_audit_response, AuditVerdict, OutputParseError};

/// A single pipeline step
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name for logging
    fn name(&self) -> &'static str;

    /// Read the state and produce a partial update
    ///
    /// Must not panic or fail; failures become part of the update.
    async fn run(&self, state: &AuditState) -> StateUpdate;
}

/// Failure kinds a stage can record
///
/// The `Display` text is what ends up in the state's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// Video reference is not from a supported host
    #[error("Unsupported video source: {0}. Only YouTube videos are supported.")]
    UnsupportedSource(String),

    /// Download, upload, remote processing or timeout
    #[error("Video extraction failed: {0}")]
    Extraction(String),

    /// Knowledge-base search failed (non-fatal)
    #[error("Rule retrieval failed: {0}")]
    Retrieval(String),

    /// The reasoning model call itself failed
    #[error("Reasoning model invocation failed: {0}")]
    Invocation(String),

    /// The model answered, but not with usable structured output
    #[error("Structured output parse failed: {0}")]
    OutputParse(String),
}

impl StageError {
    /// Stable code for logs and diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::UnsupportedSource(_) => "UNSUPPORTED_SOURCE",
            StageError::Extraction(_) => "EXTRACTION_FAILED",
            StageError::Retrieval(_) => "RETRIEVAL_FAILED",
            StageError::Invocation(_) => "INVOCATION_FAILED",
            StageError::OutputParse(_) => "OUTPUT_PARSE_FAILED",
        }
    }

    /// Partial update recording this failure and a FAIL verdict
    pub fn into_update(self) -> StateUpdate {
        StateUpdate {
            errors: vec![self.to_string()],
            final_status: Some(AuditStatus::Fail),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_kind() {
        let err = StageError::UnsupportedSource("https://vimeo.com/1".to_string());
        assert_eq!(err.kind(), "UNSUPPORTED_SOURCE");
        assert!(err.to_string().contains("Unsupported video source"));
        assert!(err.to_string().contains("vimeo.com"));

        let err = StageError::OutputParse("trailing comma".to_string());
        assert_eq!(err.kind(), "OUTPUT_PARSE_FAILED");
        assert_ne!(
            err.to_string(),
            StageError::Invocation("trailing comma".to_string()).to_string()
        );
    }

    #[test]
    fn test_into_update() {
        let update = StageError::Invocation("quota".to_string()).into_update();
        assert_eq!(update.errors.len(), 1);
        assert_eq!(update.final_status, Some(AuditStatus::Fail));
        assert!(update.compliance_results.is_empty());
        assert!(update.transcript.is_none());
    }
}

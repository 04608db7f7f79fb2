//! Workflow engine
//!
//! Stateless: holds only its injected stages, so one instance is shared by
//! every request. Each run owns its own `AuditState`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::output_parser::MISSING_REPORT;
use super::Stage;
use crate::models::{AuditState, AuditStatus, ComplianceIssue};

/// Result returned to the caller of `run_audit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResponse {
    pub session_id: Uuid,
    pub video_id: String,
    pub status: AuditStatus,
    pub final_report: String,
    pub compliance_results: Vec<ComplianceIssue>,
    /// Failures recorded by any stage, in order
    pub errors: Vec<String>,
}

impl AuditResponse {
    pub fn from_state(session_id: Uuid, state: AuditState) -> Self {
        Self {
            session_id,
            video_id: state.video_id().to_string(),
            status: state.final_status(),
            final_report: state.final_report().unwrap_or(MISSING_REPORT).to_string(),
            compliance_results: state.compliance_results().to_vec(),
            errors: state.errors().to_vec(),
        }
    }
}

/// Short display id derived from the session id
pub fn derive_video_id(session_id: &Uuid) -> String {
    let id = session_id.simple().to_string();
    format!("vid_{}", &id[..8])
}

/// Extraction → Analysis, always both, always in that order
pub struct AuditWorkflow {
    extraction: Box<dyn Stage>,
    analysis: Box<dyn Stage>,
}

impl AuditWorkflow {
    pub fn new(extraction: impl Stage + 'static, analysis: impl Stage + 'static) -> Self {
        Self {
            extraction: Box::new(extraction),
            analysis: Box::new(analysis),
        }
    }

    /// Thread `initial` through both stages, merging after each
    pub async fn run(&self, initial: AuditState) -> AuditState {
        let mut state = initial;

        for stage in [&self.extraction, &self.analysis] {
            let update = stage.run(&state).await;

            tracing::debug!(
                video_id = state.video_id(),
                stage = stage.name(),
                fields = ?update
                    .touched_fields()
                    .iter()
                    .map(|f| f.name())
                    .collect::<Vec<_>>(),
                "Merging stage update"
            );

            state.apply(update);
        }

        tracing::info!(
            video_id = state.video_id(),
            status = %state.final_status(),
            issues = state.compliance_results().len(),
            errors = state.errors().len(),
            "Workflow complete"
        );

        state
    }

    /// Run a full audit for one video URL under a fresh session
    pub async fn run_audit(&self, video_url: &str) -> AuditResponse {
        let session_id = Uuid::new_v4();
        let video_id = derive_video_id(&session_id);

        tracing::info!(
            session_id = %session_id,
            video_id = %video_id,
            video_url,
            "Audit request received"
        );

        let final_state = self.run(AuditState::new(video_url, video_id)).await;
        AuditResponse::from_state(session_id, final_state)
    }
}

//! Analysis stage
//!
//! Guard → retrieval → prompt assembly → single model call →
//! structured-output recovery → projection into a partial update.

use async_trait::async_trait;
use std::sync::Arc;

use super::output_parser::parse_audit_response;
use super::prompt;
use super::{Stage, StageError};
use crate::config::DEFAULT_RULE_COUNT;
use crate::models::{AuditState, AuditStatus, StateUpdate};
use crate::services::{ReasoningModel, RuleRetriever};


/// Report written when there is nothing to audit
pub const SKIPPED_REPORT: &str =
    "Audit skipped because video processing failed (no transcript available for analysis).";

pub struct AnalysisStage {
    retriever: Arc<dyn RuleRetriever>,
    model: Arc<dyn ReasoningModel>,
    rule_count: usize,
}

impl AnalysisStage {
    pub fn new(retriever: Arc<dyn RuleRetriever>, model: Arc<dyn ReasoningModel>) -> Self {
        Self {
            retriever,
            model,
            rule_count: DEFAULT_RULE_COUNT,
        }
    }

    pub fn with_rule_count(mut self, rule_count: usize) -> Self {
        self.rule_count = rule_count;
        self
    }

    /// Retrieve rule context; failures degrade to an empty context
    async fn retrieve_rules(&self, state: &AuditState) -> String {
        let query = prompt::build_query(
            state.transcript().unwrap_or_default(),
            state.on_screen_text(),
        );

        match self.retriever.search(&query, self.rule_count).await {
            Ok(passages) => {
                if passages.is_empty() {
                    tracing::info!(
                        video_id = state.video_id(),
                        "No rules retrieved; auditing without rule context"
                    );
                } else {
                    tracing::info!(
                        video_id = state.video_id(),
                        rules = passages.len(),
                        "Retrieved compliance rules"
                    );
                }
                prompt::join_rules(&passages)
            }
            Err(e) => {
                let error = StageError::Retrieval(e.to_string());
                tracing::warn!(
                    video_id = state.video_id(),
                    kind = error.kind(),
                    error = %error,
                    "Rule retrieval failed; auditing without rule context"
                );
                String::new()
            }
        }
    }
}

#[async_trait]
impl Stage for AnalysisStage {
    fn name(&self) -> &'static str {
        "analysis"
    }

    async fn run(&self, state: &AuditState) -> StateUpdate {
        let video_id = state.video_id();

        if state.transcript_is_empty() {
            tracing::warn!(video_id, "No transcript available; skipping analysis");
            return StateUpdate {
                final_status: Some(AuditStatus::Fail),
                final_report: Some(SKIPPED_REPORT.to_string()),
                ..Default::default()
            };
        }

        tracing::info!(video_id, "Analysis stage: querying knowledge base and model");

        let rules = self.retrieve_rules(state).await;
        let system_instruction = prompt::system_instruction(&rules);
        let user_payload = prompt::user_payload(state);

        let response = match self.model.complete(&system_instruction, &user_payload).await {
            Ok(response) => response,
            Err(e) => {
                let error = StageError::Invocation(e.to_string());
                tracing::error!(video_id, kind = error.kind(), error = %error, "Model call failed");
                return error.into_update();
            }
        };

        let verdict = match parse_audit_response(&response) {
            Ok(verdict) => verdict,
            Err(e) => {
                let error = StageError::OutputParse(e.to_string());
                tracing::error!(video_id, kind = error.kind(), error = %error, "Model output unusable");
                tracing::debug!(video_id, raw_response = %response, "Raw model response");
                return error.into_update();
            }
        };

        if verdict.status == AuditStatus::Pass && !verdict.compliance_results.is_empty() {
            tracing::warn!(
                video_id,
                issues = verdict.compliance_results.len(),
                "Model returned PASS with compliance issues; keeping model output as-is"
            );
        }
        if verdict.status == AuditStatus::Unknown {
            tracing::warn!(video_id, "Model returned an unrecognised status");
        }

        tracing::info!(
            video_id,
            status = %verdict.status,
            issues = verdict.compliance_results.len(),
            "Analysis stage complete"
        );

        StateUpdate {
            compliance_results: verdict.compliance_results,
            final_status: Some(verdict.status),
            final_report: Some(verdict.final_report),
            ..Default::default()
        }
    }
}

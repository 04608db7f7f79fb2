//! Structured-output recovery for reasoning model responses
//!
//! The model is asked for bare JSON but may wrap it in a fenced code block
//! or surround it with prose. Recovery order:
//! 1. If a ``` fence is present, take the content between the first pair
//!    of fences, dropping an optional language tag right after the opening
//!    fence (`json\n{..}`, `json {..}` and `json{..}` all qualify)
//! 2. Otherwise take the whole trimmed response
//! 3. Parse as JSON; any failure is an `OutputParseError`, never a panic

use serde::Deserialize;
use thiserror::Error;

use crate::models::{AuditStatus, ComplianceIssue};

const FENCE: &str = "```";

/// Report used when the model omits `final_report`
pub const MISSING_REPORT: &str = "No report generated";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputParseError {
    #[error("unterminated code fence in model response")]
    UnterminatedFence,

    #[error("model response contained no JSON payload")]
    EmptyPayload,

    #[error("invalid JSON in model response: {0}")]
    InvalidJson(String),
}

/// Typed audit verdict recovered from the model output
#[derive(Debug, Clone, PartialEq)]
pub struct AuditVerdict {
    pub compliance_results: Vec<ComplianceIssue>,
    pub status: AuditStatus,
    pub final_report: String,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    compliance_results: Vec<ComplianceIssue>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    final_report: Option<String>,
}

/// Locate the JSON payload inside a free-form response
pub fn extract_payload(response: &str) -> Result<&str, OutputParseError> {
    let payload = match response.find(FENCE) {
        Some(open) => {
            let after_open = &response[open + FENCE.len()..];
            let close = after_open
                .find(FENCE)
                .ok_or(OutputParseError::UnterminatedFence)?;
            strip_language_tag(&after_open[..close])
        }
        None => response,
    };

    let payload = payload.trim();
    if payload.is_empty() {
        return Err(OutputParseError::EmptyPayload);
    }
    Ok(payload)
}

/// Drop a language tag such as `json` directly after the opening fence
///
/// The tag must be followed by whitespace or the start of a JSON object or
/// array; a bare word filling the whole block is left alone.
fn strip_language_tag(block: &str) -> &str {
    let tag_len = block
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(block.len());
    if tag_len == 0 {
        return block;
    }

    let rest = &block[tag_len..];
    match rest.chars().next() {
        Some(c) if c.is_whitespace() || c == '{' || c == '[' => rest,
        _ => block,
    }
}

/// Recover an `AuditVerdict` from the raw model response
///
/// Absent fields default: no issues, `FAIL`, placeholder report.
pub fn parse_audit_response(response: &str) -> Result<AuditVerdict, OutputParseError> {
    let payload = extract_payload(response)?;
    let raw: RawVerdict = serde_json::from_str(payload)
        .map_err(|e| OutputParseError::InvalidJson(e.to_string()))?;

    let status = match raw.status.as_deref() {
        Some(s) => AuditStatus::from_model(s),
        None => AuditStatus::Fail,
    };

    Ok(AuditVerdict {
        compliance_results: raw.compliance_results,
        status,
        final_report: raw
            .final_report
            .unwrap_or_else(|| MISSING_REPORT.to_string()),
    })
}

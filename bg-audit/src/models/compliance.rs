//! Compliance findings and audit verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall audit verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    /// No violations found
    Pass,
    /// Violations found, or the audit could not be completed
    Fail,
    /// No verdict has been written yet
    #[default]
    Unknown,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Pass => "PASS",
            AuditStatus::Fail => "FAIL",
            AuditStatus::Unknown => "UNKNOWN",
        }
    }

    /// Interpret a status string produced by the reasoning model
    ///
    /// Matching is case-insensitive. Anything other than PASS/FAIL maps to
    /// `Unknown` so the caller can tell the model went off-schema.
    pub fn from_model(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PASS" => AuditStatus::Pass,
            "FAIL" => AuditStatus::Fail,
            _ => AuditStatus::Unknown,
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a compliance issue
///
/// Severities outside the known set are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Other(s) => s,
        }
    }
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "WARNING" => Severity::Warning,
            "INFO" => Severity::Info,
            _ => Severity::Other(raw),
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single compliance violation found in the video content
///
/// Only built whole, by deserializing the model output or via `new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    category: String,
    severity: Severity,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

impl ComplianceIssue {
    pub fn new(
        category: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
        timestamp: Option<String>,
    ) -> Self {
        Self {
            category: category.into(),
            severity,
            description: description.into(),
            timestamp,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn severity(&self) -> &Severity {
        &self.severity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Position in the video the issue refers to, if the model gave one
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

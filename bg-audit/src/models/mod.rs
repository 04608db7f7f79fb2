//! Data models for bg-audit
//!
//! - Audit state record threaded through the workflow
//! - Partial state updates and their per-field merge rules
//! - Compliance findings produced by the analysis stage

pub mod audit_state;
pub mod compliance;

pub use audit_state::{AuditState, MergeRule, StateField, StateUpdate};
pub use compliance::{AuditStatus, ComplianceIssue, Severity};

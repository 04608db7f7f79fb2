//! Audit state record and partial-update merging
//!
//! The workflow threads one `AuditState` per request through its stages.
//! Stages never touch the record directly: each returns a sparse
//! `StateUpdate` which the engine folds in with `AuditState::apply`,
//! following the per-field rules in `StateField::merge_rule`.

use serde_json::{Map, Value};

use super::compliance::{AuditStatus, ComplianceIssue};

/// How a field combines an incoming value with the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// Set once at creation, never written by a stage
    Immutable,
    /// Last writer wins
    Replace,
    /// Incoming values are concatenated after the existing ones
    Append,
}

/// Fields of the audit state record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    VideoUrl,
    VideoId,
    VideoMetadata,
    Transcript,
    OnScreenText,
    ComplianceResults,
    Errors,
    FinalStatus,
    FinalReport,
}

impl StateField {
    pub const ALL: [StateField; 9] = [
        StateField::VideoUrl,
        StateField::VideoId,
        StateField::VideoMetadata,
        StateField::Transcript,
        StateField::OnScreenText,
        StateField::ComplianceResults,
        StateField::Errors,
        StateField::FinalStatus,
        StateField::FinalReport,
    ];

    pub fn merge_rule(self) -> MergeRule {
        match self {
            StateField::VideoUrl | StateField::VideoId => MergeRule::Immutable,
            StateField::ComplianceResults | StateField::Errors => MergeRule::Append,
            StateField::VideoMetadata
            | StateField::Transcript
            | StateField::OnScreenText
            | StateField::FinalStatus
            | StateField::FinalReport => MergeRule::Replace,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StateField::VideoUrl => "video_url",
            StateField::VideoId => "video_id",
            StateField::VideoMetadata => "video_metadata",
            StateField::Transcript => "transcript",
            StateField::OnScreenText => "on_screen_text",
            StateField::ComplianceResults => "compliance_results",
            StateField::Errors => "errors",
            StateField::FinalStatus => "final_status",
            StateField::FinalReport => "final_report",
        }
    }
}

/// Per-request audit state
///
/// Created with only the video reference populated. Read access is public;
/// the only way to change it is `apply`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditState {
    video_url: String,
    video_id: String,
    video_metadata: Map<String, Value>,
    transcript: Option<String>,
    on_screen_text: Vec<String>,
    compliance_results: Vec<ComplianceIssue>,
    errors: Vec<String>,
    final_status: AuditStatus,
    final_report: Option<String>,
}

impl AuditState {
    pub fn new(video_url: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
            video_id: video_id.into(),
            video_metadata: Map::new(),
            transcript: None,
            on_screen_text: Vec::new(),
            compliance_results: Vec::new(),
            errors: Vec::new(),
            final_status: AuditStatus::Unknown,
            final_report: None,
        }
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn video_metadata(&self) -> &Map<String, Value> {
        &self.video_metadata
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// True when there is no usable transcript to audit
    pub fn transcript_is_empty(&self) -> bool {
        self.transcript
            .as_deref()
            .map(|t| t.trim().is_empty())
            .unwrap_or(true)
    }

    pub fn on_screen_text(&self) -> &[String] {
        &self.on_screen_text
    }

    pub fn compliance_results(&self) -> &[ComplianceIssue] {
        &self.compliance_results
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn final_status(&self) -> AuditStatus {
        self.final_status
    }

    pub fn final_report(&self) -> Option<&str> {
        self.final_report.as_deref()
    }

    /// Fold a partial update into the state
    ///
    /// Append fields accumulate for the whole run; replace fields take the
    /// incoming value when the update carries one. Immutable fields are not
    /// representable in `StateUpdate` at all.
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            video_metadata,
            transcript,
            on_screen_text,
            compliance_results,
            errors,
            final_status,
            final_report,
        } = update;

        replace(&mut self.video_metadata, video_metadata);
        replace(&mut self.transcript, transcript.map(Some));
        replace(&mut self.on_screen_text, on_screen_text);
        append(&mut self.compliance_results, compliance_results);
        append(&mut self.errors, errors);
        replace(&mut self.final_status, final_status);
        replace(&mut self.final_report, final_report.map(Some));
    }

    /// Consuming form of `apply`
    pub fn merged(mut self, update: StateUpdate) -> Self {
        self.apply(update);
        self
    }
}

fn replace<T>(slot: &mut T, incoming: Option<T>) {
    if let Some(value) = incoming {
        *slot = value;
    }
}

fn append<T>(slot: &mut Vec<T>, incoming: Vec<T>) {
    slot.extend(incoming);
}

/// Sparse set of field writes returned by a stage
///
/// `None` / empty means "not touched".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub video_metadata: Option<Map<String, Value>>,
    pub transcript: Option<String>,
    pub on_screen_text: Option<Vec<String>>,
    pub compliance_results: Vec<ComplianceIssue>,
    pub errors: Vec<String>,
    pub final_status: Option<AuditStatus>,
    pub final_report: Option<String>,
}

impl StateUpdate {
    pub fn is_empty(&self) -> bool {
        self.touched_fields().is_empty()
    }

    /// Fields this update writes, in declaration order
    pub fn touched_fields(&self) -> Vec<StateField> {
        StateField::ALL
            .into_iter()
            .filter(|field| match field {
                StateField::VideoUrl | StateField::VideoId => false,
                StateField::VideoMetadata => self.video_metadata.is_some(),
                StateField::Transcript => self.transcript.is_some(),
                StateField::OnScreenText => self.on_screen_text.is_some(),
                StateField::ComplianceResults => !self.compliance_results.is_empty(),
                StateField::Errors => !self.errors.is_empty(),
                StateField::FinalStatus => self.final_status.is_some(),
                StateField::FinalReport => self.final_report.is_some(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use serde_json::json;

    fn issue(category: &str) -> ComplianceIssue {
        ComplianceIssue::new(category, Severity::Warning, "desc", None)
    }

    #[test]
    fn test_new_state_is_blank() {
        let state = AuditState::new("https://youtu.be/abc", "vid_1234");
        assert_eq!(state.video_url(), "https://youtu.be/abc");
        assert_eq!(state.video_id(), "vid_1234");
        assert!(state.transcript_is_empty());
        assert!(state.errors().is_empty());
        assert!(state.compliance_results().is_empty());
        assert_eq!(state.final_status(), AuditStatus::Unknown);
        assert_eq!(state.final_report(), None);
    }

    #[test]
    fn test_empty_update_is_identity() {
        let mut state = AuditState::new("u", "id");
        state.apply(StateUpdate {
            transcript: Some("hello".to_string()),
            errors: vec!["e1".to_string()],
            ..Default::default()
        });
        let before = state.clone();

        state.apply(StateUpdate::default());
        state.apply(StateUpdate::default());

        assert_eq!(state, before);
        assert!(StateUpdate::default().is_empty());
    }

    #[test]
    fn test_append_fields_concatenate_in_order() {
        let updates = vec![
            StateUpdate {
                errors: vec!["a".to_string()],
                compliance_results: vec![issue("c1")],
                ..Default::default()
            },
            StateUpdate {
                errors: vec!["b".to_string(), "c".to_string()],
                ..Default::default()
            },
            StateUpdate {
                compliance_results: vec![issue("c2"), issue("c3")],
                ..Default::default()
            },
        ];

        let state = updates
            .into_iter()
            .fold(AuditState::new("u", "id"), AuditState::merged);

        assert_eq!(state.errors(), ["a", "b", "c"]);
        let categories: Vec<&str> = state
            .compliance_results()
            .iter()
            .map(|i| i.category())
            .collect();
        assert_eq!(categories, ["c1", "c2", "c3"]);
    }

    #[test]
    fn test_replace_fields_take_last_writer() {
        let mut state = AuditState::new("u", "id");
        state.apply(StateUpdate {
            video_metadata: Some(json!({"duration": 10}).as_object().unwrap().clone()),
            transcript: Some("first".to_string()),
            on_screen_text: Some(vec!["one".to_string()]),
            final_status: Some(AuditStatus::Fail),
            final_report: Some("r1".to_string()),
            ..Default::default()
        });
        state.apply(StateUpdate {
            video_metadata: Some(json!({"platform": "youtube"}).as_object().unwrap().clone()),
            transcript: Some("second".to_string()),
            final_status: Some(AuditStatus::Pass),
            ..Default::default()
        });

        assert_eq!(state.transcript(), Some("second"));
        assert!(state.video_metadata().get("duration").is_none());
        assert_eq!(state.video_metadata()["platform"], "youtube");
        // untouched by the second update
        assert_eq!(state.on_screen_text(), ["one"]);
        assert_eq!(state.final_report(), Some("r1"));
        assert_eq!(state.final_status(), AuditStatus::Pass);
    }

    #[test]
    fn test_identity_fields_survive_updates() {
        let mut state = AuditState::new("https://youtu.be/x", "vid_x");
        state.apply(StateUpdate {
            transcript: Some(String::new()),
            errors: vec!["boom".to_string()],
            final_status: Some(AuditStatus::Fail),
            ..Default::default()
        });
        assert_eq!(state.video_url(), "https://youtu.be/x");
        assert_eq!(state.video_id(), "vid_x");
    }

    #[test]
    fn test_merge_rule_table() {
        let append: Vec<&str> = StateField::ALL
            .into_iter()
            .filter(|f| f.merge_rule() == MergeRule::Append)
            .map(StateField::name)
            .collect();
        assert_eq!(append, ["compliance_results", "errors"]);

        assert_eq!(StateField::VideoUrl.merge_rule(), MergeRule::Immutable);
        assert_eq!(StateField::VideoId.merge_rule(), MergeRule::Immutable);
        assert_eq!(StateField::FinalReport.merge_rule(), MergeRule::Replace);
    }

    #[test]
    fn test_touched_fields() {
        let update = StateUpdate {
            transcript: Some(String::new()),
            on_screen_text: Some(Vec::new()),
            errors: vec!["x".to_string()],
            final_status: Some(AuditStatus::Fail),
            ..Default::default()
        };
        assert_eq!(
            update.touched_fields(),
            vec![
                StateField::Transcript,
                StateField::OnScreenText,
                StateField::Errors,
                StateField::FinalStatus
            ]
        );
    }
}

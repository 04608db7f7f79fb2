//! Prompt assembly for the compliance analysis call

use crate::models::AuditState;
use crate::services::RulePassage;

/// Separator between retrieved rule passages
const RULE_SEPARATOR: &str = "\n\n";

/// Placeholder used when retrieval produced nothing
const NO_RULES: &str = "(No rules were retrieved from the knowledge base. \
Apply general advertising-standards principles and say so in the report.)";

/// Exact output shape the model must produce
pub const OUTPUT_SCHEMA: &str = r#"{
  "compliance_results": [
    {
      "category": "Claim Validation",
      "severity": "CRITICAL",
      "description": "Explanation of the violation..."
    }
  ],
  "status": "FAIL",
  "final_report": "Summary of findings..."
}"#;

/// Retrieval query: transcript followed by the joined on-screen text
pub fn build_query(transcript: &str, on_screen_text: &[String]) -> String {
    if on_screen_text.is_empty() {
        return transcript.to_string();
    }
    format!("{} {}", transcript, on_screen_text.join(" "))
}

/// Join rule passages into the context block
pub fn join_rules(passages: &[RulePassage]) -> String {
    passages
        .iter()
        .map(|p| p.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(RULE_SEPARATOR)
}

/// System instruction: role, retrieved rules, task, output schema
pub fn system_instruction(rules: &str) -> String {
    let rules = if rules.trim().is_empty() { NO_RULES } else { rules };
    format!(
        "You are a senior brand compliance auditor.\n\
         \n\
         OFFICIAL REGULATORY RULES:\n\
         {rules}\n\
         \n\
         INSTRUCTIONS:\n\
         1. Analyze the transcript and on-screen (OCR) text below.\n\
         2. Identify any violations of the rules.\n\
         3. Return strictly JSON in the following format:\n\
         {schema}\n\
         \n\
         If no violations are found, set \"status\" to \"PASS\" and \
         \"compliance_results\" to [].",
        rules = rules,
        schema = OUTPUT_SCHEMA,
    )
}

/// User payload: metadata, transcript and on-screen text
pub fn user_payload(state: &AuditState) -> String {
    let metadata = serde_json::to_string(state.video_metadata()).unwrap_or_else(|_| "{}".to_string());
    let on_screen = serde_json::to_string(state.on_screen_text()).unwrap_or_else(|_| "[]".to_string());
    format!(
        "VIDEO_METADATA: {}\nTRANSCRIPT: {}\nON_SCREEN_TEXT (OCR): {}",
        metadata,
        state.transcript().unwrap_or_default(),
        on_screen
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StateUpdate;

    #[test]
    fn test_build_query() {
        assert_eq!(build_query("hello", &[]), "hello");
        let ocr = vec!["SALE".to_string(), "50% off".to_string()];
        assert_eq!(build_query("hello", &ocr), "hello SALE 50% off");
    }

    #[test]
    fn test_join_rules() {
        let passages = vec![
            RulePassage::new("Rule one."),
            RulePassage::new("  "),
            RulePassage::new("Rule two.\n"),
        ];
        assert_eq!(join_rules(&passages), "Rule one.\n\nRule two.");
        assert_eq!(join_rules(&[]), "");
    }

    #[test]
    fn test_system_instruction_contains_rules_and_schema() {
        let prompt = system_instruction("No health claims.");
        assert!(prompt.contains("No health claims."));
        assert!(prompt.contains("\"compliance_results\""));
        assert!(prompt.contains("\"final_report\""));
        assert!(prompt.contains("PASS"));
    }

    #[test]
    fn test_system_instruction_without_rules() {
        let prompt = system_instruction("");
        assert!(prompt.contains("No rules were retrieved"));
    }

    #[test]
    fn test_user_payload() {
        let state = AuditState::new("u", "id").merged(StateUpdate {
            transcript: Some("Buy our tea".to_string()),
            on_screen_text: Some(vec!["Cures colds".to_string()]),
            ..Default::default()
        });
        let payload = user_payload(&state);
        assert!(payload.contains("TRANSCRIPT: Buy our tea"));
        assert!(payload.contains("[\"Cures colds\"]"));
        assert!(payload.contains("VIDEO_METADATA: {}"));
    }
}

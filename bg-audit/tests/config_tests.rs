//! Configuration resolution tests
//!
//! Uses serial_test: every test here mutates process environment variables.

use serial_test::serial;
use std::io::Write;
use std::time::Duration;

use bg_audit::config::{
    AuditServiceConfig, DEFAULT_OPENAI_API_VERSION, DEFAULT_PORT, DEFAULT_RULE_COUNT,
};
use bg_common::config::{load_toml_config, TomlConfig};

const REQUIRED_VARS: &[&str] = &[
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_CHAT_DEPLOYMENT",
    "AZURE_OPENAI_EMBEDDING_DEPLOYMENT",
    "AZURE_SEARCH_ENDPOINT",
    "AZURE_SEARCH_API_KEY",
    "AZURE_SEARCH_INDEX_NAME",
    "AZURE_VI_ACCOUNT_ID",
    "AZURE_VI_LOCATION",
    "AZURE_VI_API_KEY",
];

const OPTIONAL_VARS: &[&str] = &[
    "AZURE_OPENAI_API_VERSION",
    "AZURE_SEARCH_API_VERSION",
    "BG_YT_DLP_PATH",
    "APPLICATIONINSIGHTS_CONNECTION_STRING",
];

fn clear_env() {
    for var in REQUIRED_VARS.iter().chain(OPTIONAL_VARS) {
        std::env::remove_var(var);
    }
}

fn set_required_env() {
    for var in REQUIRED_VARS {
        std::env::set_var(var, format!("env-{}", var.to_lowercase()));
    }
}

#[test]
#[serial]
fn test_all_required_from_env() {
    clear_env();
    set_required_env();

    let config = AuditServiceConfig::resolve(&TomlConfig::default()).unwrap();

    assert_eq!(config.openai.endpoint, "env-azure_openai_endpoint");
    assert_eq!(config.search.index_name, "env-azure_search_index_name");
    assert_eq!(config.video_indexer.location, "env-azure_vi_location");
    assert_eq!(config.openai.api_version, DEFAULT_OPENAI_API_VERSION);
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.search.top_k, DEFAULT_RULE_COUNT);
    assert_eq!(config.yt_dlp_path, "yt-dlp");
    assert_eq!(config.video_indexer.poll_interval, Duration::from_secs(30));
    assert_eq!(config.video_indexer.timeout, Duration::from_secs(1800));
    assert!(config.telemetry_connection_string.is_none());

    clear_env();
}

#[test]
#[serial]
fn test_missing_values_listed_together() {
    clear_env();
    set_required_env();
    std::env::remove_var("AZURE_SEARCH_API_KEY");
    std::env::set_var("AZURE_VI_API_KEY", "   ");

    let err = AuditServiceConfig::resolve(&TomlConfig::default()).unwrap_err();
    let message = err.to_string();

    assert!(matches!(err, bg_common::Error::Config(_)));
    assert!(message.contains("AZURE_SEARCH_API_KEY"));
    assert!(message.contains("AZURE_VI_API_KEY"));
    assert!(!message.contains("AZURE_OPENAI_ENDPOINT"));

    clear_env();
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    let file_content = r#"
port = 9100

[azure_openai]
endpoint = "https://toml.openai.azure.com"
api_key = "toml-key"
chat_deployment = "gpt-4o"
embeddings_deployment = "text-embedding-3-small"

[azure_search]
endpoint = "https://toml.search.windows.net"
api_key = "toml-search-key"
index_name = "brand-rules"
top_k = 5

[video_indexer]
account_id = "acct"
location = "trial"
subscription_key = "vi-key"
poll_interval_secs = 5
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(file_content.as_bytes()).unwrap();
    let toml = load_toml_config(Some(file.path()), "bg-audit").unwrap();

    std::env::set_var("AZURE_OPENAI_API_KEY", "env-key");

    let config = AuditServiceConfig::resolve(&toml).unwrap();

    assert_eq!(config.openai.api_key, "env-key");
    assert_eq!(config.openai.endpoint, "https://toml.openai.azure.com");
    assert_eq!(config.search.index_name, "brand-rules");
    assert_eq!(config.search.top_k, 5);
    assert_eq!(config.port, 9100);
    assert_eq!(config.video_indexer.poll_interval, Duration::from_secs(5));

    clear_env();
}

#[test]
#[serial]
fn test_telemetry_connection_string_optional() {
    clear_env();
    set_required_env();
    std::env::set_var("APPLICATIONINSIGHTS_CONNECTION_STRING", "InstrumentationKey=abc");

    let config = AuditServiceConfig::resolve(&TomlConfig::default()).unwrap();
    assert_eq!(
        config.telemetry_connection_string.as_deref(),
        Some("InstrumentationKey=abc")
    );
    config.report_telemetry();

    clear_env();
}

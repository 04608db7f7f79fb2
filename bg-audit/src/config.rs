//! Configuration resolution for bg-audit
//!
//! Every external endpoint, credential and index name is resolved once at
//! startup with ENV → TOML priority. Any missing required value is a fatal
//! `Error::Config`; the service refuses to start rather than run degraded.

use bg_common::config::{resolve_setting, TomlConfig};
use bg_common::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_OPENAI_API_VERSION: &str = "2024-02-01";
pub const DEFAULT_SEARCH_API_VERSION: &str = "2023-11-01";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_INDEXING_TIMEOUT_SECS: u64 = 30 * 60;
pub const DEFAULT_YT_DLP_PATH: &str = "yt-dlp";
pub const DEFAULT_RULE_COUNT: usize = 3;

/// Azure OpenAI connection settings (chat + embeddings)
#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub chat_deployment: String,
    pub embeddings_deployment: String,
}

/// Azure AI Search connection settings
#[derive(Debug, Clone)]
pub struct AzureSearchConfig {
    pub endpoint: String,
    pub api_key: String,
    pub index_name: String,
    pub api_version: String,
    pub top_k: usize,
}

/// Azure Video Indexer account settings
#[derive(Debug, Clone)]
pub struct VideoIndexerConfig {
    pub account_id: String,
    pub location: String,
    pub subscription_key: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct AuditServiceConfig {
    pub port: u16,
    pub openai: AzureOpenAiConfig,
    pub search: AzureSearchConfig,
    pub video_indexer: VideoIndexerConfig,
    pub yt_dlp_path: String,
    pub telemetry_connection_string: Option<String>,
}

/// Collects required settings, remembering every one that is missing
struct Required<'a> {
    missing: Vec<&'a str>,
}

impl<'a> Required<'a> {
    fn new() -> Self {
        Self { missing: Vec::new() }
    }

    fn get(&mut self, env_var: &'a str, toml_value: Option<&String>) -> String {
        match resolve_setting(env_var, toml_value) {
            Some(value) => value,
            None => {
                self.missing.push(env_var);
                String::new()
            }
        }
    }

    fn finish(self) -> Result<()> {
        if self.missing.is_empty() {
            return Ok(());
        }
        Err(Error::Config(format!(
            "Missing required configuration: {}. Set the environment variables \
             or the matching keys in the bg-audit TOML config file.",
            self.missing.join(", ")
        )))
    }
}

impl AuditServiceConfig {
    /// Resolve the service configuration from environment and TOML
    pub fn resolve(toml: &TomlConfig) -> Result<Self> {
        let mut required = Required::new();

        let openai = AzureOpenAiConfig {
            endpoint: required.get("AZURE_OPENAI_ENDPOINT", toml.azure_openai.endpoint.as_ref()),
            api_key: required.get("AZURE_OPENAI_API_KEY", toml.azure_openai.api_key.as_ref()),
            api_version: resolve_setting(
                "AZURE_OPENAI_API_VERSION",
                toml.azure_openai.api_version.as_ref(),
            )
            .unwrap_or_else(|| DEFAULT_OPENAI_API_VERSION.to_string()),
            chat_deployment: required.get(
                "AZURE_OPENAI_CHAT_DEPLOYMENT",
                toml.azure_openai.chat_deployment.as_ref(),
            ),
            embeddings_deployment: required.get(
                "AZURE_OPENAI_EMBEDDING_DEPLOYMENT",
                toml.azure_openai.embeddings_deployment.as_ref(),
            ),
        };

        let search = AzureSearchConfig {
            endpoint: required.get("AZURE_SEARCH_ENDPOINT", toml.azure_search.endpoint.as_ref()),
            api_key: required.get("AZURE_SEARCH_API_KEY", toml.azure_search.api_key.as_ref()),
            index_name: required.get(
                "AZURE_SEARCH_INDEX_NAME",
                toml.azure_search.index_name.as_ref(),
            ),
            api_version: resolve_setting(
                "AZURE_SEARCH_API_VERSION",
                toml.azure_search.api_version.as_ref(),
            )
            .unwrap_or_else(|| DEFAULT_SEARCH_API_VERSION.to_string()),
            top_k: toml
                .azure_search
                .top_k
                .filter(|k| *k > 0)
                .unwrap_or(DEFAULT_RULE_COUNT),
        };

        let video_indexer = VideoIndexerConfig {
            account_id: required.get("AZURE_VI_ACCOUNT_ID", toml.video_indexer.account_id.as_ref()),
            location: required.get("AZURE_VI_LOCATION", toml.video_indexer.location.as_ref()),
            subscription_key: required.get(
                "AZURE_VI_API_KEY",
                toml.video_indexer.subscription_key.as_ref(),
            ),
            poll_interval: Duration::from_secs(
                toml.video_indexer
                    .poll_interval_secs
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            timeout: Duration::from_secs(
                toml.video_indexer
                    .timeout_secs
                    .unwrap_or(DEFAULT_INDEXING_TIMEOUT_SECS),
            ),
        };

        required.finish()?;

        let yt_dlp_path = resolve_setting("BG_YT_DLP_PATH", toml.downloader.yt_dlp_path.as_ref())
            .unwrap_or_else(|| DEFAULT_YT_DLP_PATH.to_string());

        let telemetry_connection_string = resolve_setting(
            "APPLICATIONINSIGHTS_CONNECTION_STRING",
            toml.telemetry_connection_string.as_ref(),
        );

        let config = Self {
            port: toml.port.unwrap_or(DEFAULT_PORT),
            openai,
            search,
            video_indexer,
            yt_dlp_path,
            telemetry_connection_string,
        };

        info!(
            openai_endpoint = %config.openai.endpoint,
            chat_deployment = %config.openai.chat_deployment,
            search_endpoint = %config.search.endpoint,
            index_name = %config.search.index_name,
            video_indexer_location = %config.video_indexer.location,
            "Service configuration resolved"
        );

        Ok(config)
    }

    /// Log whether telemetry export would be enabled
    ///
    /// Export itself is handled outside this service.
    pub fn report_telemetry(&self) {
        match &self.telemetry_connection_string {
            Some(_) => info!("Telemetry connection string found; request tracing enabled"),
            None => warn!("No telemetry connection string found. Telemetry is DISABLED."),
        }
    }
}

//! Bootstrap configuration loading and setting resolution
//!
//! Settings are resolved with the following priority:
//! 1. Command-line argument (handled by each binary via clap)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Built-in default (where one exists)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional here; required values are enforced by the
/// service that consumes them, after environment overrides are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Azure OpenAI (chat + embeddings)
    #[serde(default)]
    pub azure_openai: AzureOpenAiSection,

    /// Azure AI Search (rule knowledge base)
    #[serde(default)]
    pub azure_search: AzureSearchSection,

    /// Azure Video Indexer (transcript + OCR extraction)
    #[serde(default)]
    pub video_indexer: VideoIndexerSection,

    /// Local media downloader
    #[serde(default)]
    pub downloader: DownloaderSection,

    /// Application Insights connection string
    #[serde(default)]
    pub telemetry_connection_string: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level for the service's own targets ("info", "debug", ...),
    /// or a complete filter directive such as "info,bg_audit=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// Tracing filter directive for `targets`
    ///
    /// A bare level is applied to each target. A value that already
    /// contains a directive (`=` or `,`) is used unchanged.
    pub fn filter_directive(&self, targets: &[&str]) -> String {
        let level = self.level.trim();
        if level.contains('=') || level.contains(',') {
            return level.to_string();
        }
        targets
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AzureOpenAiSection {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub chat_deployment: Option<String>,
    pub embeddings_deployment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AzureSearchSection {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub index_name: Option<String>,
    pub api_version: Option<String>,
    /// Rule passages retrieved per audit
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoIndexerSection {
    pub account_id: Option<String>,
    pub location: Option<String>,
    pub subscription_key: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloaderSection {
    pub yt_dlp_path: Option<String>,
}

/// Default config file location for a module
///
/// `~/.config/brand-guardian/<module>.toml` on Linux, the platform config
/// directory elsewhere. Falls back to the working directory.
pub fn default_config_path(module_name: &str) -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("brand-guardian"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(format!("{}.toml", module_name))
}

/// Load TOML bootstrap configuration
///
/// An explicitly requested file must exist. When no path is given the
/// module's default location is tried and a missing file yields defaults.
pub fn load_toml_config(explicit: Option<&Path>, module_name: &str) -> Result<TomlConfig> {
    let (path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path(module_name), false),
    };

    if !path.exists() {
        if required {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        debug!("No config file at {}, using environment only", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Validate a setting value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Resolve a string setting: environment variable first, then TOML
///
/// Blank values are treated as absent at every tier.
pub fn resolve_setting(env_var: &str, toml_value: Option<&String>) -> Option<String> {
    if let Ok(value) = std::env::var(env_var) {
        if is_valid_value(&value) {
            debug!(env_var, "Setting loaded from environment variable");
            return Some(value.trim().to_string());
        }
    }

    toml_value
        .filter(|v| is_valid_value(v))
        .map(|v| v.trim().to_string())
}

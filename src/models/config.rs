//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Endpoint and HTTP client settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Pagination and pacing behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Output settings
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("api.service_url", &self.api.service_url),
            ("api.web_host", &self.api.web_host),
            ("api.blob_host", &self.api.blob_host),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::validation(format!("{name} is not a URL: {e}")))?;
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.fetch.page_cap == 0 || self.fetch.page_cap > 100 {
            return Err(AppError::validation(
                "fetch.page_cap must be within 1..=100",
            ));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(AppError::validation("fetch.max_concurrent must be > 0"));
        }
        if !self.fetch.list_collection.ends_with(".graph.list") {
            return Err(AppError::validation(
                "fetch.list_collection must name a *.graph.list collection",
            ));
        }
        if self.export.output_dir.trim().is_empty() {
            return Err(AppError::validation("export.output_dir is empty"));
        }
        Ok(())
    }
}

/// XRPC endpoint and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the XRPC service (PDS or AppView)
    #[serde(default = "defaults::service_url")]
    pub service_url: String,

    /// Public web host used to build post links
    #[serde(default = "defaults::web_host")]
    pub web_host: String,

    /// Host serving `com.atproto.sync.getBlob` for image links
    #[serde(default = "defaults::blob_host")]
    pub blob_host: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service_url: defaults::service_url(),
            web_host: defaults::web_host(),
            blob_host: defaults::blob_host(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Pagination and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum items requested per API call
    #[serde(default = "defaults::page_cap")]
    pub page_cap: usize,

    /// Delay between consecutive calls in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Posts per target when the caller gives no limit
    #[serde(default = "defaults::default_limit")]
    pub default_limit: usize,

    /// Maximum list members fetched at the same time
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Record collection of curated lists
    #[serde(default = "defaults::list_collection")]
    pub list_collection: String,

    /// Upper bound on members read from one list
    #[serde(default = "defaults::max_list_members")]
    pub max_list_members: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_cap: defaults::page_cap(),
            request_delay_ms: defaults::request_delay(),
            default_limit: defaults::default_limit(),
            max_concurrent: defaults::max_concurrent(),
            list_collection: defaults::list_collection(),
            max_list_members: defaults::max_list_members(),
        }
    }
}

/// Output file format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Author-grouped JSON object
    Json,
    /// One flattened record per line
    Jsonl,
    /// Flattened rows with JSON-encoded list columns
    #[default]
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "jsonl" | "ndjson" => Ok(ExportFormat::Jsonl),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(AppError::config(format!(
                "Unsupported export format '{other}' (available: json, jsonl, csv)"
            ))),
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving exported files
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,

    #[serde(default)]
    pub format: ExportFormat,

    /// Sort flattened exports newest first
    #[serde(default = "defaults::sort_by_date")]
    pub sort_by_date: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            format: ExportFormat::default(),
            sort_by_date: defaults::sort_by_date(),
        }
    }
}

mod defaults {
    // Api defaults
    pub fn service_url() -> String {
        "https://bsky.social".into()
    }
    pub fn web_host() -> String {
        "https://bsky.app".into()
    }
    pub fn blob_host() -> String {
        "https://bsky.social".into()
    }
    pub fn user_agent() -> String {
        concat!("skyfetch/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Fetch defaults
    pub fn page_cap() -> usize {
        100
    }
    pub fn request_delay() -> u64 {
        500
    }
    pub fn default_limit() -> usize {
        20
    }
    pub fn max_concurrent() -> usize {
        1
    }
    pub fn list_collection() -> String {
        "app.bsky.graph.list".into()
    }
    pub fn max_list_members() -> usize {
        1000
    }

    // Export defaults
    pub fn output_dir() -> String {
        "data".into()
    }
    pub fn sort_by_date() -> bool {
        true
    }
}

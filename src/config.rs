//! Configuration module for oarss.

use serde::Deserialize;
use std::path::Path;

use crate::{OarssError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared secret for the management API (`?k=`). Empty leaves the API open.
    #[serde(default)]
    pub token: String,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            token: String::new(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/oarss.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Feed publishing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RssConfig {
    /// Public base URL used when building feed links.
    #[serde(default = "default_rss_host")]
    pub host: String,
    /// Secret for opaque feed identifiers. Empty falls back to a built-in key.
    #[serde(default)]
    pub secret: String,
    /// Publish opaque identifiers instead of real channel identifiers.
    #[serde(default)]
    pub enc_feed_id: bool,
    /// Maximum items in a single-channel feed (0 = built-in default).
    #[serde(default)]
    pub max_item_count: usize,
    /// Maximum items in the aggregate feed (0 = use `max_item_count`, then built-in default).
    #[serde(default)]
    pub all_max_item_count: usize,
}

fn default_rss_host() -> String {
    "http://localhost:8080".to_string()
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            host: default_rss_host(),
            secret: String::new(),
            enc_feed_id: false,
            max_item_count: 0,
            all_max_item_count: 0,
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Trigger times of day as `HH:MM`.
    #[serde(default = "default_scheduler_times")]
    pub times: Vec<String>,
    /// IANA timezone the trigger times are evaluated in.
    #[serde(default = "default_scheduler_timezone")]
    pub timezone: String,
    /// Pause between channels during a full sync, in milliseconds.
    #[serde(default = "default_channel_pause_ms")]
    pub channel_pause_ms: u64,
}

fn default_scheduler_times() -> Vec<String> {
    vec!["07:00".to_string(), "12:00".to_string(), "20:00".to_string()]
}

fn default_scheduler_timezone() -> String {
    "UTC".to_string()
}

fn default_channel_pause_ms() -> u64 {
    500
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            times: default_scheduler_times(),
            timezone: default_scheduler_timezone(),
            channel_pause_ms: default_channel_pause_ms(),
        }
    }
}

/// Content provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the article listing API.
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    /// Session cookie sent when fetching article pages.
    #[serde(default)]
    pub cookie: String,
    /// Articles requested per channel sync.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_upstream_base_url() -> String {
    "https://wechat2rss.xlab.app".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            cookie: String::new(),
            page_size: default_page_size(),
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/oarss.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Feed publishing configuration.
    #[serde(default)]
    pub rss: RssConfig,
    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Content provider configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(OarssError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| OarssError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `OARSS_TOKEN`: management API token
    /// - `OARSS_SECRET`: feed identifier secret
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("OARSS_TOKEN") {
            if !token.is_empty() {
                self.server.token = token;
            }
        }
        if let Ok(secret) = std::env::var("OARSS_SECRET") {
            if !secret.is_empty() {
                self.rss.secret = secret;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let host = url::Url::parse(&self.rss.host)
            .map_err(|e| OarssError::Config(format!("rss.host is not a valid URL: {e}")))?;
        if host.scheme() != "http" && host.scheme() != "https" {
            return Err(OarssError::Config(
                "rss.host must use http or https".to_string(),
            ));
        }

        if self.scheduler.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(OarssError::Config(format!(
                "unknown scheduler.timezone: {}",
                self.scheduler.timezone
            )));
        }

        if self.upstream.page_size == 0 || self.upstream.page_size > 100 {
            return Err(OarssError::Config(
                "upstream.page_size must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }

    /// Public base URL without a trailing slash.
    pub fn public_host(&self) -> &str {
        self.rss.host.trim_end_matches('/')
    }
}

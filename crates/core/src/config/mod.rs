//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LISTAFEED_*)
//! 2. TOML config file (if LISTAFEED_CONFIG_FILE set)
//! 3. Built-in defaults

use std::str::FromStr;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::{NS_CONTENT, NS_IMAGES, NS_PROPERTIES};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LISTAFEED_*)
/// 2. TOML config file (if LISTAFEED_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the feed file server (its directory index).
    ///
    /// Set via LISTAFEED_FEED_BASE_URL. Required by the ingestion binary.
    #[serde(default)]
    pub feed_base_url: Option<String>,

    /// Optional basic-auth username for the feed server.
    #[serde(default)]
    pub feed_username: Option<String>,

    /// Optional basic-auth password for the feed server.
    #[serde(default)]
    pub feed_password: Option<String>,

    /// Base URL of the secondary per-property lookup API.
    ///
    /// Set via LISTAFEED_PARTNER_BASE_URL. The on-demand read path skips
    /// the partner lookup when unset.
    #[serde(default)]
    pub partner_base_url: Option<String>,

    /// Bearer token for the partner API.
    #[serde(default)]
    pub partner_api_token: Option<String>,

    /// User-Agent string for outbound HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for every transport operation, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Five-field cron expression driving the scheduled refresh (UTC).
    #[serde(default = "default_refresh_cron")]
    pub refresh_cron: String,

    /// Default TTL for the `properties` cache namespace, in seconds.
    #[serde(default = "default_properties_ttl")]
    pub properties_ttl_secs: u64,

    /// Default TTL for the `images` cache namespace, in seconds.
    #[serde(default = "default_images_ttl")]
    pub images_ttl_secs: u64,

    /// Default TTL for the `content` cache namespace, in seconds.
    #[serde(default = "default_content_ttl")]
    pub content_ttl_secs: u64,
}

fn default_user_agent() -> String {
    "listafeed/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_refresh_cron() -> String {
    // Once daily, 05:15 UTC.
    "15 5 * * *".into()
}

fn default_properties_ttl() -> u64 {
    1800
}

fn default_images_ttl() -> u64 {
    3600
}

fn default_content_ttl() -> u64 {
    1800
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_base_url: None,
            feed_username: None,
            feed_password: None,
            partner_base_url: None,
            partner_api_token: None,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            refresh_cron: default_refresh_cron(),
            properties_ttl_secs: default_properties_ttl(),
            images_ttl_secs: default_images_ttl(),
            content_ttl_secs: default_content_ttl(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The cache namespaces this deployment runs with, paired with their
    /// default TTLs.
    pub fn cache_namespaces(&self) -> Vec<(&'static str, Duration)> {
        vec![
            (NS_PROPERTIES, Duration::from_secs(self.properties_ttl_secs)),
            (NS_IMAGES, Duration::from_secs(self.images_ttl_secs)),
            (NS_CONTENT, Duration::from_secs(self.content_ttl_secs)),
        ]
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LISTAFEED_`
    /// 2. TOML file from `LISTAFEED_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LISTAFEED_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LISTAFEED_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check that a feed endpoint is configured (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the feed base URL is not set.
    pub fn require_feed_base_url(&self) -> Result<&str, ConfigError> {
        self.feed_base_url.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "feed_base_url".into(),
            hint: "Set LISTAFEED_FEED_BASE_URL environment variable".into(),
        })
    }
}

/// Parse a standard five-field cron expression into a schedule.
///
/// The underlying parser wants a seconds column; it is pinned to zero so
/// operators configure plain `minute hour day month weekday` expressions.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` when the expression does not have five
/// fields or does not parse.
pub fn parse_refresh_cron(expr: &str) -> Result<cron::Schedule, ConfigError> {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() != 5 {
        return Err(ConfigError::Invalid {
            field: "refresh_cron".into(),
            reason: "expected five fields: minute hour day month weekday".into(),
        });
    }
    cron::Schedule::from_str(&format!("0 {trimmed}"))
        .map_err(|e| ConfigError::Invalid { field: "refresh_cron".into(), reason: e.to_string() })
}

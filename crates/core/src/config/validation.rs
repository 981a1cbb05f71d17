//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, parse_refresh_cron};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `refresh_cron` is not a valid five-field expression
    /// - any namespace TTL is zero
    /// - a configured base URL is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        parse_refresh_cron(&self.refresh_cron)?;

        for (field, ttl) in [
            ("properties_ttl_secs", self.properties_ttl_secs),
            ("images_ttl_secs", self.images_ttl_secs),
            ("content_ttl_secs", self.content_ttl_secs),
        ] {
            if ttl == 0 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 1 second".into() });
            }
        }

        for (field, value) in [
            ("feed_base_url", &self.feed_base_url),
            ("partner_base_url", &self.partner_base_url),
        ] {
            if let Some(url) = value
                && url.trim().is_empty()
            {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be blank".into() });
            }
        }

        if self.partner_base_url.is_some() && self.partner_api_token.is_none() {
            tracing::warn!("partner_base_url is set without partner_api_token; partner lookups will be unauthenticated");
        }

        Ok(())
    }
}

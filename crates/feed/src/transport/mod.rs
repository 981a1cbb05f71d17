//! Feed file retrieval from the remote listing host.
//!
//! The feed host exposes a JSON directory index at its base URL and the
//! feed files themselves next to it. Each operation opens its own
//! short-lived connection: open, operate, close. The drop point publishes
//! on a schedule and is not reliably reachable between windows. Retries
//! are a caller decision, not made here.

mod listing;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header};
use url::Url;

pub use listing::parse_listing;

/// Errors from the feed transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Feed endpoint URL could not be parsed or joined.
    #[error("invalid feed URL: {0}")]
    InvalidUrl(String),

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(Arc<reqwest::Error>),

    /// Credentials rejected by the feed host.
    #[error("authentication rejected: status {status}")]
    Auth { status: u16 },

    /// Operation exceeded the configured timeout.
    #[error("timeout")]
    Timeout,

    /// The directory index contained no feed files.
    #[error("no feeds available")]
    NoFeedsAvailable,

    /// The named feed file no longer exists on the host.
    #[error("feed no longer exists: {0}")]
    Missing(String),

    /// Transfer started but did not complete.
    #[error("transfer interrupted: {0}")]
    Interrupted(Arc<reqwest::Error>),

    /// Directory index bytes did not match the expected shape.
    #[error("malformed feed listing: {0}")]
    Listing(String),

    /// Any other non-success HTTP response.
    #[error("HTTP error: status {status}")]
    Http { status: u16 },
}

impl TransportError {
    fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() { Self::Timeout } else { Self::Connect(Arc::new(err)) }
    }

    fn from_body(err: reqwest::Error) -> Self {
        if err.is_timeout() { Self::Timeout } else { Self::Interrupted(Arc::new(err)) }
    }
}

/// One entry of the remote directory index.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub name: String,
    pub modified_at: DateTime<Utc>,
    pub size: Option<u64>,
}

/// Configuration for the feed transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Directory index URL; feed files are resolved relative to it.
    pub base_url: Url,
    /// Optional basic-auth credentials.
    pub username: Option<String>,
    pub password: Option<String>,
    /// User agent string.
    pub user_agent: String,
    /// Timeout applied to every operation.
    pub timeout: Duration,
}

impl TransportConfig {
    /// Build a config from parts, normalizing the base URL so relative
    /// file names resolve inside the index directory.
    pub fn from_parts(
        base_url: &str, username: Option<String>, password: Option<String>, user_agent: &str, timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut base = base_url.trim().to_owned();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        Ok(Self { base_url, username, password, user_agent: user_agent.to_owned(), timeout })
    }
}

/// Anything that can produce the latest feed file.
///
/// The scheduler and the on-demand read path depend on this seam rather
/// than on the concrete HTTP transport.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<(FeedEntry, Bytes), TransportError>;
}

/// HTTP transport for the feed drop point.
pub struct FeedTransport {
    config: TransportConfig,
}

impl FeedTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// One client per operation; idle connections are not kept.
    fn client(&self) -> Result<Client, TransportError> {
        Client::builder()
            .user_agent(&self.config.user_agent)
            .timeout(self.config.timeout)
            .use_rustls_tls()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| TransportError::Connect(Arc::new(e)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_deref()),
            None => request,
        }
    }

    /// Enumerate the feed files visible on the host, most recent first.
    ///
    /// Entries share their modification timestamp ordering; ties resolve
    /// to the lexically greater name, so publisher sequence numbers win.
    ///
    /// # Errors
    ///
    /// `TransportError::NoFeedsAvailable` when the index holds no files;
    /// `Auth`/`Timeout`/`Connect`/`Listing` per their documentation.
    pub async fn list_available_feeds(&self) -> Result<Vec<FeedEntry>, TransportError> {
        let client = self.client()?;
        let request = self
            .authorize(client.get(self.config.base_url.clone()))
            .header(header::ACCEPT, "application/json");

        let response = request.send().await.map_err(TransportError::from_request)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransportError::Auth { status: status.as_u16() });
        }
        if !status.is_success() {
            return Err(TransportError::Http { status: status.as_u16() });
        }

        let bytes = response.bytes().await.map_err(TransportError::from_body)?;
        let entries = parse_listing(&bytes)?;
        if entries.is_empty() {
            return Err(TransportError::NoFeedsAvailable);
        }

        tracing::debug!(count = entries.len(), newest = %entries[0].name, "listed feed directory");
        Ok(entries)
    }

    /// Retrieve one feed file by name.
    ///
    /// # Errors
    ///
    /// `TransportError::Missing` when the file vanished between listing
    /// and fetch; `Auth`/`Timeout`/`Connect`/`Interrupted` otherwise.
    pub async fn fetch_feed(&self, name: &str) -> Result<Bytes, TransportError> {
        let url = self
            .config
            .base_url
            .join(name)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let client = self.client()?;
        let response = self
            .authorize(client.get(url))
            .send()
            .await
            .map_err(TransportError::from_request)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::Missing(name.to_owned()));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransportError::Auth { status: status.as_u16() });
        }
        if !status.is_success() {
            return Err(TransportError::Http { status: status.as_u16() });
        }

        let bytes = response.bytes().await.map_err(TransportError::from_body)?;
        tracing::debug!(name, bytes = bytes.len(), "fetched feed file");
        Ok(bytes)
    }
}

#[async_trait]
impl FeedSource for FeedTransport {
    /// List, pick the most recent entry, fetch it.
    async fn fetch_latest(&self) -> Result<(FeedEntry, Bytes), TransportError> {
        let entries = self.list_available_feeds().await?;
        let latest = entries.into_iter().next().ok_or(TransportError::NoFeedsAvailable)?;
        let bytes = self.fetch_feed(&latest.name).await?;
        Ok((latest, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> TransportConfig {
        TransportConfig::from_parts(base, None, None, "listafeed/test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_from_parts_appends_trailing_slash() {
        let cfg = config("https://feeds.example.com/drop");
        assert_eq!(cfg.base_url.as_str(), "https://feeds.example.com/drop/");
        assert_eq!(cfg.base_url.join("latest.xml").unwrap().as_str(), "https://feeds.example.com/drop/latest.xml");
    }

    #[test]
    fn test_from_parts_rejects_garbage() {
        let result = TransportConfig::from_parts("not a url", None, None, "ua", Duration::from_secs(5));
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(TransportError::NoFeedsAvailable.to_string(), "no feeds available");
        assert_eq!(TransportError::Timeout.to_string(), "timeout");
        assert!(TransportError::Missing("a.xml".into()).to_string().contains("a.xml"));
    }
}

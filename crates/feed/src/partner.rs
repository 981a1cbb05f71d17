//! Secondary per-property lookup API client.
//!
//! Used by the on-demand read path when a listing is not present in the
//! cached feed collection. The partner exposes a plain authenticated JSON
//! endpoint per property; payloads use the same vocabulary as feed
//! records and go through the same normalization rules. Token acquisition
//! happens outside this process; the bearer token is configuration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use url::Url;

use crate::model::Property;
use crate::parser::normalize_record;
use crate::transport::TransportError;

/// Default request timeout for partner lookups.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Partner API client configuration.
#[derive(Debug, Clone)]
pub struct PartnerConfig {
    /// Base URL; property lookups go to `{base}/properties/{id}`.
    pub base_url: Url,
    /// Bearer token, if the deployment has one provisioned.
    pub api_token: Option<String>,
    /// User agent string.
    pub user_agent: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
}

impl PartnerConfig {
    pub fn from_parts(base_url: &str, api_token: Option<String>, user_agent: &str) -> Result<Self, TransportError> {
        let mut base = base_url.trim().trim_end_matches('/').to_owned();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        Ok(Self { base_url, api_token, user_agent: user_agent.to_owned(), timeout: DEFAULT_TIMEOUT })
    }
}

/// Anything that can resolve a single listing by identifier.
#[async_trait]
pub trait PropertyLookup: Send + Sync {
    /// `Ok(None)` when the partner does not know the identifier.
    async fn lookup(&self, id: &str) -> Result<Option<Property>, TransportError>;
}

/// HTTP client for the partner lookup API.
pub struct PartnerClient {
    http: reqwest::Client,
    config: PartnerConfig,
}

impl PartnerClient {
    pub fn new(config: PartnerConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| TransportError::Connect(Arc::new(e)))?;
        Ok(Self { http, config })
    }

    fn lookup_url(&self, id: &str) -> Result<Url, TransportError> {
        self.config
            .base_url
            .join(&format!("properties/{id}"))
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl PropertyLookup for PartnerClient {
    async fn lookup(&self, id: &str) -> Result<Option<Property>, TransportError> {
        let mut request = self
            .http
            .get(self.lookup_url(id)?)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() { TransportError::Timeout } else { TransportError::Connect(Arc::new(e)) }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransportError::Auth { status: status.as_u16() });
        }
        if !status.is_success() {
            return Err(TransportError::Http { status: status.as_u16() });
        }

        let record: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() { TransportError::Timeout } else { TransportError::Interrupted(Arc::new(e)) }
        })?;

        match normalize_record(&record) {
            Ok(property) => Ok(Some(property)),
            Err(err) => {
                tracing::warn!(id, %err, "partner record did not normalize");
                Ok(None)
            }
        }
    }
}

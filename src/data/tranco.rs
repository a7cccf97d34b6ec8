//! Tranco ranking API client
//!
//! Fetches the raw rank history for one domain from a Tranco-compatible
//! endpoint (`{base}/{domain}`). The body is returned as untyped JSON because
//! the provider is loose about field types; validation happens in the
//! refresher.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, RankingConfig};

/// Errors that can occur when fetching a rank series
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The client is missing its base URL
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Transport failure or timeout
    #[error("Request to ranking provider failed for {domain}: {source}")]
    Request {
        domain: String,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success status
    #[error("Failed to fetch data from ranking provider: ({status}) for {domain} {message}")]
    Status {
        domain: String,
        status: u16,
        message: String,
    },

    /// The body was not JSON
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl ProviderError {
    /// HTTP status of the failed response, if the provider answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            ProviderError::Request { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Source of raw rank time series, one domain at a time
#[async_trait]
pub trait RankProvider: Send + Sync {
    /// Fetches the provider's JSON document for `domain`
    ///
    /// The document is expected to look like `{"ranks": [{"date", "rank"}...]}`
    /// but is returned unvalidated.
    async fn fetch_series(&self, domain: &str) -> Result<Value, ProviderError>;
}

/// Client for a Tranco-style ranking API
#[derive(Debug, Clone)]
pub struct TrancoClient {
    http_client: Client,
    base_url: Option<String>,
}

impl TrancoClient {
    /// Creates a client from the resolved configuration
    ///
    /// A missing base URL is not an error here; it surfaces as
    /// `ConfigError::MissingProviderUrl` on the first fetch so that domains
    /// already in the cache can still be served.
    pub fn new(config: &RankingConfig) -> Result<Self, ProviderError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ProviderError::ClientBuild)?;
        Ok(Self {
            http_client,
            base_url: config.provider_base_url.clone(),
        })
    }

    /// Builds the request URL for a domain
    fn series_url(&self, domain: &str) -> Result<String, ConfigError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(ConfigError::MissingProviderUrl)?;
        Ok(format!("{}/{}", base, urlencoded(domain)))
    }
}

#[async_trait]
impl RankProvider for TrancoClient {
    async fn fetch_series(&self, domain: &str) -> Result<Value, ProviderError> {
        let url = self.series_url(domain)?;
        debug!(%domain, %url, "fetching rank series");

        let request_failed = |source: reqwest::Error| ProviderError::Request {
            domain: domain.to_string(),
            source,
        };

        let response = self
            .http_client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                domain: domain.to_string(),
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let text = response.text().await.map_err(request_failed)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Percent-encodes a domain for use as a single path segment
///
/// Leaves the same characters unescaped as JavaScript's `encodeURIComponent`.
fn urlencoded(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

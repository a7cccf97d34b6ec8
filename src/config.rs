//! Resolved configuration for the ranking cache
//!
//! `RankingConfig` is built once at startup and handed to the ranking service
//! and the provider client. Nothing in the library reads the environment.

use std::time::Duration as StdDuration;

use chrono::Duration;
use reqwest::Url;
use thiserror::Error;

/// Default cache TTL in hours
pub const DEFAULT_TTL_HOURS: f64 = 24.0;

/// Default bound on a single provider request
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors caused by missing or malformed configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// No provider base URL was configured
    #[error("TRANCO_API_BASE_URL is not set")]
    MissingProviderUrl,

    /// The provider base URL could not be parsed as an http(s) URL
    #[error("Invalid provider base URL: '{0}'")]
    InvalidProviderUrl(String),

    /// The TTL is negative or not a finite number
    #[error("Invalid cache TTL: {0} hours")]
    InvalidTtl(f64),
}

/// Configuration for freshness and provider access
#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Maximum age of a domain's last refresh before it is considered stale
    pub ttl: Duration,
    /// Base endpoint of the ranking provider, without trailing slash
    pub provider_base_url: Option<String>,
    /// Timeout applied to each provider request
    pub request_timeout: StdDuration,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(DEFAULT_TTL_HOURS as i64),
            provider_base_url: None,
            request_timeout: StdDuration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RankingConfig {
    /// Sets the TTL from a (possibly fractional) number of hours
    pub fn with_ttl_hours(mut self, hours: f64) -> Result<Self, ConfigError> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(ConfigError::InvalidTtl(hours));
        }
        self.ttl = Duration::milliseconds((hours * 3_600_000.0).round() as i64);
        Ok(self)
    }

    /// Sets the provider base URL after checking that it is an http(s) URL
    pub fn with_provider_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        match Url::parse(trimmed) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                self.provider_base_url = Some(trimmed.to_string());
                Ok(self)
            }
            _ => Err(ConfigError::InvalidProviderUrl(url)),
        }
    }

    pub fn with_request_timeout(mut self, timeout: StdDuration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the provider base URL, or `MissingProviderUrl` when unset
    pub fn provider_base_url(&self) -> Result<&str, ConfigError> {
        self.provider_base_url
            .as_deref()
            .ok_or(ConfigError::MissingProviderUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RankingConfig::default();
        assert_eq!(config.ttl, Duration::hours(24));
        assert!(config.provider_base_url.is_none());
        assert_eq!(config.request_timeout, StdDuration::from_secs(10));
    }

    #[test]
    fn test_missing_provider_url_is_config_error() {
        let config = RankingConfig::default();
        assert_eq!(
            config.provider_base_url(),
            Err(ConfigError::MissingProviderUrl)
        );
    }

    #[test]
    fn test_with_ttl_hours_accepts_fractions() {
        let config = RankingConfig::default().with_ttl_hours(1.5).unwrap();
        assert_eq!(config.ttl, Duration::minutes(90));
    }

    #[test]
    fn test_with_ttl_hours_rejects_negative_and_nan() {
        assert!(RankingConfig::default().with_ttl_hours(-1.0).is_err());
        assert!(RankingConfig::default().with_ttl_hours(f64::NAN).is_err());
        assert!(RankingConfig::default().with_ttl_hours(f64::INFINITY).is_err());
    }

    #[test]
    fn test_with_provider_url_trims_trailing_slash() {
        let config = RankingConfig::default()
            .with_provider_url("https://tranco-list.eu/api/ranks/domain/")
            .unwrap();
        assert_eq!(
            config.provider_base_url(),
            Ok("https://tranco-list.eu/api/ranks/domain")
        );
    }

    #[test]
    fn test_with_provider_url_rejects_garbage() {
        let result = RankingConfig::default().with_provider_url("not a url");
        assert!(matches!(result, Err(ConfigError::InvalidProviderUrl(_))));

        let result = RankingConfig::default().with_provider_url("ftp://example.com");
        assert!(matches!(result, Err(ConfigError::InvalidProviderUrl(_))));
    }
}

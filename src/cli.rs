//! Command-line interface parsing for rankwatch
//!
//! This module handles parsing of CLI arguments using clap, with environment
//! variable fallbacks, and turns them into the `RankingConfig` handed to the
//! library.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::config::{ConfigError, RankingConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_TTL_HOURS};
use crate::data::normalize_domains;
use crate::sparkline::DEFAULT_WIDTH;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The domain list contained no usable entries
    #[error("No domains given. Pass a comma-separated list such as 'example.com,example.org'")]
    NoDomains,

    /// A configuration value was rejected
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// rankwatch - Domain popularity rank history with a local cache
#[derive(Parser, Debug)]
#[command(name = "rankwatch")]
#[command(about = "Domain popularity rank history, cached locally and refreshed from a ranking provider")]
#[command(version)]
pub struct Cli {
    /// Comma-separated list of domains
    ///
    /// Examples:
    ///   rankwatch example.com
    ///   rankwatch "example.com, example.org"
    #[arg(value_name = "DOMAINS")]
    pub domains: String,

    /// Hours a domain's cached history is served before it is refreshed
    #[arg(long, env = "CACHE_TTL_HOURS", default_value_t = DEFAULT_TTL_HOURS)]
    pub ttl_hours: f64,

    /// Base URL of the ranking provider; the domain is appended as a path segment
    #[arg(long, env = "TRANCO_API_BASE_URL")]
    pub provider_url: Option<String>,

    /// Directory holding the cached rank documents
    #[arg(long, env = "RANKWATCH_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Timeout for each provider request, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Print one sparkline per domain instead of JSON
    #[arg(long)]
    pub sparkline: bool,

    /// Number of points drawn per sparkline
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: usize,
}

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Sparkline { width: usize },
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Raw domain list, validated to contain at least one domain
    pub domains: String,
    pub ranking: RankingConfig,
    /// Custom cache directory, or `None` for the XDG default
    pub cache_dir: Option<PathBuf>,
    pub output: OutputFormat,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the resolved ranking configuration
    /// * `Err(CliError)` if the domain list is empty or a value is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if normalize_domains(&cli.domains).is_empty() {
            return Err(CliError::NoDomains);
        }

        let mut ranking = RankingConfig::default()
            .with_ttl_hours(cli.ttl_hours)?
            .with_request_timeout(Duration::from_secs(cli.timeout_secs));
        // An empty variable counts as unset
        if let Some(url) = cli.provider_url.as_deref().filter(|u| !u.trim().is_empty()) {
            ranking = ranking.with_provider_url(url)?;
        }

        let output = if cli.sparkline {
            OutputFormat::Sparkline { width: cli.width }
        } else {
            OutputFormat::Json
        };

        Ok(StartupConfig {
            domains: cli.domains.clone(),
            ranking,
            cache_dir: cli.cache_dir.clone(),
            output,
        })
    }
}

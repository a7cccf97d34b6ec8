//! Provider refresh for a single domain
//!
//! Fetches the provider's rank history, keeps the entries that carry a valid
//! date and a positive integer rank, and upserts them in one batch. A payload
//! with nothing usable never touches storage, so a transient empty response
//! cannot erase history.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{RankStore, StorageError};
use crate::config::ConfigError;
use crate::data::{ProviderError, RankEntry, RankProvider};

/// Errors that abort a refresh
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Required configuration is missing
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The provider could not be reached or answered with an error
    #[error("{message}")]
    Provider {
        status: Option<u16>,
        message: String,
    },

    /// The validated batch could not be committed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The refresh task panicked or was cancelled
    #[error("Refresh task aborted: {0}")]
    Aborted(String),
}

impl From<ProviderError> for RefreshError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Config(config) => RefreshError::Config(config),
            other => RefreshError::Provider {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

/// Counts from one successful refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Candidate entries in the provider payload
    pub received: usize,
    /// Entries written to storage
    pub stored: usize,
    /// Malformed entries that were discarded
    pub dropped: usize,
}

/// Fetches, validates and stores rank history for one domain at a time
#[derive(Clone)]
pub struct Refresher {
    provider: Arc<dyn RankProvider>,
    store: Arc<dyn RankStore>,
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher").finish_non_exhaustive()
    }
}

impl Refresher {
    pub fn new(provider: Arc<dyn RankProvider>, store: Arc<dyn RankStore>) -> Self {
        Self { provider, store }
    }

    /// Refreshes `domain` from the provider
    ///
    /// # Returns
    /// * `Ok(RefreshSummary)` - the batch committed, or there was nothing valid to commit
    /// * `Err(RefreshError)` - configuration, provider or storage failure; stored rows are unchanged
    pub async fn refresh(&self, domain: &str) -> Result<RefreshSummary, RefreshError> {
        let body = self.provider.fetch_series(domain).await?;
        let (entries, dropped) = parse_rank_entries(&body);

        let summary = RefreshSummary {
            received: entries.len() + dropped,
            stored: entries.len(),
            dropped,
        };
        if dropped > 0 {
            debug!(%domain, dropped, "dropped malformed rank entries");
        }

        if entries.is_empty() {
            info!(%domain, "provider returned no valid ranks; stored rows left untouched");
            return Ok(summary);
        }

        self.store.upsert_batch(domain, &entries, Utc::now()).await?;
        info!(%domain, stored = summary.stored, "[CACHE REFRESHED]");
        Ok(summary)
    }
}

/// Extracts valid entries from a provider payload
///
/// A missing or non-array `ranks` field yields no entries. Returns the kept
/// entries and the number of candidates that were discarded.
pub fn parse_rank_entries(body: &Value) -> (Vec<RankEntry>, usize) {
    let candidates: &[Value] = match body.get("ranks") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };

    let mut entries = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let date = candidate.get("date").and_then(parse_date);
        let rank = candidate.get("rank").and_then(coerce_rank);
        if let (Some(date), Some(rank)) = (date, rank) {
            entries.push(RankEntry { date, rank });
        }
    }
    let dropped = candidates.len() - entries.len();
    (entries, dropped)
}

/// Parses a `YYYY-MM-DD` string
fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Coerces a number or numeric string to a positive integer rank
fn coerce_rank(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() || number < 1.0 || number.fract() != 0.0 || number > u32::MAX as f64 {
        return None;
    }
    Some(number as u32)
}

//! Core data models for rankwatch
//!
//! This module contains the types shared by the cache, the provider client and
//! the ranking service: stored rank observations, validated provider entries
//! and the caller-facing series.

pub mod tranco;

pub use tranco::{ProviderError, RankProvider, TrancoClient};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One stored ranking sample for a domain on a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Normalized domain key (trimmed, lowercased)
    pub domain: String,
    /// Sampling day reported by the provider
    pub date: NaiveDate,
    /// Popularity rank, smaller is more popular
    pub rank: u32,
    /// When this row was last written, used for freshness
    pub refreshed_at: DateTime<Utc>,
}

/// A validated `{date, rank}` pair ready to be upserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankEntry {
    pub date: NaiveDate,
    pub rank: u32,
}

/// Ordered rank history for one domain
///
/// `labels` and `ranks` are parallel: `ranks[i]` was observed on `labels[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub domain: String,
    pub labels: Vec<NaiveDate>,
    pub ranks: Vec<u32>,
    /// True when no observation exists for the domain
    #[serde(rename = "outOfTop1M")]
    pub out_of_top_1m: bool,
}

impl Series {
    /// Builds a series from observations already sorted by date
    pub fn from_observations(domain: &str, rows: &[Observation]) -> Self {
        Self {
            domain: domain.to_string(),
            labels: rows.iter().map(|r| r.date).collect(),
            ranks: rows.iter().map(|r| r.rank).collect(),
            out_of_top_1m: rows.is_empty(),
        }
    }

    /// An empty series, used when nothing could be read for a domain
    pub fn empty(domain: &str) -> Self {
        Self::from_observations(domain, &[])
    }

    /// Best (smallest) rank in the series
    pub fn best_rank(&self) -> Option<u32> {
        self.ranks.iter().copied().min()
    }

    /// Most recent rank in the series
    pub fn latest_rank(&self) -> Option<u32> {
        self.ranks.last().copied()
    }
}

/// Per-domain result of a ranking request
///
/// Carries the assembled series plus the reason the domain could not be
/// refreshed, if any. Serializes as the series fields with an optional
/// `error` string alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainReport {
    #[serde(flatten)]
    pub series: Series,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DomainReport {
    pub fn ok(series: Series) -> Self {
        Self {
            series,
            error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Splits a comma-separated domain list into normalized keys
///
/// Each entry is trimmed and lowercased; empty entries are dropped and
/// repeated keys are kept once, in order of first appearance.
pub fn normalize_domains(raw: &str) -> Vec<String> {
    let mut domains: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let domain = part.trim().to_lowercase();
        if !domain.is_empty() && !domains.contains(&domain) {
            domains.push(domain);
        }
    }
    domains
}

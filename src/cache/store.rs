//! Storage abstraction for rank observations
//!
//! `RankStore` is the only shared mutable resource the ranking service
//! touches. Implementations own durability and the `(domain, date)`
//! uniqueness constraint; a batch upsert either commits entirely or not at
//! all.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::data::{Observation, RankEntry};

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing files failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be decoded
    #[error("Corrupt cache document for {domain}: {source}")]
    Corrupt {
        domain: String,
        #[source]
        source: serde_json::Error,
    },

    /// A document could not be encoded
    #[error("Failed to serialize cache document: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Durable keyed store of rank observations
#[async_trait]
pub trait RankStore: Send + Sync {
    /// Returns the observation with the most recent `refreshed_at`
    async fn find_latest(&self, domain: &str) -> Result<Option<Observation>, StorageError>;

    /// Returns every observation for `domain`, ascending by date
    async fn find_all(&self, domain: &str) -> Result<Vec<Observation>, StorageError>;

    /// Inserts or updates `entries` for `domain` keyed by date
    ///
    /// Existing dates get their rank and `refreshed_at` replaced. Dates not in
    /// `entries` are left untouched.
    async fn upsert_batch(
        &self,
        domain: &str,
        entries: &[RankEntry],
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Rank and write time of one stored date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredRank {
    pub rank: u32,
    pub refreshed_at: DateTime<Utc>,
}

/// All stored dates for one domain
pub(crate) type DomainRows = BTreeMap<NaiveDate, StoredRank>;

pub(crate) fn merge_entries(rows: &mut DomainRows, entries: &[RankEntry], refreshed_at: DateTime<Utc>) {
    for entry in entries {
        rows.insert(
            entry.date,
            StoredRank {
                rank: entry.rank,
                refreshed_at,
            },
        );
    }
}

pub(crate) fn to_observations(domain: &str, rows: &DomainRows) -> Vec<Observation> {
    rows.iter()
        .map(|(date, stored)| Observation {
            domain: domain.to_string(),
            date: *date,
            rank: stored.rank,
            refreshed_at: stored.refreshed_at,
        })
        .collect()
}

pub(crate) fn latest_observation(domain: &str, rows: &DomainRows) -> Option<Observation> {
    rows.iter()
        .max_by_key(|(_, stored)| stored.refreshed_at)
        .map(|(date, stored)| Observation {
            domain: domain.to_string(),
            date: *date,
            rank: stored.rank,
            refreshed_at: stored.refreshed_at,
        })
}

/// In-process store backed by a map
///
/// Used by tests and by embedders that do not need durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    domains: RwLock<HashMap<String, DomainRows>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one observation directly, bypassing the batch API
    pub async fn insert_observation(&self, observation: Observation) {
        let mut domains = self.domains.write().await;
        domains.entry(observation.domain).or_default().insert(
            observation.date,
            StoredRank {
                rank: observation.rank,
                refreshed_at: observation.refreshed_at,
            },
        );
    }

    /// Number of stored dates for `domain`
    pub async fn row_count(&self, domain: &str) -> usize {
        self.domains
            .read()
            .await
            .get(domain)
            .map_or(0, |rows| rows.len())
    }
}

#[async_trait]
impl RankStore for MemoryStore {
    async fn find_latest(&self, domain: &str) -> Result<Option<Observation>, StorageError> {
        let domains = self.domains.read().await;
        Ok(domains
            .get(domain)
            .and_then(|rows| latest_observation(domain, rows)))
    }

    async fn find_all(&self, domain: &str) -> Result<Vec<Observation>, StorageError> {
        let domains = self.domains.read().await;
        Ok(domains
            .get(domain)
            .map(|rows| to_observations(domain, rows))
            .unwrap_or_default())
    }

    async fn upsert_batch(
        &self,
        domain: &str,
        entries: &[RankEntry],
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut domains = self.domains.write().await;
        let rows = domains.entry(domain.to_string()).or_default();
        merge_entries(rows, entries, refreshed_at);
        Ok(())
    }
}

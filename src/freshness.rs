//! Cache freshness checks
//!
//! A domain is fresh when its most recent write is younger than the TTL. The
//! signal is the row's `refreshed_at`, not the sampling date: it measures how
//! long ago the provider was last asked about the domain.

use chrono::{DateTime, Duration, Utc};

use crate::cache::{RankStore, StorageError};

/// Returns true iff `refreshed_at` is strictly younger than `ttl` at `now`
pub fn is_fresh_at(refreshed_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    now - refreshed_at < ttl
}

/// Checks whether `domain` can be served from the cache without a refresh
///
/// A domain with no stored observations is always stale.
pub async fn is_fresh(
    store: &dyn RankStore,
    domain: &str,
    ttl: Duration,
) -> Result<bool, StorageError> {
    let latest = store.find_latest(domain).await?;
    Ok(latest.is_some_and(|obs| is_fresh_at(obs.refreshed_at, ttl, Utc::now())))
}

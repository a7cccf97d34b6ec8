//! Batch ranking requests
//!
//! `RankingService` is the entry point of the library. For each requested
//! domain it checks freshness, refreshes the stale ones concurrently, then
//! assembles every series from storage. Failures are isolated per domain and
//! reported next to the series instead of failing the whole batch.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::assemble::assemble;
use crate::cache::RankStore;
use crate::config::RankingConfig;
use crate::data::{normalize_domains, DomainReport, RankProvider, Series};
use crate::freshness::is_fresh;
use crate::refresh::{RefreshError, RefreshSummary, Refresher};

/// Result of one refresh as seen by every caller that waited on it
///
/// `Ok(None)` means the domain was already fresh when the refresh started.
type RefreshOutcome = Result<Option<RefreshSummary>, Arc<RefreshError>>;

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

type InFlight = Arc<Mutex<HashMap<String, SharedRefresh>>>;

/// Serves cached rank series, refreshing stale domains from the provider
#[derive(Clone)]
pub struct RankingService {
    config: RankingConfig,
    store: Arc<dyn RankStore>,
    refresher: Refresher,
    // Singleflight: one shared refresh per domain, awaited by every caller
    in_flight: InFlight,
}

impl std::fmt::Debug for RankingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let in_flight = self
            .in_flight
            .try_lock()
            .map(|refreshes| refreshes.len())
            .unwrap_or(0);
        f.debug_struct("RankingService")
            .field("config", &self.config)
            .field("in_flight_refreshes", &in_flight)
            .finish_non_exhaustive()
    }
}

impl RankingService {
    pub fn new(
        config: RankingConfig,
        provider: Arc<dyn RankProvider>,
        store: Arc<dyn RankStore>,
    ) -> Self {
        Self {
            refresher: Refresher::new(provider, Arc::clone(&store)),
            config,
            store,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the rank series for every domain in a comma-separated list
    ///
    /// Keys are normalized first, so repeated domains appear once. Every
    /// requested domain gets a report; domains whose refresh or read failed
    /// carry an `error` alongside whatever series is stored.
    pub async fn get_ranking(&self, raw_domains: &str) -> BTreeMap<String, DomainReport> {
        let domains = normalize_domains(raw_domains);

        let freshness = join_all(domains.iter().map(|domain| self.check_freshness(domain))).await;
        let stale: Vec<&String> = domains
            .iter()
            .zip(freshness)
            .filter(|(_, fresh)| !fresh)
            .map(|(domain, _)| domain)
            .collect();

        let outcomes = join_all(stale.iter().map(|domain| self.shared_refresh(domain))).await;

        let mut refresh_errors: HashMap<&str, Arc<RefreshError>> = HashMap::new();
        for (domain, outcome) in stale.into_iter().zip(outcomes) {
            if let Err(e) = outcome {
                warn!(%domain, error = %e, "refresh failed");
                refresh_errors.insert(domain.as_str(), e);
            }
        }

        let assembled = join_all(
            domains
                .iter()
                .map(|domain| assemble(self.store.as_ref(), domain)),
        )
        .await;

        let mut reports = BTreeMap::new();
        for (domain, series) in domains.iter().zip(assembled) {
            let refresh_error = refresh_errors.remove(domain.as_str()).map(|e| e.to_string());
            let report = match series {
                Ok(series) => DomainReport {
                    series,
                    error: refresh_error,
                },
                Err(e) => {
                    warn!(%domain, error = %e, "failed to read stored series");
                    let error = match refresh_error {
                        Some(refresh) => format!("{}; {}", refresh, e),
                        None => e.to_string(),
                    };
                    DomainReport {
                        series: Series::empty(domain),
                        error: Some(error),
                    }
                }
            };
            reports.insert(domain.clone(), report);
        }
        reports
    }

    /// Returns true when `domain` can be served without a refresh
    ///
    /// A failed read counts as stale so that a refresh is still attempted.
    async fn check_freshness(&self, domain: &str) -> bool {
        match is_fresh(self.store.as_ref(), domain, self.config.ttl).await {
            Ok(true) => {
                info!(%domain, "[CACHE HIT]");
                true
            }
            Ok(false) => {
                info!(%domain, "[CACHE MISS] refreshing from provider");
                false
            }
            Err(e) => {
                warn!(%domain, error = %e, "freshness check failed; treating as stale");
                false
            }
        }
    }

    /// Joins the refresh in flight for `domain`, starting one if there is none
    ///
    /// Every caller that joins receives the same outcome, including a provider
    /// error or an empty result, so concurrent requests cost one fetch. The
    /// refresh runs on its own task and still commits if every caller goes away.
    async fn shared_refresh(&self, domain: &str) -> RefreshOutcome {
        let refresh = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(domain) {
                Some(refresh) => {
                    debug!(%domain, "singleflight wait");
                    refresh.clone()
                }
                None => {
                    debug!(%domain, "singleflight lead");
                    let refresh = self.spawn_refresh(domain.to_string());
                    in_flight.insert(domain.to_string(), refresh.clone());
                    refresh
                }
            }
        };
        refresh.await
    }

    /// Starts the refresh task; it unregisters itself once its outcome is known
    fn spawn_refresh(&self, domain: String) -> SharedRefresh {
        let service = self.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let task_domain = domain.clone();
        let task = tokio::spawn(async move {
            let outcome = service.refresh_unless_fresh(&task_domain).await;
            service.in_flight.lock().await.remove(&task_domain);
            outcome
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    // The task never reached its own cleanup
                    in_flight.lock().await.remove(&domain);
                    Err(Arc::new(RefreshError::Aborted(e.to_string())))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Refreshes `domain` unless a refresh that finished since the caller's
    /// freshness check already made it fresh
    async fn refresh_unless_fresh(&self, domain: &str) -> RefreshOutcome {
        match is_fresh(self.store.as_ref(), domain, self.config.ttl).await {
            Ok(true) => {
                debug!(%domain, "refreshed by an earlier request");
                return Ok(None);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(%domain, error = %e, "freshness re-check failed; refreshing anyway");
            }
        }
        self.refresher
            .refresh(domain)
            .await
            .map(Some)
            .map_err(Arc::new)
    }
}

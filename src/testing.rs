//! Test doubles shared by the unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::cache::{MemoryStore, RankStore, StorageError};
use crate::data::{Observation, ProviderError, RankEntry, RankProvider};

/// Canned provider answer for one domain
#[derive(Debug, Clone)]
pub enum Scripted {
    Body(Value),
    Status(u16),
}

/// Provider that answers from a script and counts calls per domain
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    responses: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<HashMap<String, usize>>,
    total_calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, domain: &str, response: Scripted) -> Self {
        self.set(domain, response);
        self
    }

    pub fn set(&self, domain: &str, response: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .insert(domain.to_string(), response);
    }

    pub fn calls_for(&self, domain: &str) -> usize {
        self.calls.lock().unwrap().get(domain).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RankProvider for ScriptedProvider {
    async fn fetch_series(&self, domain: &str) -> Result<Value, ProviderError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(domain.to_string())
            .or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.lock().unwrap().get(domain).cloned();
        match response {
            Some(Scripted::Body(body)) => Ok(body),
            Some(Scripted::Status(status)) => Err(ProviderError::Status {
                domain: domain.to_string(),
                status,
                message: "scripted failure".to_string(),
            }),
            None => Err(ProviderError::Status {
                domain: domain.to_string(),
                status: 404,
                message: "Not Found".to_string(),
            }),
        }
    }
}

/// Memory store whose writes or latest-row reads can be made to fail
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_writes: std::sync::atomic::AtomicBool,
    fail_latest: std::sync::atomic::AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `find_latest` fail, as an unreadable freshness stamp would
    pub fn fail_latest(&self, fail: bool) {
        self.fail_latest.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RankStore for FlakyStore {
    async fn find_latest(&self, domain: &str) -> Result<Option<Observation>, StorageError> {
        if self.fail_latest.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "cache unreadable",
            )));
        }
        self.inner.find_latest(domain).await
    }

    async fn find_all(&self, domain: &str) -> Result<Vec<Observation>, StorageError> {
        self.inner.find_all(domain).await
    }

    async fn upsert_batch(
        &self,
        domain: &str,
        entries: &[RankEntry],
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.upsert_batch(domain, entries, refreshed_at).await
    }
}

//! File-backed rank store
//!
//! Provides a `FileStore` that keeps one JSON document per domain in an
//! XDG-compliant cache directory. Every batch upsert rewrites the whole
//! document through a temporary file and a rename, so a failed write leaves
//! the previous document intact.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::store::{
    latest_observation, merge_entries, to_observations, DomainRows, RankStore, StorageError,
    StoredRank,
};
use crate::data::{Observation, RankEntry};

/// On-disk document holding every stored date for one domain
#[derive(Debug, Serialize, Deserialize)]
struct DomainDocument {
    domain: String,
    rows: Vec<DocumentRow>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentRow {
    date: NaiveDate,
    rank: u32,
    refreshed_at: DateTime<Utc>,
}

impl DomainDocument {
    fn into_rows(self) -> DomainRows {
        self.rows
            .into_iter()
            .map(|row| {
                (
                    row.date,
                    StoredRank {
                        rank: row.rank,
                        refreshed_at: row.refreshed_at,
                    },
                )
            })
            .collect()
    }

    fn from_rows(domain: &str, rows: &DomainRows) -> Self {
        Self {
            domain: domain.to_string(),
            rows: rows
                .iter()
                .map(|(date, stored)| DocumentRow {
                    date: *date,
                    rank: stored.rank,
                    refreshed_at: stored.refreshed_at,
                })
                .collect(),
        }
    }
}

/// Persists rank observations to disk
///
/// Documents live in `~/.cache/rankwatch/` on Linux (or the platform
/// equivalent), one `<domain>.json` file per domain. Writes from this process
/// are serialized; the last successful rename wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where documents are stored
    cache_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
    tmp_counter: Arc<AtomicU64>,
}

impl FileStore {
    /// Creates a FileStore using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "rankwatch")?;
        Some(Self::with_dir(project_dirs.cache_dir().join("ranks")))
    }

    /// Creates a FileStore rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            write_lock: Arc::new(Mutex::new(())),
            tmp_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path of the document for a domain
    fn document_path(&self, domain: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_key(domain)))
    }

    async fn read_rows(&self, domain: &str) -> Result<DomainRows, StorageError> {
        let content = match fs::read_to_string(self.document_path(domain)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(DomainRows::new()),
            Err(e) => return Err(e.into()),
        };
        let document: DomainDocument =
            serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
                domain: domain.to_string(),
                source,
            })?;
        Ok(document.into_rows())
    }

    async fn write_rows(&self, domain: &str, rows: &DomainRows) -> Result<(), StorageError> {
        fs::create_dir_all(&self.cache_dir).await?;

        let json = serde_json::to_string_pretty(&DomainDocument::from_rows(domain, rows))
            .map_err(StorageError::Serialize)?;

        let path = self.document_path(domain);
        let tmp_path = self.cache_dir.join(format!(
            ".{}.{}.{}.tmp",
            file_key(domain),
            std::process::id(),
            self.tmp_counter.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = fs::write(&tmp_path, json).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        debug!(%domain, path = %path.display(), rows = rows.len(), "wrote rank document");
        Ok(())
    }
}

#[async_trait]
impl RankStore for FileStore {
    async fn find_latest(&self, domain: &str) -> Result<Option<Observation>, StorageError> {
        let rows = self.read_rows(domain).await?;
        Ok(latest_observation(domain, &rows))
    }

    async fn find_all(&self, domain: &str) -> Result<Vec<Observation>, StorageError> {
        let rows = self.read_rows(domain).await?;
        Ok(to_observations(domain, &rows))
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
        let _guard = self.write_lock.lock().await;
        let mut rows = self.read_rows(domain).await?;
        merge_entries(&mut rows, entries, refreshed_at);
        self.write_rows(domain, &rows).await
    }
}

/// Maps a domain to a file name stem that cannot escape the cache directory
fn file_key(domain: &str) -> String {
    let mut key = String::with_capacity(domain.len());
    for byte in domain.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => key.push(byte as char),
            _ => key.push_str(&format!("%{:02X}", byte)),
        }
    }
    key
}

//! Append-only collection storage.
//!
//! [`ResonanceStore`] is the contract every backend honors: atomic appends with
//! strictly increasing ids, snapshot reads in insertion order, uniform sampling.
//! [`Collections`] opens the three collections (entries, echoes, reflections)
//! for the configured [`StorageBackend`], each with its own lock.

pub mod json;
pub mod memory;
pub mod sqlite;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::archive::types::{Echo, Entry, Reflection};
use crate::config::{StorageBackend, StorageConfig};
use crate::error::StoreError;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A record kept in an append-only collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name (SQLite file stem, log field).
    const COLLECTION: &'static str;
    /// JSON document file name.
    const DOCUMENT: &'static str;

    fn id(&self) -> u64;
    fn assign_id(&mut self, id: u64);
}

/// Durable, concurrency-safe storage for one append-only collection.
///
/// All methods are synchronous; callers in async contexts use
/// `tokio::task::spawn_blocking`.
pub trait ResonanceStore<R: Record>: Send + Sync {
    /// Assign the next id to `record` and persist it. Returns the stored record.
    ///
    /// On failure the collection is unchanged.
    fn append(&self, record: R) -> Result<R, StoreError>;

    fn get_by_id(&self, id: u64) -> Result<Option<R>, StoreError>;

    /// Snapshot of every record in insertion order.
    fn all(&self) -> Result<Vec<R>, StoreError>;

    /// One record chosen uniformly at random, or `None` when empty.
    fn sample(&self, rng: &mut dyn RngCore) -> Result<Option<R>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Next id after `last`: wall-clock milliseconds, bumped past `last` when the
/// clock has not advanced. Callers hold the collection lock.
///
/// Fails rather than wrapping when `last` is already `u64::MAX`.
pub fn next_id(last: Option<u64>) -> Result<u64, StoreError> {
    let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
    match last {
        Some(last) => {
            let bumped = last
                .checked_add(1)
                .ok_or(StoreError::IdOutOfRange(i128::from(last)))?;
            Ok(now.max(bumped))
        }
        None => Ok(now.max(1)),
    }
}

/// The three collections of one archive.
#[derive(Clone)]
pub struct Collections {
    pub entries: Arc<dyn ResonanceStore<Entry>>,
    pub echoes: Arc<dyn ResonanceStore<Echo>>,
    pub reflections: Arc<dyn ResonanceStore<Reflection>>,
}

impl Collections {
    /// Open all three collections for the configured backend, creating the
    /// data directory and empty collections if absent.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let dir = crate::config::expand_tilde(&config.data_dir);
        let collections = match config.backend {
            StorageBackend::Json => {
                bootstrap(&dir)?;
                Self {
                    entries: Arc::new(JsonFileStore::<Entry>::open(&dir)?),
                    echoes: Arc::new(JsonFileStore::<Echo>::open(&dir)?),
                    reflections: Arc::new(JsonFileStore::<Reflection>::open(&dir)?),
                }
            }
            StorageBackend::Sqlite => Self {
                entries: Arc::new(SqliteStore::<Entry>::open(&dir)?),
                echoes: Arc::new(SqliteStore::<Echo>::open(&dir)?),
                reflections: Arc::new(SqliteStore::<Reflection>::open(&dir)?),
            },
            StorageBackend::Memory => Self::in_memory(),
        };
        tracing::info!(backend = ?config.backend, dir = %dir.display(), "collections ready");
        Ok(collections)
    }

    pub fn in_memory() -> Self {
        Self {
            entries: Arc::new(MemoryStore::<Entry>::new()),
            echoes: Arc::new(MemoryStore::<Echo>::new()),
            reflections: Arc::new(MemoryStore::<Reflection>::new()),
        }
    }
}

/// Outcome of bootstrapping one collection document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapStatus {
    pub document: &'static str,
    pub created: bool,
}

/// Create `dir` and an empty `[]` document for every collection that lacks one.
pub fn bootstrap(dir: &Path) -> Result<Vec<BootstrapStatus>, StoreError> {
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut statuses = Vec::with_capacity(3);
    for document in [Entry::DOCUMENT, Echo::DOCUMENT, Reflection::DOCUMENT] {
        let path = dir.join(document);
        let created = if path.exists() {
            false
        } else {
            json::write_atomic(&path, b"[]")?;
            true
        };
        statuses.push(BootstrapStatus { document, created });
    }
    Ok(statuses)
}

/// Copy every collection of the configured backend into a fresh timestamped
/// directory under `dest_root`. Returns the directory and the files written.
pub fn backup(config: &StorageConfig, dest_root: &Path) -> Result<(PathBuf, Vec<PathBuf>), StoreError> {
    let stamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string();
    let dest = dest_root.join(stamp);
    std::fs::create_dir_all(&dest).map_err(|e| StoreError::io(&dest, e))?;

    let source = crate::config::expand_tilde(&config.data_dir);
    let mut written = Vec::new();
    match config.backend {
        StorageBackend::Json => {
            for document in [Entry::DOCUMENT, Echo::DOCUMENT, Reflection::DOCUMENT] {
                let from = source.join(document);
                if !from.exists() {
                    continue;
                }
                let to = dest.join(document);
                std::fs::copy(&from, &to).map_err(|e| StoreError::io(&from, e))?;
                written.push(to);
            }
        }
        StorageBackend::Sqlite => {
            for collection in [Entry::COLLECTION, Echo::COLLECTION, Reflection::COLLECTION] {
                let from = sqlite::database_path(&source, collection);
                if !from.exists() {
                    continue;
                }
                let to = dest.join(from.file_name().unwrap_or_default());
                crate::db::snapshot_into(&from, &to)?;
                written.push(to);
            }
        }
        StorageBackend::Memory => {
            tracing::warn!("memory backend has nothing to back up");
        }
    }

    tracing::info!(dest = %dest.display(), files = written.len(), "backup complete");
    Ok((dest, written))
}

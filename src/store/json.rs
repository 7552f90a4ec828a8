//! Flat-document backend: one JSON array per collection.
//!
//! Every append reads the full document, pushes the record and replaces the
//! document through a temp-file rename, all under the collection's mutex.
//! Readers take no lock; the rename guarantees they see either the old or the
//! new document, never a partial one. The lock is process-local: one process
//! owns a data directory.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::{Rng, RngCore};

use super::{next_id, Record, ResonanceStore};
use crate::error::StoreError;

pub struct JsonFileStore<R> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> JsonFileStore<R> {
    /// Open the collection document inside `dir`. The document need not exist.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        Ok(Self {
            path: dir.join(R::DOCUMENT),
            write_lock: Mutex::new(()),
            _record: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document. Missing or blank documents read as empty.
    fn read_snapshot(&self) -> Result<Vec<R>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })
    }
}

impl<R: Record> ResonanceStore<R> for JsonFileStore<R> {
    fn append(&self, mut record: R) -> Result<R, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Poisoned(R::COLLECTION))?;

        let mut records = self.read_snapshot()?;
        let id = next_id(records.iter().map(Record::id).max())?;
        record.assign_id(id);
        records.push(record.clone());

        let document = serde_json::to_vec_pretty(&records)?;
        write_atomic(&self.path, &document)?;

        tracing::debug!(collection = R::COLLECTION, id, total = records.len(), "record appended");
        Ok(record)
    }

    fn get_by_id(&self, id: u64) -> Result<Option<R>, StoreError> {
        Ok(self.read_snapshot()?.into_iter().find(|r| r.id() == id))
    }

    fn all(&self) -> Result<Vec<R>, StoreError> {
        self.read_snapshot()
    }

    fn sample(&self, rng: &mut dyn RngCore) -> Result<Option<R>, StoreError> {
        let mut records = self.read_snapshot()?;
        if records.is_empty() {
            return Ok(None);
        }
        let index = rng.gen_range(0..records.len());
        Ok(Some(records.swap_remove(index)))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read_snapshot()?.len())
    }
}

/// Replace `path` with `contents` atomically (write tmp, fsync, rename).
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = (|| {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp_path, path)
    })();

    result.map_err(|e| {
        // Best effort; the original document is untouched either way.
        let _ = std::fs::remove_file(&tmp_path);
        StoreError::io(path, e)
    })
}

//! Process-local backend. Nothing survives a restart.

use std::sync::RwLock;

use rand::{Rng, RngCore};

use super::{next_id, Record, ResonanceStore};
use crate::error::StoreError;

pub struct MemoryStore<R> {
    records: RwLock<Vec<R>>,
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> ResonanceStore<R> for MemoryStore<R> {
    fn append(&self, mut record: R) -> Result<R, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Poisoned(R::COLLECTION))?;
        record.assign_id(next_id(records.last().map(Record::id))?);
        records.push(record.clone());
        Ok(record)
    }

    fn get_by_id(&self, id: u64) -> Result<Option<R>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Poisoned(R::COLLECTION))?;
        Ok(records.iter().find(|r| r.id() == id).cloned())
    }

    fn all(&self) -> Result<Vec<R>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Poisoned(R::COLLECTION))?;
        Ok(records.clone())
    }

    fn sample(&self, rng: &mut dyn RngCore) -> Result<Option<R>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Poisoned(R::COLLECTION))?;
        if records.is_empty() {
            return Ok(None);
        }
        Ok(Some(records[rng.gen_range(0..records.len())].clone()))
    }

    fn len(&self) -> Result<usize, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Poisoned(R::COLLECTION))?;
        Ok(records.len())
    }
}

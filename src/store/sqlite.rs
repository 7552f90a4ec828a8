//! SQLite backend: one database file per collection, record bodies as JSON.
//!
//! Each store owns its own connection behind a mutex, so collections lock
//! independently, exactly like the flat-document backend.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::{Rng, RngCore};
use rusqlite::{params, Connection, OptionalExtension};

use super::{next_id, Record, ResonanceStore};
use crate::error::StoreError;

pub struct SqliteStore<R> {
    conn: Mutex<Connection>,
    _record: PhantomData<fn() -> R>,
}

/// `<dir>/<collection>.db`
pub fn database_path(dir: &Path, collection: &str) -> PathBuf {
    dir.join(format!("{collection}.db"))
}

impl<R: Record> SqliteStore<R> {
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let conn = crate::db::open_database(database_path(dir, R::COLLECTION))?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            _record: PhantomData,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Poisoned(R::COLLECTION))
    }
}

fn to_sql_id(id: u64) -> Result<i64, StoreError> {
    i64::try_from(id).map_err(|_| StoreError::IdOutOfRange(i128::from(id)))
}

fn from_sql_id(id: i64) -> Result<u64, StoreError> {
    u64::try_from(id).map_err(|_| StoreError::IdOutOfRange(i128::from(id)))
}

fn decode<R: Record>(body: &str) -> Result<R, StoreError> {
    serde_json::from_str(body).map_err(|source| StoreError::Decode {
        path: PathBuf::from(R::COLLECTION),
        source,
    })
}

impl<R: Record> ResonanceStore<R> for SqliteStore<R> {
    fn append(&self, mut record: R) -> Result<R, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let last: Option<i64> = tx.query_row("SELECT MAX(id) FROM records", [], |row| row.get(0))?;
        let id = next_id(last.map(from_sql_id).transpose()?)?;
        let sql_id = to_sql_id(id)?;
        record.assign_id(id);

        let body = serde_json::to_string(&record)?;
        let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        tx.execute(
            "INSERT INTO records (id, body, created_at) VALUES (?1, ?2, ?3)",
            params![sql_id, body, created_at],
        )?;
        tx.commit()?;

        tracing::debug!(collection = R::COLLECTION, id, "record appended");
        Ok(record)
    }

    fn get_by_id(&self, id: u64) -> Result<Option<R>, StoreError> {
        // Ids beyond i64 can never have been stored here.
        let Ok(sql_id) = i64::try_from(id) else {
            return Ok(None);
        };
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM records WHERE id = ?1",
                params![sql_id],
                |row| row.get(0),
            )
            .optional()?;
        body.as_deref().map(decode::<R>).transpose()
    }

    fn all(&self) -> Result<Vec<R>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT body FROM records ORDER BY id")?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        bodies.iter().map(|b| decode::<R>(b)).collect()
    }

    fn sample(&self, rng: &mut dyn RngCore) -> Result<Option<R>, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        if count == 0 {
            return Ok(None);
        }
        let offset = rng.gen_range(0..count);
        let body: String = conn.query_row(
            "SELECT body FROM records ORDER BY id LIMIT 1 OFFSET ?1",
            params![offset],
            |row| row.get(0),
        )?;
        decode::<R>(&body).map(Some)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StoreError::IdOutOfRange(i128::from(count)))
    }
}

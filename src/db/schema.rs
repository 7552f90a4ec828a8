//! SQL DDL for a collection database.
//!
//! Each collection lives in its own file with a single `records` table holding
//! the JSON body of every record keyed by its id, plus the RFC 3339 time the
//! row was written. DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// Initialize the schema. Idempotent.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version == 0 {
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    } else if version > CURRENT_SCHEMA_VERSION {
        tracing::warn!(
            found = version,
            expected = CURRENT_SCHEMA_VERSION,
            "collection database was written by a newer version"
        );
    }

    Ok(())
}

/// Get the schema version stored in the database header.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

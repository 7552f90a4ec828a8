//! Error taxonomy for the archive engine.
//!
//! [`ArchiveError`] is what request paths surface to callers; [`StoreError`]
//! covers everything that can go wrong inside a collection backend.

use std::path::PathBuf;
use std::time::Duration;

/// Errors surfaced by [`crate::archive::Archive`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Missing or malformed request field. Client fault.
    #[error("{0}")]
    Validation(String),

    /// Unknown entry id. Client fault.
    #[error("entry not found: {0}")]
    NotFound(u64),

    /// The embedding provider failed. Server fault.
    #[error("embedding provider failed: {0}")]
    Provider(String),

    /// The embedding provider did not answer within its bound. Server fault.
    #[error("embedding provider timed out after {0:?}")]
    Timeout(Duration),

    /// Collection read/write/lock failure. Server fault.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ArchiveError {
    /// `true` for errors caused by the caller's input rather than the service.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

/// Failures inside a [`crate::store::ResonanceStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed collection document {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("record id out of range: {0}")]
    IdOutOfRange(i128),

    #[error("{0} lock poisoned")]
    Poisoned(&'static str),

    #[error("store task failed: {0}")]
    Join(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;

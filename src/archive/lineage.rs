//! Lineage: the chronological chain of entries that resonate with one entry.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::similarity::SearchParams;
use super::types::{Entry, ResonantEntry};
use super::Archive;
use crate::error::{ArchiveError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct LineageTrace {
    pub original: Entry,
    /// Resonant entries, oldest first. Never contains the original.
    pub lineage: Vec<ResonantEntry>,
    pub timestamp: DateTime<Utc>,
}

/// Trace the lineage of entry `id`.
///
/// Fails with [`ArchiveError::NotFound`] before touching the provider when the
/// id is unknown. Nothing is written.
pub(crate) async fn trace(archive: &Archive, id: u64) -> Result<LineageTrace> {
    let original = archive
        .get_entry(id)
        .await?
        .ok_or(ArchiveError::NotFound(id))?;

    let retrieval = archive.retrieval();
    let query = if retrieval.reembed_on_trace {
        archive.embed(&original.content).await?
    } else {
        original.embedding.clone()
    };

    let params = SearchParams::new(retrieval.lineage_threshold, retrieval.lineage_max_results)
        .excluding([original.id]);
    let mut lineage = archive.rank(query, params).await?;
    sort_chronologically(&mut lineage);

    tracing::debug!(id, related = lineage.len(), "lineage traced");
    Ok(LineageTrace {
        original,
        lineage,
        timestamp: Utc::now(),
    })
}

/// Oldest first; ids break timestamp ties.
pub fn sort_chronologically(entries: &mut [ResonantEntry]) {
    entries.sort_by(|a, b| {
        a.entry
            .timestamp
            .cmp(&b.entry.timestamp)
            .then(a.entry.id.cmp(&b.entry.id))
    });
}

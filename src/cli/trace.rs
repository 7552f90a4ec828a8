//! CLI `trace` command: print the lineage of one entry as JSON.

use anyhow::{Context, Result};

use resonance_archive::archive::Archive;
use resonance_archive::config::ArchiveConfig;

pub async fn trace(config: &ArchiveConfig, id: u64) -> Result<()> {
    let archive = Archive::open(config)?;
    let trace = archive
        .trace_lineage(id)
        .await
        .with_context(|| format!("failed to trace entry {id}"))?;

    println!("{}", serde_json::to_string_pretty(&trace)?);
    Ok(())
}

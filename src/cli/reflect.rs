//! CLI `reflect` command: run one curator tick now.

use std::sync::Arc;

use anyhow::{Context, Result};

use resonance_archive::archive::curator::GhostCurator;
use resonance_archive::archive::Archive;
use resonance_archive::config::ArchiveConfig;

pub async fn reflect(config: &ArchiveConfig) -> Result<()> {
    let archive = Arc::new(Archive::open(config)?);
    let curator = GhostCurator::new(archive, config.curator.clone());

    match curator.tick().await.context("reflection failed")? {
        Some(reflection) => {
            println!(
                "Reflected on entry {} ({} related)",
                reflection.original.id,
                reflection.related.len()
            );
            for related in &reflection.related {
                println!(
                    "  {:>16}  {:.3}  {}",
                    related.entry.id, related.similarity, related.entry.emotion
                );
            }
        }
        None => println!("Archive is empty; nothing to reflect on."),
    }
    Ok(())
}

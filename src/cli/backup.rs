//! CLI `backup` command: snapshot every collection into a timestamped directory.

use std::path::PathBuf;

use anyhow::{Context, Result};

use resonance_archive::config::{default_resonance_dir, ArchiveConfig};
use resonance_archive::store;

pub fn backup(config: &ArchiveConfig, dest: Option<PathBuf>) -> Result<()> {
    let dest_root = dest.unwrap_or_else(|| default_resonance_dir().join("backups"));

    let (dir, files) = store::backup(&config.storage, &dest_root)
        .with_context(|| format!("backup into {} failed", dest_root.display()))?;

    if files.is_empty() {
        println!("Nothing to back up; created empty {}", dir.display());
        return Ok(());
    }
    println!("Backed up {} collection(s) to {}", files.len(), dir.display());
    for file in files {
        println!("  {}", file.display());
    }
    Ok(())
}

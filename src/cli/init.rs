//! CLI `init` command: create the data directory and empty collections.

use anyhow::{Context, Result};

use resonance_archive::config::{ArchiveConfig, StorageBackend};
use resonance_archive::store;

pub fn init(config: &ArchiveConfig) -> Result<()> {
    let data_dir = config.resolved_data_dir();

    match config.storage.backend {
        StorageBackend::Json => {
            let statuses = store::bootstrap(&data_dir)
                .with_context(|| format!("failed to bootstrap {}", data_dir.display()))?;
            println!("Data directory: {}", data_dir.display());
            for status in statuses {
                let action = if status.created { "created" } else { "exists " };
                println!("  {action}  {}", status.document);
            }
        }
        StorageBackend::Sqlite => {
            store::Collections::open(&config.storage)
                .with_context(|| format!("failed to open databases in {}", data_dir.display()))?;
            println!("SQLite collections ready in {}", data_dir.display());
        }
        StorageBackend::Memory => {
            println!("Memory backend keeps nothing on disk; nothing to initialize.");
        }
    }

    Ok(())
}

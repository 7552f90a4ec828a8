use anyhow::Result;

use resonance_archive::archive::emotion::ARCHETYPES;
use resonance_archive::archive::stats::compute_stats;
use resonance_archive::config::ArchiveConfig;
use resonance_archive::store::{Collections, ResonanceStore};

/// Display archive statistics in the terminal.
pub fn stats(config: &ArchiveConfig) -> Result<()> {
    let collections = Collections::open(&config.storage)?;
    let entries = collections.entries.all()?;
    let response = compute_stats(
        &entries,
        collections.echoes.len()?,
        collections.reflections.len()?,
    );

    println!("Archive Statistics");
    println!("{}", "=".repeat(40));
    println!("  Entries:             {}", response.total_entries);
    println!("  Echoes:              {}", response.total_echoes);
    println!("  Ghost reflections:   {}", response.total_reflections);
    println!();

    println!("By Emotion:");
    for archetype in ARCHETYPES {
        let count = response.by_emotion.get(archetype.name).copied().unwrap_or(0);
        println!("  {:<12} {}", archetype.name, count);
    }
    // Labels from a different registry in older documents.
    for (emotion, count) in &response.by_emotion {
        if !ARCHETYPES.iter().any(|a| a.name == emotion.as_str()) {
            println!("  {:<12} {}", emotion, count);
        }
    }
    println!();

    if let Some(ref oldest) = response.oldest_entry {
        println!("Oldest entry:          {oldest}");
    }
    if let Some(ref newest) = response.newest_entry {
        println!("Newest entry:          {newest}");
    }

    Ok(())
}

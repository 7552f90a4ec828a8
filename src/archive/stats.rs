use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::types::Entry;

/// Summary counts over the three collections.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArchiveStats {
    pub total_entries: usize,
    pub total_echoes: usize,
    pub total_reflections: usize,
    pub by_emotion: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_entry: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry: Option<DateTime<Utc>>,
}

pub fn compute_stats(entries: &[Entry], echoes: usize, reflections: usize) -> ArchiveStats {
    let mut by_emotion = BTreeMap::new();
    for entry in entries {
        *by_emotion.entry(entry.emotion.clone()).or_insert(0) += 1;
    }

    ArchiveStats {
        total_entries: entries.len(),
        total_echoes: echoes,
        total_reflections: reflections,
        by_emotion,
        oldest_entry: entries.iter().map(|e| e.timestamp).min(),
        newest_entry: entries.iter().map(|e| e.timestamp).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::types::{EmotionDetails, EmotionDimensions, EntryKind};
    use chrono::TimeZone;

    fn entry(emotion: &str, secs: i64) -> Entry {
        Entry {
            id: secs as u64,
            content: String::new(),
            kind: EntryKind::Text,
            embedding: Vec::new(),
            emotion: emotion.into(),
            emotion_details: EmotionDetails {
                confidence: 0.5,
                dimensions: EmotionDimensions::default(),
            },
            echo_trace: None,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn empty_archive() {
        let stats = compute_stats(&[], 0, 0);
        assert_eq!(stats.total_entries, 0);
        assert!(stats.by_emotion.is_empty());
        assert!(stats.oldest_entry.is_none());
    }

    #[test]
    fn counts_and_range() {
        let entries = vec![entry("joy", 20), entry("ache", 10), entry("joy", 30)];
        let stats = compute_stats(&entries, 4, 1);
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.total_echoes, 4);
        assert_eq!(stats.total_reflections, 1);
        assert_eq!(stats.by_emotion["joy"], 2);
        assert_eq!(stats.by_emotion["ache"], 1);
        assert_eq!(stats.oldest_entry, Some(Utc.timestamp_opt(10, 0).unwrap()));
        assert_eq!(stats.newest_entry, Some(Utc.timestamp_opt(30, 0).unwrap()));
    }
}

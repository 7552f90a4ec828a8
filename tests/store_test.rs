mod helpers;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use helpers::storage;
use resonance_archive::archive::types::{Echo, Entry};
use resonance_archive::config::StorageBackend;
use resonance_archive::store::{self, Collections, JsonFileStore, ResonanceStore, SqliteStore};

fn echo(n: u64) -> Echo {
    Echo {
        id: 0,
        source_embedding: vec![n as f32, 0.0, 0.0, 0.0, 0.0],
        results: vec![n],
        timestamp: Utc::now(),
    }
}

fn hammer(store: Arc<dyn ResonanceStore<Echo>>, threads: u64, per_thread: u64) -> Vec<u64> {
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..per_thread)
                    .map(|i| store.append(echo(t * 1000 + i)).unwrap().id)
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

fn assert_unique_and_complete(store: &dyn ResonanceStore<Echo>, ids: &[u64], expected: usize) {
    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), expected, "ids must be unique");

    let stored = store.all().unwrap();
    assert_eq!(stored.len(), expected, "no append may be lost");
    assert!(
        stored.windows(2).all(|w| w[0].id < w[1].id),
        "insertion order must follow id order"
    );
}

#[test]
fn concurrent_json_appends_get_unique_ids() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store: Arc<dyn ResonanceStore<Echo>> = Arc::new(JsonFileStore::<Echo>::open(tmp.path()).unwrap());

    let ids = hammer(Arc::clone(&store), 8, 10);
    assert_unique_and_complete(store.as_ref(), &ids, 80);
}

#[test]
fn concurrent_sqlite_appends_get_unique_ids() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store: Arc<dyn ResonanceStore<Echo>> = Arc::new(SqliteStore::<Echo>::open(tmp.path()).unwrap());

    let ids = hammer(Arc::clone(&store), 8, 10);
    assert_unique_and_complete(store.as_ref(), &ids, 80);
}

#[test]
fn concurrent_memory_appends_get_unique_ids() {
    let collections = Collections::in_memory();
    let ids = hammer(Arc::clone(&collections.echoes), 8, 25);
    assert_unique_and_complete(collections.echoes.as_ref(), &ids, 200);
}

#[test]
fn existing_journal_documents_load_unchanged() {
    let tmp = tempfile::TempDir::new().unwrap();
    let document = r#"[
  {
    "id": 1717171717171,
    "content": "the light through the window",
    "type": "text",
    "embedding": [0.5, 0.3, 0.8, 0.9, 0.4, 0.01],
    "emotion": "wonder",
    "emotion_details": {
      "confidence": 0.98,
      "dimensions": {"intensity": 0.5, "valence": 0.3, "activation": 0.8, "clarity": 0.9, "resonance": 0.4}
    },
    "echo_trace": {
      "timestamp": "2024-05-31T16:08:37.171Z",
      "resonance_score": 0.4,
      "emotional_context": {"intensity": 0.5, "valence": 0.3, "activation": 0.8, "clarity": 0.9, "resonance": 0.4}
    },
    "timestamp": "2024-05-31T16:08:37.171Z"
  }
]"#;
    std::fs::write(tmp.path().join("entries.json"), document).unwrap();

    let store = JsonFileStore::<Entry>::open(tmp.path()).unwrap();
    let entries = store.all().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 1717171717171);
    assert_eq!(entries[0].emotion, "wonder");

    // New ids continue past the legacy ones.
    let next = store.append(entries[0].clone()).unwrap();
    assert!(next.id > 1717171717171);
}

#[test]
fn missing_and_blank_documents_read_as_empty() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = JsonFileStore::<Echo>::open(tmp.path()).unwrap();
    assert!(store.all().unwrap().is_empty());

    std::fs::write(tmp.path().join("echoes.json"), "  \n").unwrap();
    assert!(store.is_empty().unwrap());
    assert!(store.get_by_id(1).unwrap().is_none());
}

#[test]
fn malformed_document_is_an_error_not_an_empty_archive() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(tmp.path().join("echoes.json"), "{not json").unwrap();
    let store = JsonFileStore::<Echo>::open(tmp.path()).unwrap();

    let err = store.all().unwrap_err();
    assert!(err.to_string().contains("echoes.json"));
    assert!(store.append(echo(1)).is_err());
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("echoes.json")).unwrap(),
        "{not json"
    );
}

#[test]
fn json_backup_copies_every_document() {
    let tmp = tempfile::TempDir::new().unwrap();
    let data = tmp.path().join("data");
    let config = storage(&data, StorageBackend::Json);
    let collections = Collections::open(&config).unwrap();
    collections.echoes.append(echo(3)).unwrap();

    let (dir, files) = store::backup(&config, &tmp.path().join("backups")).unwrap();
    assert_eq!(files.len(), 3);
    for name in ["entries.json", "echoes.json", "ghost-threads.json"] {
        assert!(dir.join(name).exists(), "{name} missing from backup");
    }
    assert_eq!(
        std::fs::read_to_string(dir.join("echoes.json")).unwrap(),
        std::fs::read_to_string(data.join("echoes.json")).unwrap()
    );
}

#[test]
fn sqlite_backup_snapshots_every_database() {
    let tmp = tempfile::TempDir::new().unwrap();
    let data = tmp.path().join("data");
    let config = storage(&data, StorageBackend::Sqlite);
    let collections = Collections::open(&config).unwrap();
    let stored = collections.echoes.append(echo(9)).unwrap();

    let (dir, files) = store::backup(&config, &tmp.path().join("backups")).unwrap();
    assert_eq!(files.len(), 3);

    let copy = SqliteStore::<Echo>::open(&dir).unwrap();
    assert_eq!(copy.get_by_id(stored.id).unwrap().unwrap().results, vec![9]);
}

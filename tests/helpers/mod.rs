#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use resonance_archive::archive::Archive;
use resonance_archive::config::{RetrievalConfig, StorageBackend, StorageConfig};
use resonance_archive::embedding::EmbeddingProvider;
use resonance_archive::store::Collections;

pub const DIM: usize = 5;

/// Generate a deterministic embedding with a spike at position `seed`.
/// Distinct seeds (mod `DIM`) are orthogonal.
pub fn test_embedding(seed: u8) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[seed as usize % DIM] = 1.0;
    v
}

/// In-process provider: returns the vector scripted for a text, or a spike
/// derived from the text length otherwise. Counts calls and can be switched
/// into a failing or hanging mode.
#[derive(Default)]
pub struct ScriptedProvider {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    calls: AtomicUsize,
    failing: AtomicBool,
    hanging: AtomicBool,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, text: &str, vector: Vec<f32>) {
        self.vectors.lock().unwrap().insert(text.to_string(), vector);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("scripted provider failure");
        }
        let scripted = self.vectors.lock().unwrap().get(text).cloned();
        Ok(scripted.unwrap_or_else(|| test_embedding(text.len() as u8)))
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub fn archive_with(collections: Collections, provider: Arc<ScriptedProvider>) -> Archive {
    Archive::new(
        collections,
        provider,
        RetrievalConfig::default(),
        Duration::from_secs(5),
    )
}

/// Archive over in-memory collections.
pub fn memory_archive(provider: Arc<ScriptedProvider>) -> Archive {
    archive_with(Collections::in_memory(), provider)
}

pub fn storage(dir: &Path, backend: StorageBackend) -> StorageConfig {
    StorageConfig {
        backend,
        data_dir: dir.to_string_lossy().into_owned(),
    }
}

/// Archive over flat JSON documents in `dir`.
pub fn json_archive(dir: &Path, provider: Arc<ScriptedProvider>) -> Archive {
    let collections = Collections::open(&storage(dir, StorageBackend::Json)).unwrap();
    archive_with(collections, provider)
}

/// Script `text` to `vector` and ingest it. Returns the new entry id.
pub async fn ingest(archive: &Archive, provider: &ScriptedProvider, text: &str, vector: Vec<f32>) -> u64 {
    provider.script(text, vector);
    archive.submit_input(text, "text").await.unwrap().id
}

//! The archive engine: ingestion, resonance search, lineage and reflections.
//!
//! [`Archive`] is the single façade the HTTP layer, the CLI and the
//! [`curator::GhostCurator`] go through. It owns the three collections, the
//! embedding provider and the classifier, and wraps every synchronous store
//! call in `spawn_blocking` so request handlers never block the runtime.

pub mod curator;
pub mod emotion;
pub mod lineage;
pub mod similarity;
pub mod stats;
pub mod types;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::config::{ArchiveConfig, RetrievalConfig};
use crate::embedding::{EmbeddingProvider, MIN_EMBEDDING_DIM};
use crate::error::{ArchiveError, Result, StoreError};
use crate::store::{Collections, ResonanceStore};

use emotion::EmotionClassifier;
use lineage::LineageTrace;
use similarity::SearchParams;
use stats::ArchiveStats;
use types::{Echo, EchoTrace, EmotionDetails, Entry, EntryKind, Reflection, ResonantEntry};

/// Response to a successful ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub id: u64,
    pub embedding: Vec<f32>,
    pub emotion: String,
    pub emotion_details: EmotionDetails,
}

/// Response to a public resonance search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<ResonantEntry>,
}

pub struct Archive {
    collections: Collections,
    embedder: Arc<dyn EmbeddingProvider>,
    classifier: EmotionClassifier,
    retrieval: RetrievalConfig,
    embed_timeout: Duration,
}

impl Archive {
    pub fn new(
        collections: Collections,
        embedder: Arc<dyn EmbeddingProvider>,
        retrieval: RetrievalConfig,
        embed_timeout: Duration,
    ) -> Self {
        Self {
            collections,
            embedder,
            classifier: EmotionClassifier::default(),
            retrieval,
            embed_timeout,
        }
    }

    /// Open the configured collections and embedding provider.
    pub fn open(config: &ArchiveConfig) -> anyhow::Result<Self> {
        let collections = Collections::open(&config.storage)
            .with_context(|| format!("failed to open collections in {}", config.storage.data_dir))?;
        let provider = crate::embedding::create_provider(&config.embedding)?;
        tracing::info!(
            model = provider.model(),
            dimensions = provider.dimensions(),
            "embedding provider ready"
        );

        Ok(Self::new(
            collections,
            Arc::from(provider),
            config.retrieval.clone(),
            config.embedding.timeout(),
        ))
    }

    /// Replace the default archetype registry.
    pub fn with_classifier(mut self, classifier: EmotionClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    /// Embed, classify and append one piece of content.
    ///
    /// `kind` is the wire value of the `type` field; only `"text"` is accepted.
    /// Nothing is persisted unless every step succeeds.
    pub async fn submit_input(&self, content: &str, kind: &str) -> Result<SubmitResponse> {
        let kind: EntryKind = kind.parse().map_err(ArchiveError::Validation)?;
        if content.trim().is_empty() {
            return Err(ArchiveError::Validation("content is required".into()));
        }

        let embedding = self.embed(content).await?;
        let classification = self.classifier.classify(&embedding);
        let now = Utc::now();

        let entry = Entry {
            id: 0,
            content: content.to_string(),
            kind,
            embedding,
            emotion: classification.primary.clone(),
            emotion_details: classification.details(),
            echo_trace: Some(EchoTrace {
                timestamp: now,
                resonance_score: classification.dimensions.resonance,
                emotional_context: classification.dimensions,
            }),
            timestamp: now,
        };

        let store = Arc::clone(&self.collections.entries);
        let stored = blocking(move || store.append(entry)).await?;

        tracing::info!(
            id = stored.id,
            emotion = %stored.emotion,
            confidence = classification.confidence,
            "entry archived"
        );

        Ok(SubmitResponse {
            success: true,
            id: stored.id,
            embedding: stored.embedding,
            emotion: stored.emotion,
            emotion_details: stored.emotion_details,
        })
    }

    /// Public resonance search: entries strictly above the resonance
    /// threshold, best first. Every call appends one [`Echo`].
    pub async fn find_resonance(&self, embedding: Vec<f32>) -> Result<SearchResponse> {
        if embedding.is_empty() {
            return Err(ArchiveError::Validation("embedding is required".into()));
        }
        let expected = self.embedder.dimensions();
        if embedding.len() != expected {
            return Err(ArchiveError::Validation(format!(
                "embedding has {} dimensions, expected {expected}",
                embedding.len()
            )));
        }
        if !all_finite(&embedding) {
            return Err(ArchiveError::Validation(
                "embedding must contain only finite numbers".into(),
            ));
        }

        let params = SearchParams::new(
            self.retrieval.resonance_threshold,
            self.retrieval.max_results,
        )
        .strict();
        let results = self.rank(embedding.clone(), params).await?;

        let echo = Echo {
            id: 0,
            source_embedding: embedding,
            results: results.iter().map(|r| r.entry.id).collect(),
            timestamp: Utc::now(),
        };
        let store = Arc::clone(&self.collections.echoes);
        let echo = blocking(move || store.append(echo)).await?;

        tracing::info!(echo = echo.id, results = results.len(), "resonance search");
        Ok(SearchResponse {
            success: true,
            results,
        })
    }

    /// Entries resonant with entry `id`, in chronological order.
    pub async fn trace_lineage(&self, id: u64) -> Result<LineageTrace> {
        lineage::trace(self, id).await
    }

    /// Curator reflections, newest first. `limit` of `None` returns all.
    pub async fn ghost_threads(&self, limit: Option<usize>) -> Result<Vec<Reflection>> {
        let store = Arc::clone(&self.collections.reflections);
        let mut reflections = blocking(move || store.all()).await?;
        reflections.reverse();
        if let Some(limit) = limit {
            reflections.truncate(limit);
        }
        Ok(reflections)
    }

    pub async fn get_entry(&self, id: u64) -> Result<Option<Entry>> {
        let store = Arc::clone(&self.collections.entries);
        Ok(blocking(move || store.get_by_id(id)).await?)
    }

    pub async fn stats(&self) -> Result<ArchiveStats> {
        let collections = self.collections.clone();
        let stats = blocking(move || {
            let entries = collections.entries.all()?;
            let echoes = collections.echoes.len()?;
            let reflections = collections.reflections.len()?;
            Ok(stats::compute_stats(&entries, echoes, reflections))
        })
        .await?;
        Ok(stats)
    }

    /// Call the provider under the configured timeout.
    pub(crate) async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = match tokio::time::timeout(self.embed_timeout, self.embedder.embed(text)).await {
            Ok(Ok(embedding)) => embedding,
            Ok(Err(e)) => {
                tracing::error!(model = self.embedder.model(), error = %format!("{e:#}"), "embedding failed");
                return Err(ArchiveError::Provider(format!("{e:#}")));
            }
            Err(_) => {
                tracing::error!(model = self.embedder.model(), timeout = ?self.embed_timeout, "embedding timed out");
                return Err(ArchiveError::Timeout(self.embed_timeout));
            }
        };

        if embedding.len() < MIN_EMBEDDING_DIM {
            return Err(ArchiveError::Provider(format!(
                "embedding has {} dimensions, need at least {MIN_EMBEDDING_DIM}",
                embedding.len()
            )));
        }
        if !all_finite(&embedding) {
            tracing::error!(model = self.embedder.model(), "embedding has non-finite components");
            return Err(ArchiveError::Provider("embedding has non-finite components".into()));
        }
        Ok(embedding)
    }

    /// Rank the current entry snapshot against `query`. Records nothing.
    pub(crate) async fn rank(&self, query: Vec<f32>, params: SearchParams) -> Result<Vec<ResonantEntry>> {
        let store = Arc::clone(&self.collections.entries);
        let ranked = blocking(move || {
            let entries = store.all()?;
            Ok(similarity::search(entries, &query, &params))
        })
        .await?;
        Ok(ranked)
    }

    pub(crate) async fn sample_entry(&self, rng: Arc<Mutex<StdRng>>) -> Result<Option<Entry>> {
        let store = Arc::clone(&self.collections.entries);
        let sampled = blocking(move || {
            let mut rng = rng.lock().map_err(|_| StoreError::Poisoned("curator rng"))?;
            store.sample(&mut *rng)
        })
        .await?;
        Ok(sampled)
    }

    pub(crate) async fn append_reflection(&self, reflection: Reflection) -> Result<Reflection> {
        let store = Arc::clone(&self.collections.reflections);
        Ok(blocking(move || store.append(reflection)).await?)
    }
}

/// Non-finite floats serialize as JSON `null` and could not be read back.
fn all_finite(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Run a synchronous store operation on the blocking pool.
async fn blocking<T, F>(f: F) -> std::result::Result<T, StoreError>
where
    F: FnOnce() -> std::result::Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
}

//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait and an implementation backed by an
//! OpenAI-compatible `/embeddings` endpoint. The provider is created via
//! [`create_provider`] from configuration.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

/// Smallest dimensionality the archive accepts. The emotion classifier reads
/// the first five components of every vector.
pub const MIN_EMBEDDING_DIM: usize = 5;

/// Trait for embedding text into vectors.
///
/// Implementations produce vectors of exactly [`EmbeddingProvider::dimensions`]
/// components. Calls may block on the network for an unbounded time; callers
/// bound them with a timeout.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize;

    /// Identifier of the underlying model, for logs.
    fn model(&self) -> &str;
}

/// Create an embedding provider from config.
///
/// Currently only `"openai"` is supported (any OpenAI-compatible endpoint).
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    anyhow::ensure!(
        config.dimensions >= MIN_EMBEDDING_DIM,
        "embedding dimensions must be at least {MIN_EMBEDDING_DIM}, got {}",
        config.dimensions
    );
    match config.provider.as_str() {
        "openai" => {
            let provider = openai::OpenAiEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: openai"),
    }
}

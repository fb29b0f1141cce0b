//! Docsage Embed — query embedding backends.
//!
//! Provides the `Embedder` trait for turning query text into a dense
//! vector. The remote backend calls an OpenAI-compatible embeddings
//! endpoint; without an API key, `NoopEmbedder` is used and retrieval
//! falls back to keyword-only.

pub mod remote;

pub use remote::RemoteEmbedder;

use std::sync::Arc;

use async_trait::async_trait;
use ndarray::Array1;

use docsage_core::Result;

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a text string.
    async fn embed(&self, text: &str) -> Result<Array1<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Check if the embedder can serve requests.
    fn is_available(&self) -> bool;
}

/// Placeholder embedder used when no backend is configured (keyword-only mode).
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl Embedder for NoopEmbedder {
    async fn embed(&self, _text: &str) -> Result<Array1<f32>> {
        Err(docsage_core::Error::Upstream(
            "no embedding backend configured".into(),
        ))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Create the best available embedder for the given model and dimension.
///
/// Uses the remote backend when `OPENAI_API_KEY` is set, otherwise falls
/// back to `NoopEmbedder` (keyword-only search).
pub fn create_embedder(model: &str, dim: usize) -> Arc<dyn Embedder> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => {
            tracing::info!("Using remote embedder (model={}, dim={})", model, dim);
            Arc::new(RemoteEmbedder::new(key, model.to_string(), dim))
        }
        _ => {
            tracing::warn!("OPENAI_API_KEY not set. Falling back to keyword-only search.");
            Arc::new(NoopEmbedder::new(dim))
        }
    }
}

//! Configuration read once at startup from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Retrieval and memory knobs.
///
/// Constructed at process start and passed by reference into the ranker and
/// orchestrator, so tests can run with arbitrary values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Vector-leg candidate pool size.
    pub topk_vector: usize,
    /// Keyword-leg candidate pool size.
    pub topk_fts: usize,
    /// Final candidate count handed to the answerer.
    pub topk_final: usize,
    /// Weight of the vector leg in the blended score, in [0,1].
    pub hybrid_alpha: f64,
    /// Candidates below this blended score (after boosts) are dropped.
    pub min_relevance: f64,
    /// Additive boost for chunks from recently-cited documents.
    pub memory_doc_boost: f64,
    /// Additive boost for chunks matching the session's active product.
    pub memory_product_boost: f64,
    /// How many recent turns feed the memory-boost document list.
    pub memory_turns: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            topk_vector: 50,
            topk_fts: 50,
            topk_final: 8,
            hybrid_alpha: 0.35,
            min_relevance: 0.05,
            memory_doc_boost: 0.03,
            memory_product_boost: 0.02,
            memory_turns: 5,
        }
    }
}

impl RetrievalConfig {
    /// Read knobs from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            topk_vector: env_parse("TOPK_VECTOR", d.topk_vector),
            topk_fts: env_parse("TOPK_FTS", d.topk_fts),
            topk_final: env_parse("TOPK_FINAL", d.topk_final),
            hybrid_alpha: env_parse("HYBRID_ALPHA", d.hybrid_alpha).clamp(0.0, 1.0),
            min_relevance: env_parse("MIN_RELEVANCE", d.min_relevance),
            memory_doc_boost: env_parse("MEMORY_DOC_BOOST", d.memory_doc_boost),
            memory_product_boost: env_parse("MEMORY_PRODUCT_BOOST", d.memory_product_boost),
            memory_turns: env_parse("MEMORY_TURNS", d.memory_turns),
        }
    }
}

/// Server-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server port.
    pub port: u16,
    /// Root data directory.
    pub data_dir: PathBuf,
    /// Embedding dimension (1536 for text-embedding-3-small).
    pub embedding_dim: usize,
    /// Embedding model identifier.
    pub embed_model: String,
    /// Retrieval knobs.
    pub retrieval: RetrievalConfig,
}

impl ServerConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let embedding_dim = env_parse("EMBED_DIM", 1536);
        let embed_model = std::env::var("OPENAI_EMBED_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());

        Ok(Self {
            port,
            data_dir,
            embedding_dim,
            embed_model,
            retrieval: RetrievalConfig::from_env(),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

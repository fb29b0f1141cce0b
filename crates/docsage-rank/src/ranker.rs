//! The Hybrid Ranker: issues both retrieval legs against the passage store
//! and turns them into a ranked, deduplicated, truncated candidate set.

use std::sync::Arc;

use tracing::warn;

use docsage_core::{Error, Result, RetrievalConfig};
use docsage_embed::Embedder;
use docsage_store::SqliteStore;

use crate::blend;
use crate::types::{MemoryContext, RetrievalCandidate};

/// Two-leg retrieval with normalization, blending, memory boosts, and a
/// deterministic final ordering.
#[derive(Clone)]
pub struct HybridRanker {
    store: Arc<SqliteStore>,
    embedder: Arc<dyn Embedder>,
    config: RetrievalConfig,
}

impl HybridRanker {
    pub fn new(
        store: Arc<SqliteStore>,
        embedder: Arc<dyn Embedder>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config: config.clone(),
        }
    }

    /// Retrieve the top candidates for a query.
    ///
    /// An empty query returns an empty result without touching the store.
    /// A single failed leg degrades to an empty leg; both legs failing is a
    /// storage error. An embedding failure (when a backend is configured)
    /// propagates as `Upstream`.
    pub async fn retrieve(
        &self,
        query: &str,
        product: Option<&str>,
        memory: Option<&MemoryContext>,
        k_final: Option<usize>,
    ) -> Result<Vec<RetrievalCandidate>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let vector_active = self.embedder.is_available();
        let mut vector_failed = false;
        let vector_hits = if vector_active {
            let embedding = self.embedder.embed(query).await?;
            match self
                .store
                .vector_search(&embedding, self.config.topk_vector, product)
            {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("vector leg failed, degrading to keyword-only: {}", e);
                    vector_failed = true;
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let keyword_hits = match self.store.keyword_search(query, self.config.topk_fts, product) {
            Ok(hits) => hits,
            Err(e) => {
                if !vector_active || vector_failed {
                    return Err(Error::Storage(format!("all retrieval legs failed: {}", e)));
                }
                warn!("keyword leg failed, degrading to vector-only: {}", e);
                Vec::new()
            }
        };

        let mut candidates = blend::fuse(vector_hits, keyword_hits, self.config.hybrid_alpha);
        if let Some(memory) = memory {
            blend::apply_boosts(
                &mut candidates,
                memory,
                self.config.memory_doc_boost,
                self.config.memory_product_boost,
            );
        }

        let k = k_final.unwrap_or(self.config.topk_final);
        Ok(blend::filter_and_rank(
            candidates,
            self.config.min_relevance,
            k,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ndarray::Array1;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use docsage_store::{ChunkInsert, Document};

    const DIM: usize = 8;

    /// Maps known query strings to fixed vectors and counts calls.
    struct StaticEmbedder {
        vectors: HashMap<String, Array1<f32>>,
        calls: AtomicUsize,
    }

    impl StaticEmbedder {
        fn new(vectors: HashMap<String, Array1<f32>>) -> Self {
            Self {
                vectors,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for StaticEmbedder {
        async fn embed(&self, text: &str) -> docsage_core::Result<Array1<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .vectors
                .get(text)
                .cloned()
                .unwrap_or_else(|| Array1::ones(DIM)))
        }

        fn dimension(&self) -> usize {
            DIM
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn unit_vec(hot: usize) -> Array1<f32> {
        let mut v = Array1::zeros(DIM);
        v[hot] = 1.0;
        v
    }

    fn seeded_store(dir: &tempfile::TempDir) -> Arc<SqliteStore> {
        let store = SqliteStore::open(dir.path(), DIM).unwrap();
        store
            .add_document(&Document {
                doc_id: "commerce_guide".into(),
                doc_title: "Commerce Setup Guide".into(),
                product: Some("commerce".into()),
                filename: None,
            })
            .unwrap();
        store
            .add_document(&Document {
                doc_id: "sales_guide".into(),
                doc_title: "Sales Basics".into(),
                product: Some("sales".into()),
                filename: None,
            })
            .unwrap();

        let c1 = store
            .add_chunk(&ChunkInsert {
                doc_id: "commerce_guide",
                chunk_local_id: 0,
                section_title: Some("Managed Checkout"),
                section_level: 1,
                page_start: 3,
                page_end: 4,
                content: "Enable managed checkout for a D2C store from the commerce settings",
                product: None,
            })
            .unwrap();
        let c2 = store
            .add_chunk(&ChunkInsert {
                doc_id: "sales_guide",
                chunk_local_id: 0,
                section_title: Some("Forecasts"),
                section_level: 1,
                page_start: 10,
                page_end: 11,
                content: "Sales forecasts summarize pipeline by close date",
                product: None,
            })
            .unwrap();
        store.add_chunk_embedding(c1, &unit_vec(0)).unwrap();
        store.add_chunk_embedding(c2, &unit_vec(1)).unwrap();
        Arc::new(store)
    }

    fn ranker_for(store: Arc<SqliteStore>, query_vec: (&str, Array1<f32>)) -> HybridRanker {
        let mut vectors = HashMap::new();
        vectors.insert(query_vec.0.to_string(), query_vec.1);
        let embedder = Arc::new(StaticEmbedder::new(vectors));
        HybridRanker::new(store, embedder, &RetrievalConfig::default())
    }

    #[tokio::test]
    async fn empty_query_returns_empty_without_store_call() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = seeded_store(&dir);
        let embedder = Arc::new(StaticEmbedder::new(HashMap::new()));
        let ranker = HybridRanker::new(store, embedder.clone(), &RetrievalConfig::default());

        let out = ranker.retrieve("   ", None, None, None).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn merges_both_legs_and_ranks() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = seeded_store(&dir);
        let ranker = ranker_for(store, ("enable managed checkout", unit_vec(0)));

        let out = ranker
            .retrieve("enable managed checkout", None, None, None)
            .await
            .unwrap();
        assert!(!out.is_empty());
        assert_eq!(out[0].chunk.doc_id, "commerce_guide");
        // Found by both legs: both raw scores populated
        assert!(out[0].vector_score.is_some());
        assert!(out[0].fts_score.is_some());
    }

    #[tokio::test]
    async fn product_filter_restricts_both_legs() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = seeded_store(&dir);
        let ranker = ranker_for(store, ("checkout settings", unit_vec(0)));

        let out = ranker
            .retrieve("checkout settings", Some("sales"), None, None)
            .await
            .unwrap();
        assert!(out.iter().all(|c| c.chunk.product.as_deref() == Some("sales")));
    }

    #[tokio::test]
    async fn memory_doc_boost_lifts_recent_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = seeded_store(&dir);
        // Query vector equidistant from both chunks, no keyword overlap:
        // the blended scores tie exactly and only the boost separates them.
        let mut v = Array1::zeros(DIM);
        v[0] = 1.0;
        v[1] = 1.0;
        let ranker = ranker_for(store, ("onboarding walkthrough", v));

        let memory = MemoryContext {
            recent_doc_ids: vec!["sales_guide".into()],
            active_product: None,
        };
        let out = ranker
            .retrieve("onboarding walkthrough", None, Some(&memory), None)
            .await
            .unwrap();
        assert!(!out.is_empty());
        assert_eq!(out[0].chunk.doc_id, "sales_guide");
        assert!(out[0].boost > 0.0);
    }

    #[tokio::test]
    async fn filtered_results_respect_count_tag_and_floor() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = seeded_store(&dir);
        let config = RetrievalConfig::default();
        let ranker = ranker_for(
            store,
            ("How do I enable Managed Checkout in a D2C store?", unit_vec(0)),
        );

        let out = ranker
            .retrieve(
                "How do I enable Managed Checkout in a D2C store?",
                Some("commerce"),
                None,
                None,
            )
            .await
            .unwrap();

        assert!(!out.is_empty());
        assert!(out.len() <= config.topk_final);
        assert!(out.iter().all(|c| c.chunk.product.as_deref() == Some("commerce")));
        assert!(out.iter().all(|c| c.final_score() >= config.min_relevance));
    }

    #[tokio::test]
    async fn k_final_override_truncates() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = seeded_store(&dir);
        let ranker = ranker_for(store, ("guide", unit_vec(0)));

        let out = ranker.retrieve("guide", None, None, Some(1)).await.unwrap();
        assert!(out.len() <= 1);
    }
}

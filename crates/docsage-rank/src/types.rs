//! Transient retrieval types.

use serde::Serialize;

use docsage_store::ChunkRecord;

/// A scored retrieval candidate. Exists only for the duration of one
/// retrieval call.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalCandidate {
    #[serde(flatten)]
    pub chunk: ChunkRecord,
    /// Raw cosine similarity from the vector leg, if present there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_score: Option<f64>,
    /// Raw keyword rank from the FTS leg, if present there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fts_score: Option<f64>,
    /// Min-max normalized vector score; 0.0 when absent from that leg.
    pub vector_norm: f64,
    /// Min-max normalized keyword score; 0.0 when absent from that leg.
    pub fts_norm: f64,
    /// Weighted combination of the normalized leg scores.
    pub blended_score: f64,
    /// Additive memory-derived adjustment.
    pub boost: f64,
}

impl RetrievalCandidate {
    /// Score used for filtering and ordering.
    pub fn final_score(&self) -> f64 {
        self.blended_score + self.boost
    }
}

/// Conversational-memory signals fed into ranking.
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    /// Recently cited document ids, most-recent-first.
    pub recent_doc_ids: Vec<String>,
    /// The session's inferred active product, if established.
    pub active_product: Option<String>,
}

//! Data types for documents, chunks, search hits, and conversation records.

use serde::{Deserialize, Serialize};

/// A document row: one per source file, read-only reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub doc_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// A chunk row from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Internal rowid; stable within one store file.
    pub id: i64,
    pub doc_id: String,
    pub chunk_local_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    pub section_level: i32,
    pub page_start: i32,
    pub page_end: i32,
    pub content: String,
    /// Effective product tag (chunk tag falling back to the document's).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

/// Fields for inserting a chunk. Embeddings are attached separately.
#[derive(Debug, Clone)]
pub struct ChunkInsert<'a> {
    pub doc_id: &'a str,
    pub chunk_local_id: i64,
    pub section_title: Option<&'a str>,
    pub section_level: i32,
    pub page_start: i32,
    pub page_end: i32,
    pub content: &'a str,
    pub product: Option<&'a str>,
}

/// A single-leg search result: a chunk plus its native score.
///
/// For the vector leg the score is cosine similarity; for the keyword leg it
/// is the negated FTS5 rank (non-negative, higher is better).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: ChunkRecord,
    pub score: f64,
}

/// A session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// An append-only turn row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub id: i64,
    pub session_id: String,
    pub tstamp: i64,
    pub user_text: String,
    pub answer_text: String,
    pub used_doc_ids: Vec<String>,
    pub used_chunk_ids: Vec<i64>,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_documents: i64,
    pub total_chunks: i64,
    pub embeddings_stored: i64,
    pub embedding_dimension: usize,
    pub sessions: i64,
    pub turns: i64,
    pub db_path: String,
    pub db_size_mb: f64,
    pub matrix_loaded: bool,
    pub matrix_rows: usize,
}

//! SQLite-backed passage store with FTS5 keyword search and quantized
//! vector search, plus the durable session/turn log.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::embedding::{dequantize_uint8, quantize_uint8};
use crate::schema::{FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL, SCHEMA_SQL, SESSION_SCHEMA_SQL};
use crate::types::*;
use docsage_core::{Error, Result};

/// SQLite store exposing the two retrieval primitives (vector top-k and
/// keyword top-k, both product-filterable) and the session log.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    embedding_dim: usize,
    /// Pre-loaded normalized embedding matrix for vector search: (N, dim) float32.
    embedding_matrix: Mutex<EmbeddingMatrix>,
}

struct EmbeddingMatrix {
    /// Normalized embeddings, shape (N, dim).
    matrix: Array2<f32>,
    /// Chunk rowids corresponding to each row.
    chunk_ids: Vec<i64>,
    /// Whether the matrix needs reloading.
    dirty: bool,
}

const CHUNK_SELECT: &str = "SELECT c.id, c.doc_id, c.chunk_local_id, \
     COALESCE(c.doc_title, d.doc_title) AS doc_title, c.section_title, \
     c.section_level, c.page_start, c.page_end, c.content, \
     COALESCE(c.product, d.product) AS product \
     FROM chunks c LEFT JOIN documents d ON d.doc_id = c.doc_id";

impl SqliteStore {
    /// Open or create the store. The file will be `db_dir/docsage.db`.
    pub fn open(db_dir: impl AsRef<Path>, embedding_dim: usize) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("docsage.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            embedding_dim,
            embedding_matrix: Mutex::new(EmbeddingMatrix {
                matrix: Array2::zeros((0, embedding_dim)),
                chunk_ids: Vec::new(),
                dirty: true,
            }),
        };

        store.load_embedding_matrix()?;

        let doc_count = store.count_documents()?;
        let chunk_count = store.count_chunks()?;
        info!(
            "SqliteStore initialized: {} documents, {} chunks, dim={}, path={}",
            doc_count,
            chunk_count,
            embedding_dim,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -65536;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!(
            "{}\n{}\n{}\n{}",
            SCHEMA_SQL, FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL, SESSION_SCHEMA_SQL
        );
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Corpus loading (records arrive already chunked and embedded)
    // ---------------------------------------------------------------

    /// Insert a document row. Idempotent on `doc_id`.
    pub fn add_document(&self, doc: &Document) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT OR IGNORE INTO documents (doc_id, doc_title, product, filename) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![doc.doc_id, doc.doc_title, doc.product, doc.filename])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert a chunk. Returns the internal rowid.
    pub fn add_chunk(&self, chunk: &ChunkInsert<'_>) -> Result<i64> {
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO chunks (doc_id, chunk_local_id, section_title, section_level, \
                 page_start, page_end, content, product) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![
                chunk.doc_id,
                chunk.chunk_local_id,
                chunk.section_title,
                chunk.section_level,
                chunk.page_start,
                chunk.page_end,
                chunk.content,
                chunk.product,
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    /// Store a quantized embedding for a chunk.
    pub fn add_chunk_embedding(&self, chunk_id: i64, embedding: &Array1<f32>) -> Result<()> {
        if embedding.len() != self.embedding_dim {
            return Err(Error::InvalidInput(format!(
                "embedding dimension {} does not match store dimension {}",
                embedding.len(),
                self.embedding_dim
            )));
        }
        let (q_bytes, scale, offset) = quantize_uint8(embedding);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO chunk_embeddings (chunk_id, embedding, scale, offset_val) \
             VALUES (?1, ?2, ?3, ?4)",
            params![chunk_id, q_bytes, scale, offset],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);
        self.embedding_matrix.lock().dirty = true;
        Ok(())
    }

    /// Get a chunk by rowid.
    pub fn get_chunk(&self, chunk_id: i64) -> Result<Option<ChunkRecord>> {
        let conn = self.conn.lock();
        let sql = format!("{} WHERE c.id = ?1", CHUNK_SELECT);
        let row = conn
            .prepare_cached(&sql)
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![chunk_id], |row| Ok(Self::row_to_chunk(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Count total documents.
    pub fn count_documents(&self) -> Result<i64> {
        self.scalar("SELECT COUNT(*) FROM documents")
    }

    /// Count total chunks.
    pub fn count_chunks(&self) -> Result<i64> {
        self.scalar("SELECT COUNT(*) FROM chunks")
    }

    fn scalar(&self, sql: &str) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(sql, [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ---------------------------------------------------------------
    // Keyword search (FTS5)
    // ---------------------------------------------------------------

    /// Keyword top-k using FTS5 BM25 ranking, optionally product-filtered.
    ///
    /// Scores are the negated FTS5 rank: non-negative, higher is better.
    pub fn keyword_search(
        &self,
        query: &str,
        top_k: usize,
        product: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        let fts_query = Self::sanitize_fts_query(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let base = "SELECT c.id, c.doc_id, c.chunk_local_id, \
             COALESCE(c.doc_title, d.doc_title) AS doc_title, c.section_title, \
             c.section_level, c.page_start, c.page_end, c.content, \
             COALESCE(c.product, d.product) AS product, \
             chunks_fts.rank AS fts_rank \
             FROM chunks_fts \
             JOIN chunks c ON c.id = chunks_fts.rowid \
             LEFT JOIN documents d ON d.doc_id = c.doc_id \
             WHERE chunks_fts MATCH ?1";

        let map_row = |row: &rusqlite::Row<'_>| {
            let rank: f64 = row.get("fts_rank").unwrap_or(0.0);
            Ok(SearchHit {
                chunk: Self::row_to_chunk(row),
                // FTS5 rank is negative (more negative = better); negate
                score: (-rank).max(0.0),
            })
        };

        let hits = match product {
            Some(p) => {
                let sql = format!(
                    "{} AND COALESCE(c.product, d.product) = ?2 \
                     ORDER BY chunks_fts.rank LIMIT ?3",
                    base
                );
                let mut stmt = conn
                    .prepare_cached(&sql)
                    .map_err(|e| Error::Database(e.to_string()))?;
                let rows = stmt
                    .query_map(params![fts_query, p, top_k as i64], map_row)
                    .map_err(|e| Error::Database(e.to_string()))?;
                rows.filter_map(|r| r.ok()).collect()
            }
            None => {
                let sql = format!("{} ORDER BY chunks_fts.rank LIMIT ?2", base);
                let mut stmt = conn
                    .prepare_cached(&sql)
                    .map_err(|e| Error::Database(e.to_string()))?;
                let rows = stmt
                    .query_map(params![fts_query, top_k as i64], map_row)
                    .map_err(|e| Error::Database(e.to_string()))?;
                rows.filter_map(|r| r.ok()).collect()
            }
        };

        Ok(hits)
    }

    /// Sanitize a user query for FTS5 MATCH syntax.
    /// Wraps each token in double quotes and joins with OR.
    fn sanitize_fts_query(query: &str) -> String {
        let tokens: Vec<String> = query
            .split_whitespace()
            .filter(|t| !t.is_empty())
            .map(|t| format!("\"{}\"", t.replace('"', "")))
            .collect();
        if tokens.is_empty() {
            return String::new();
        }
        tokens.join(" OR ")
    }

    // ---------------------------------------------------------------
    // Vector search
    // ---------------------------------------------------------------

    /// Load and normalize all chunk embeddings into a matrix for fast search.
    fn load_embedding_matrix(&self) -> Result<()> {
        let mut chunk_ids = Vec::new();
        let mut embeddings: Vec<Array1<f32>> = Vec::new();

        {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare("SELECT chunk_id, embedding, scale, offset_val FROM chunk_embeddings")
                .map_err(|e| Error::Database(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    let chunk_id: i64 = row.get(0)?;
                    let blob: Vec<u8> = row.get(1)?;
                    let scale: f64 = row.get(2)?;
                    let offset: f64 = row.get(3)?;
                    Ok((chunk_id, blob, scale as f32, offset as f32))
                })
                .map_err(|e| Error::Database(e.to_string()))?;

            for row in rows {
                let (cid, blob, scale, offset) =
                    row.map_err(|e| Error::Database(e.to_string()))?;
                chunk_ids.push(cid);
                embeddings.push(dequantize_uint8(&blob, scale, offset));
            }
        }

        let mut mat = self.embedding_matrix.lock();
        if embeddings.is_empty() {
            mat.matrix = Array2::zeros((0, self.embedding_dim));
            mat.chunk_ids = Vec::new();
            mat.dirty = false;
            return Ok(());
        }

        let n = embeddings.len();
        let mut matrix = Array2::zeros((n, self.embedding_dim));
        for (i, emb) in embeddings.iter().enumerate() {
            matrix.row_mut(i).assign(emb);
        }

        // Normalize rows so cosine similarity is a dot product
        for mut row in matrix.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 1e-9 {
                row /= norm;
            }
        }

        mat.matrix = matrix;
        mat.chunk_ids = chunk_ids;
        mat.dirty = false;
        debug!("Loaded {} embeddings into matrix", n);
        Ok(())
    }

    fn ensure_matrix_loaded(&self) -> Result<()> {
        if self.embedding_matrix.lock().dirty {
            self.load_embedding_matrix()?;
        }
        Ok(())
    }

    /// Cosine-similarity top-k over the pre-loaded normalized matrix,
    /// optionally restricted to a product tag.
    pub fn vector_search(
        &self,
        query_embedding: &Array1<f32>,
        top_k: usize,
        product: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        self.ensure_matrix_loaded()?;

        let ranked: Vec<(i64, f64)> = {
            let mat = self.embedding_matrix.lock();
            if mat.matrix.nrows() == 0 {
                return Ok(Vec::new());
            }

            let q_norm = query_embedding.dot(query_embedding).sqrt();
            if q_norm < 1e-9 {
                return Ok(Vec::new());
            }
            let q = query_embedding / q_norm;

            // (N, dim) @ (dim,) → (N,)
            let similarities = mat.matrix.dot(&q);
            let mut indexed: Vec<(usize, f32)> =
                similarities.iter().enumerate().map(|(i, &s)| (i, s)).collect();
            indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

            indexed
                .into_iter()
                .map(|(i, s)| (mat.chunk_ids[i], s as f64))
                .collect()
        };

        // Walk similarity order, applying the product filter until k hits
        let mut results = Vec::with_capacity(top_k);
        for (cid, score) in ranked {
            if results.len() >= top_k {
                break;
            }
            let chunk = match self.get_chunk(cid)? {
                Some(c) => c,
                None => continue,
            };
            if let Some(p) = product {
                if chunk.product.as_deref() != Some(p) {
                    continue;
                }
            }
            results.push(SearchHit { chunk, score });
        }
        Ok(results)
    }

    // ---------------------------------------------------------------
    // Products
    // ---------------------------------------------------------------

    /// Distinct non-empty product tags, ascending.
    pub fn list_products(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT DISTINCT COALESCE(c.product, d.product) AS product \
                 FROM chunks c LEFT JOIN documents d ON d.doc_id = c.doc_id \
                 WHERE COALESCE(c.product, d.product) IS NOT NULL \
                   AND COALESCE(c.product, d.product) <> '' \
                 ORDER BY product ASC",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Product tags for a set of document ids, in the order given.
    pub fn products_for_docs(&self, doc_ids: &[String]) -> Result<Vec<Option<String>>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT product FROM documents WHERE doc_id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?;
        let mut out = Vec::with_capacity(doc_ids.len());
        for doc_id in doc_ids {
            let product: Option<String> = stmt
                .query_row(params![doc_id], |row| row.get(0))
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?
                .flatten();
            out.push(product);
        }
        Ok(out)
    }

    // ---------------------------------------------------------------
    // Sessions and turns
    // ---------------------------------------------------------------

    /// Return the session row, creating an empty one if absent. Idempotent.
    pub fn ensure_session(&self, session_id: &str) -> Result<SessionRecord> {
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT OR IGNORE INTO sessions (session_id, created_at, summary) \
             VALUES (?1, ?2, NULL)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![session_id, now])
        .map_err(|e| Error::Database(e.to_string()))?;

        let record = conn
            .prepare_cached("SELECT session_id, created_at, summary FROM sessions WHERE session_id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![session_id], |row| {
                Ok(SessionRecord {
                    session_id: row.get(0)?,
                    created_at: row.get(1)?,
                    summary: row.get(2)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()));
        record
    }

    /// Append a turn and update the rolling summary in one transaction.
    ///
    /// The session row is created if missing, so a turn is either fully
    /// recorded or not recorded at all.
    pub fn insert_turn(
        &self,
        session_id: &str,
        user_text: &str,
        answer_text: &str,
        used_doc_ids: &[String],
        used_chunk_ids: &[i64],
        summary: Option<&str>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let doc_ids_json = serde_json::to_string(used_doc_ids)?;
        let chunk_ids_json = serde_json::to_string(used_chunk_ids)?;

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;

        tx.execute(
            "INSERT OR IGNORE INTO sessions (session_id, created_at, summary) \
             VALUES (?1, ?2, NULL)",
            params![session_id, now],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO turns (session_id, tstamp, user_text, answer_text, \
             used_doc_ids, used_chunk_ids) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![session_id, now, user_text, answer_text, doc_ids_json, chunk_ids_json],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        if let Some(s) = summary {
            tx.execute(
                "UPDATE sessions SET summary = ?1 WHERE session_id = ?2",
                params![s, session_id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        }

        tx.commit().map_err(|e| Error::Database(e.to_string()))
    }

    /// Most recent turns for a session, newest first.
    pub fn recent_turns(&self, session_id: &str, n: usize) -> Result<Vec<TurnRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, session_id, tstamp, user_text, answer_text, \
                 used_doc_ids, used_chunk_ids FROM turns \
                 WHERE session_id = ?1 ORDER BY tstamp DESC, id DESC LIMIT ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![session_id, n as i64], |row| {
                let doc_ids_json: String = row.get(5)?;
                let chunk_ids_json: String = row.get(6)?;
                Ok(TurnRecord {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    tstamp: row.get(2)?,
                    user_text: row.get(3)?,
                    answer_text: row.get(4)?,
                    used_doc_ids: serde_json::from_str(&doc_ids_json).unwrap_or_default(),
                    used_chunk_ids: serde_json::from_str(&chunk_ids_json).unwrap_or_default(),
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Document ids cited across the last `turn_limit` turns,
    /// de-duplicated, most-recent-first.
    pub fn recent_doc_ids(&self, session_id: &str, turn_limit: usize) -> Result<Vec<String>> {
        let turns = self.recent_turns(session_id, turn_limit)?;
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for turn in turns {
            for doc_id in turn.used_doc_ids {
                if seen.insert(doc_id.clone()) {
                    out.push(doc_id);
                }
            }
        }
        Ok(out)
    }

    fn count_for_session(&self) -> Result<(i64, i64)> {
        Ok((
            self.scalar("SELECT COUNT(*) FROM sessions")?,
            self.scalar("SELECT COUNT(*) FROM turns")?,
        ))
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    /// Get store statistics.
    pub fn get_stats(&self) -> Result<StoreStats> {
        let doc_count = self.count_documents()?;
        let chunk_count = self.count_chunks()?;
        let emb_count = self.scalar("SELECT COUNT(*) FROM chunk_embeddings")?;
        let (sessions, turns) = self.count_for_session()?;

        let db_size = std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);

        let mat = self.embedding_matrix.lock();
        let matrix_rows = mat.matrix.nrows();

        Ok(StoreStats {
            total_documents: doc_count,
            total_chunks: chunk_count,
            embeddings_stored: emb_count,
            embedding_dimension: self.embedding_dim,
            sessions,
            turns,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
            matrix_loaded: matrix_rows > 0,
            matrix_rows,
        })
    }

    // ---------------------------------------------------------------
    // Row mapping
    // ---------------------------------------------------------------

    fn row_to_chunk(row: &rusqlite::Row<'_>) -> ChunkRecord {
        ChunkRecord {
            id: row.get("id").unwrap_or(0),
            doc_id: row.get("doc_id").unwrap_or_default(),
            chunk_local_id: row.get("chunk_local_id").unwrap_or(0),
            doc_title: row.get("doc_title").ok().flatten(),
            section_title: row.get("section_title").ok().flatten(),
            section_level: row.get("section_level").unwrap_or(1),
            page_start: row.get("page_start").unwrap_or(1),
            page_end: row.get("page_end").unwrap_or(1),
            content: row.get("content").unwrap_or_default(),
            product: row.get("product").ok().flatten(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DIM: usize = 8;

    fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path(), DIM).unwrap();
        (store, dir)
    }

    fn add_doc(store: &SqliteStore, doc_id: &str, title: &str, product: Option<&str>) {
        store
            .add_document(&Document {
                doc_id: doc_id.into(),
                doc_title: title.into(),
                product: product.map(String::from),
                filename: Some(format!("{}.pdf", doc_id)),
            })
            .unwrap();
    }

    fn add_chunk(
        store: &SqliteStore,
        doc_id: &str,
        local_id: i64,
        content: &str,
        product: Option<&str>,
    ) -> i64 {
        store
            .add_chunk(&ChunkInsert {
                doc_id,
                chunk_local_id: local_id,
                section_title: Some("Overview"),
                section_level: 1,
                page_start: 1,
                page_end: 2,
                content,
                product,
            })
            .unwrap()
    }

    fn unit_vec(hot: usize) -> Array1<f32> {
        let mut v = Array1::zeros(DIM);
        v[hot] = 1.0;
        v
    }

    #[test]
    fn test_keyword_search_ranks_matching_chunk() {
        let (store, _dir) = test_store();
        add_doc(&store, "guide", "Setup Guide", None);
        add_chunk(&store, "guide", 0, "Enable managed checkout for your storefront", None);
        add_chunk(&store, "guide", 1, "Configure shipping rates and tax rules", None);

        let hits = store.keyword_search("managed checkout", 10, None).unwrap();
        assert!(!hits.is_empty());
        assert!(hits[0].chunk.content.contains("checkout"));
        assert!(hits[0].score >= 0.0);
    }

    #[test]
    fn test_keyword_search_product_filter() {
        let (store, _dir) = test_store();
        add_doc(&store, "commerce_doc", "Commerce", Some("commerce"));
        add_doc(&store, "sales_doc", "Sales", Some("sales"));
        add_chunk(&store, "commerce_doc", 0, "checkout settings for stores", None);
        add_chunk(&store, "sales_doc", 0, "checkout reports for managers", None);

        // Chunk product is NULL, so the document's product applies
        let hits = store.keyword_search("checkout", 10, Some("commerce")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.doc_id, "commerce_doc");
        assert_eq!(hits[0].chunk.product.as_deref(), Some("commerce"));
    }

    #[test]
    fn test_keyword_search_empty_query() {
        let (store, _dir) = test_store();
        assert!(store.keyword_search("", 10, None).unwrap().is_empty());
    }

    #[test]
    fn test_vector_search_orders_by_similarity() {
        let (store, _dir) = test_store();
        add_doc(&store, "d", "Doc", None);
        let c1 = add_chunk(&store, "d", 0, "first chunk", None);
        let c2 = add_chunk(&store, "d", 1, "second chunk", None);
        store.add_chunk_embedding(c1, &unit_vec(0)).unwrap();
        store.add_chunk_embedding(c2, &unit_vec(1)).unwrap();

        let hits = store.vector_search(&unit_vec(0), 2, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, c1);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_vector_search_product_filter() {
        let (store, _dir) = test_store();
        add_doc(&store, "a", "A", Some("commerce"));
        add_doc(&store, "b", "B", Some("sales"));
        let c1 = add_chunk(&store, "a", 0, "alpha", None);
        let c2 = add_chunk(&store, "b", 0, "beta", None);
        store.add_chunk_embedding(c1, &unit_vec(0)).unwrap();
        store.add_chunk_embedding(c2, &unit_vec(0)).unwrap();

        let hits = store.vector_search(&unit_vec(0), 5, Some("sales")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.doc_id, "b");
    }

    #[test]
    fn test_vector_search_zero_query() {
        let (store, _dir) = test_store();
        add_doc(&store, "d", "Doc", None);
        let c = add_chunk(&store, "d", 0, "content", None);
        store.add_chunk_embedding(c, &unit_vec(0)).unwrap();
        let hits = store.vector_search(&Array1::zeros(DIM), 5, None).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_embedding_dimension_mismatch() {
        let (store, _dir) = test_store();
        add_doc(&store, "d", "Doc", None);
        let c = add_chunk(&store, "d", 0, "content", None);
        let wrong = Array1::zeros(DIM + 1);
        assert!(matches!(
            store.add_chunk_embedding(c, &wrong),
            Err(docsage_core::Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_list_products() {
        let (store, _dir) = test_store();
        add_doc(&store, "a", "A", Some("sales"));
        add_doc(&store, "b", "B", Some("commerce"));
        add_doc(&store, "c", "C", None);
        add_chunk(&store, "a", 0, "x", None);
        add_chunk(&store, "b", 0, "y", None);
        // Chunk-level tag overrides the document's missing one
        add_chunk(&store, "c", 0, "z", Some("analytics"));

        let products = store.list_products().unwrap();
        assert_eq!(products, vec!["analytics", "commerce", "sales"]);
    }

    #[test]
    fn test_chunk_identity_unique() {
        let (store, _dir) = test_store();
        add_doc(&store, "d", "Doc", None);
        add_chunk(&store, "d", 0, "one", None);
        let dup = store.add_chunk(&ChunkInsert {
            doc_id: "d",
            chunk_local_id: 0,
            section_title: None,
            section_level: 1,
            page_start: 1,
            page_end: 1,
            content: "two",
            product: None,
        });
        assert!(dup.is_err());
    }

    #[test]
    fn test_page_invariant_enforced() {
        let (store, _dir) = test_store();
        add_doc(&store, "d", "Doc", None);
        let bad = store.add_chunk(&ChunkInsert {
            doc_id: "d",
            chunk_local_id: 0,
            section_title: None,
            section_level: 1,
            page_start: 3,
            page_end: 2,
            content: "pages out of order",
            product: None,
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_session_roundtrip_most_recent_first() {
        let (store, _dir) = test_store();
        store.ensure_session("s1").unwrap();
        store
            .insert_turn("s1", "q1", "a1", &["docA".into()], &[1], None)
            .unwrap();
        store
            .insert_turn("s1", "q2", "a2", &["docB".into(), "docA".into()], &[2, 3], None)
            .unwrap();

        let docs = store.recent_doc_ids("s1", 5).unwrap();
        assert_eq!(docs, vec!["docB".to_string(), "docA".to_string()]);

        let turns = store.recent_turns("s1", 5).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].user_text, "q2");
        assert_eq!(turns[1].user_text, "q1");
    }

    #[test]
    fn test_ensure_session_idempotent() {
        let (store, _dir) = test_store();
        let first = store.ensure_session("s").unwrap();
        store
            .insert_turn("s", "q", "a", &[], &[], Some("talking about commerce"))
            .unwrap();
        let second = store.ensure_session("s").unwrap();
        assert_eq!(first.session_id, second.session_id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.summary.as_deref(), Some("talking about commerce"));
    }

    #[test]
    fn test_turn_records_updated_summary() {
        let (store, _dir) = test_store();
        store
            .insert_turn("s", "q", "a", &[], &[], Some("first"))
            .unwrap();
        store
            .insert_turn("s", "q2", "a2", &[], &[], Some("second"))
            .unwrap();
        let session = store.ensure_session("s").unwrap();
        assert_eq!(session.summary.as_deref(), Some("second"));
    }

    #[test]
    fn test_stats() {
        let (store, _dir) = test_store();
        add_doc(&store, "d", "Doc", None);
        let c = add_chunk(&store, "d", 0, "content", None);
        store.add_chunk_embedding(c, &unit_vec(0)).unwrap();
        store.insert_turn("s", "q", "a", &[], &[], None).unwrap();

        let stats = store.get_stats().unwrap();
        assert_eq!(stats.total_documents, 1);
        assert_eq!(stats.total_chunks, 1);
        assert_eq!(stats.embeddings_stored, 1);
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.turns, 1);
        assert_eq!(stats.embedding_dimension, DIM);
    }

    #[test]
    fn test_products_for_docs() {
        let (store, _dir) = test_store();
        add_doc(&store, "a", "A", Some("commerce"));
        add_doc(&store, "b", "B", None);
        let products = store
            .products_for_docs(&["a".into(), "b".into(), "missing".into()])
            .unwrap();
        assert_eq!(
            products,
            vec![Some("commerce".to_string()), None, None]
        );
    }
}

//! Docsage Memory — the durable per-session conversational record.
//!
//! The orchestrator depends on this capability through the narrow
//! `SessionMemory` trait, so tests can substitute a double without touching
//! ranking logic. Memory is an enhancement: callers degrade to "no memory
//! context" when operations fail.

use std::collections::HashMap;
use std::sync::Arc;

use docsage_core::Result;
use docsage_store::{SessionRecord, SqliteStore, TurnRecord};

/// A completed exchange to be appended to a session.
#[derive(Debug, Clone)]
pub struct NewTurn<'a> {
    pub session_id: &'a str,
    pub user_text: &'a str,
    pub answer_text: &'a str,
    pub used_doc_ids: &'a [String],
    pub used_chunk_ids: &'a [i64],
    /// Replacement rolling summary for the session, if any.
    pub summary: Option<&'a str>,
}

/// Narrow session-memory capability.
pub trait SessionMemory: Send + Sync {
    /// Return existing session state or create a new empty one. Idempotent.
    fn get_or_create(&self, session_id: &str) -> Result<SessionRecord>;

    /// The most recent non-null product associated with the session's turns.
    fn infer_active_product(&self, session_id: &str) -> Result<Option<String>>;

    /// Append a turn atomically: fully recorded or not recorded at all.
    fn record_turn(&self, turn: &NewTurn<'_>) -> Result<()>;

    /// Recently used document ids, de-duplicated, most-recent-first.
    fn recent_doc_ids(&self, session_id: &str, limit: usize) -> Result<Vec<String>>;

    /// Most recent turns, newest first.
    fn recent_turns(&self, session_id: &str, n: usize) -> Result<Vec<TurnRecord>>;
}

/// SQLite-backed session memory over the shared store.
pub struct SqliteMemory {
    store: Arc<SqliteStore>,
    /// How many turns back product inference and doc recall look.
    turn_window: usize,
}

impl SqliteMemory {
    pub fn new(store: Arc<SqliteStore>, turn_window: usize) -> Self {
        Self { store, turn_window }
    }

    /// Dominant product among a turn's used documents, if any carries one.
    /// Ties go to the product cited first in the turn.
    fn dominant_product(&self, doc_ids: &[String]) -> Result<Option<String>> {
        let products = self.store.products_for_docs(doc_ids)?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut first_seen: Vec<&str> = Vec::new();
        for product in products.iter().flatten() {
            let entry = counts.entry(product.as_str()).or_insert(0);
            *entry += 1;
            if !first_seen.contains(&product.as_str()) {
                first_seen.push(product.as_str());
            }
        }
        // Reverse before max_by_key so equal counts resolve to the
        // first-cited product.
        let best = first_seen
            .into_iter()
            .rev()
            .max_by_key(|p| counts.get(p).copied().unwrap_or(0));
        Ok(best.map(String::from))
    }
}

impl SessionMemory for SqliteMemory {
    fn get_or_create(&self, session_id: &str) -> Result<SessionRecord> {
        self.store.ensure_session(session_id)
    }

    fn infer_active_product(&self, session_id: &str) -> Result<Option<String>> {
        let turns = self.store.recent_turns(session_id, self.turn_window)?;
        for turn in turns {
            if turn.used_doc_ids.is_empty() {
                continue;
            }
            if let Some(product) = self.dominant_product(&turn.used_doc_ids)? {
                return Ok(Some(product));
            }
        }
        Ok(None)
    }

    fn record_turn(&self, turn: &NewTurn<'_>) -> Result<()> {
        self.store.insert_turn(
            turn.session_id,
            turn.user_text,
            turn.answer_text,
            turn.used_doc_ids,
            turn.used_chunk_ids,
            turn.summary,
        )
    }

    fn recent_doc_ids(&self, session_id: &str, limit: usize) -> Result<Vec<String>> {
        self.store.recent_doc_ids(session_id, limit)
    }

    fn recent_turns(&self, session_id: &str, n: usize) -> Result<Vec<TurnRecord>> {
        self.store.recent_turns(session_id, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsage_store::Document;
    use tempfile::TempDir;

    fn memory_with_docs() -> (SqliteMemory, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path(), 8).unwrap());
        for (doc_id, product) in [
            ("commerce_a", Some("commerce")),
            ("commerce_b", Some("commerce")),
            ("sales_a", Some("sales")),
            ("untagged", None),
        ] {
            store
                .add_document(&Document {
                    doc_id: doc_id.into(),
                    doc_title: doc_id.into(),
                    product: product.map(String::from),
                    filename: None,
                })
                .unwrap();
        }
        (SqliteMemory::new(store, 5), dir)
    }

    fn record(memory: &SqliteMemory, session: &str, user: &str, docs: &[&str]) {
        let doc_ids: Vec<String> = docs.iter().map(|s| s.to_string()).collect();
        memory
            .record_turn(&NewTurn {
                session_id: session,
                user_text: user,
                answer_text: "answer",
                used_doc_ids: &doc_ids,
                used_chunk_ids: &[],
                summary: None,
            })
            .unwrap();
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let (memory, _dir) = memory_with_docs();
        let a = memory.get_or_create("s").unwrap();
        let b = memory.get_or_create("s").unwrap();
        assert_eq!(a.session_id, b.session_id);
        assert_eq!(a.created_at, b.created_at);
    }

    #[test]
    fn infer_returns_none_for_fresh_session() {
        let (memory, _dir) = memory_with_docs();
        memory.get_or_create("fresh").unwrap();
        assert_eq!(memory.infer_active_product("fresh").unwrap(), None);
    }

    #[test]
    fn infer_uses_dominant_product_of_latest_turn() {
        let (memory, _dir) = memory_with_docs();
        record(&memory, "s", "q1", &["sales_a"]);
        record(&memory, "s", "q2", &["commerce_a", "commerce_b", "sales_a"]);
        assert_eq!(
            memory.infer_active_product("s").unwrap().as_deref(),
            Some("commerce")
        );
    }

    #[test]
    fn infer_skips_turns_without_products() {
        let (memory, _dir) = memory_with_docs();
        record(&memory, "s", "q1", &["sales_a"]);
        record(&memory, "s", "q2", &["untagged"]);
        record(&memory, "s", "q3", &[]);
        assert_eq!(
            memory.infer_active_product("s").unwrap().as_deref(),
            Some("sales")
        );
    }

    #[test]
    fn recent_docs_reflect_just_recorded_turn() {
        let (memory, _dir) = memory_with_docs();
        record(&memory, "s", "q1", &["sales_a"]);
        record(&memory, "s", "q2", &["commerce_a", "sales_a"]);
        let docs = memory.recent_doc_ids("s", 5).unwrap();
        assert_eq!(docs, vec!["commerce_a".to_string(), "sales_a".to_string()]);
    }
}

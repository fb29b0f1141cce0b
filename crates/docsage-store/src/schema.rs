//! Database schema SQL.

/// Corpus tables: documents, chunks, chunk_embeddings.
///
/// Documents and chunks are produced by an external ingestion pipeline and
/// are immutable here; `(doc_id, chunk_local_id)` identifies a chunk.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    doc_id TEXT PRIMARY KEY,
    doc_title TEXT NOT NULL,
    product TEXT,
    filename TEXT
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doc_id TEXT NOT NULL REFERENCES documents(doc_id) ON DELETE CASCADE,
    chunk_local_id INTEGER NOT NULL,
    doc_title TEXT,
    section_title TEXT,
    section_level INTEGER NOT NULL DEFAULT 1,
    page_start INTEGER NOT NULL CHECK (page_start >= 1),
    page_end INTEGER NOT NULL CHECK (page_end >= page_start),
    content TEXT NOT NULL,
    product TEXT,
    UNIQUE (doc_id, chunk_local_id)
);

CREATE INDEX IF NOT EXISTS idx_chunks_doc_id ON chunks(doc_id);
CREATE INDEX IF NOT EXISTS idx_chunks_product ON chunks(product);

CREATE TABLE IF NOT EXISTS chunk_embeddings (
    chunk_id INTEGER PRIMARY KEY REFERENCES chunks(id) ON DELETE CASCADE,
    embedding BLOB NOT NULL,
    scale REAL NOT NULL,
    offset_val REAL NOT NULL
);
"#;

/// FTS5 virtual table over section titles and chunk content.
pub const FTS_SCHEMA_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
    section_title, content,
    content='chunks', content_rowid='id',
    tokenize='porter unicode61'
);
"#;

/// Triggers to keep the FTS index in sync with the chunks table.
pub const FTS_TRIGGERS_SQL: &str = r#"
CREATE TRIGGER IF NOT EXISTS chunks_ai AFTER INSERT ON chunks BEGIN
    INSERT INTO chunks_fts(rowid, section_title, content)
    VALUES (new.id, COALESCE(new.section_title, ''), new.content);
END;

CREATE TRIGGER IF NOT EXISTS chunks_ad AFTER DELETE ON chunks BEGIN
    INSERT INTO chunks_fts(chunks_fts, rowid, section_title, content)
    VALUES ('delete', old.id, COALESCE(old.section_title, ''), old.content);
END;
"#;

/// Conversation tables: sessions own their turns (cascade).
///
/// Turns are append-only; ordering is by timestamp with the rowid breaking
/// same-millisecond ties in insertion order.
pub const SESSION_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    created_at INTEGER NOT NULL,
    summary TEXT
);

CREATE TABLE IF NOT EXISTS turns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
    tstamp INTEGER NOT NULL,
    user_text TEXT NOT NULL,
    answer_text TEXT NOT NULL,
    used_doc_ids TEXT NOT NULL,
    used_chunk_ids TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_turns_session ON turns(session_id, id);
"#;

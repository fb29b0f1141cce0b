//! Docsage Store — SQLite passage store (FTS5 + quantized vector search)
//! and the durable session/turn log.

pub mod embedding;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;

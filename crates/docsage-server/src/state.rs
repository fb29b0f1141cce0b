//! Shared application state.

use std::sync::Arc;

use docsage_agent::Orchestrator;
use docsage_core::ServerConfig;
use docsage_rank::HybridRanker;
use docsage_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<SqliteStore>,
    /// Direct ranker handle for the debug search endpoint (no memory boosts).
    pub ranker: HybridRanker,
    pub orchestrator: Orchestrator,
}

//! Docsage — conversational QA server over a help-document corpus.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("DOCSAGE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = docsage_core::ServerConfig::from_env(&data_dir)?;
    let port = config.port;

    let store = Arc::new(
        docsage_store::SqliteStore::open(&config.data_dir, config.embedding_dim)
            .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?,
    );

    let embedder = docsage_embed::create_embedder(&config.embed_model, config.embedding_dim);

    let llm_config = docsage_chat::LLMConfig::load(&data_dir.join("llm-config.json"));
    let answerer = Arc::new(docsage_chat::LlmAnswerer::new(llm_config));

    let memory = Arc::new(docsage_memory::SqliteMemory::new(
        store.clone(),
        config.retrieval.memory_turns,
    ));

    let ranker = docsage_rank::HybridRanker::new(store.clone(), embedder, &config.retrieval);

    let orchestrator = docsage_agent::Orchestrator::new(
        &store,
        memory,
        ranker.clone(),
        answerer,
        &config.retrieval,
    );

    let state = Arc::new(AppState {
        config,
        store,
        ranker,
        orchestrator,
    });

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Docsage server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

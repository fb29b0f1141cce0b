//! Docsage Rank — hybrid retrieval: two-leg search, score blending,
//! memory boosts, deterministic ordering.

pub mod blend;
pub mod ranker;
pub mod types;

pub use ranker::HybridRanker;
pub use types::{MemoryContext, RetrievalCandidate};

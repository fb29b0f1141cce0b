//! Docsage Agent — per-turn policy: classify the utterance, resolve the
//! effective product filter, retrieve, answer, and record the exchange.

pub mod classify;
pub mod orchestrator;
pub mod responses;
pub mod types;

pub use classify::{classify, TurnKind};
pub use orchestrator::Orchestrator;
pub use types::{ChatOutcome, ChatTurnRequest};

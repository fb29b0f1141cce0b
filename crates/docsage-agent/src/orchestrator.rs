//! The conversation orchestrator: top-level per-turn policy.

use std::sync::Arc;

use tracing::{info, warn};

use docsage_chat::{Answerer, PromptVariant};
use docsage_core::{Error, Result, RetrievalConfig};
use docsage_memory::{NewTurn, SessionMemory};
use docsage_rank::{HybridRanker, MemoryContext, RetrievalCandidate};
use docsage_store::SqliteStore;

use crate::classify::{classify, TurnKind};
use crate::responses;
use crate::types::{ChatOutcome, ChatTurnRequest};

/// Per-turn driver: classify → resolve product → retrieve → answer → record.
pub struct Orchestrator {
    memory: Arc<dyn SessionMemory>,
    ranker: HybridRanker,
    answerer: Arc<dyn Answerer>,
    config: RetrievalConfig,
    /// Product tags snapshotted at startup; the corpus is fixed, and
    /// guardrail turns must not touch the store.
    products: Vec<String>,
}

impl Orchestrator {
    pub fn new(
        store: &SqliteStore,
        memory: Arc<dyn SessionMemory>,
        ranker: HybridRanker,
        answerer: Arc<dyn Answerer>,
        config: &RetrievalConfig,
    ) -> Self {
        let products = store.list_products().unwrap_or_else(|e| {
            warn!("product listing failed: {}", e);
            Vec::new()
        });
        Self {
            memory,
            ranker,
            answerer,
            config: config.clone(),
            products,
        }
    }

    /// Run one chat turn.
    ///
    /// Storage and upstream failures are converted to user-safe responses
    /// here; they never surface as faults that drop the turn unrecorded.
    pub async fn run_turn(&self, req: &ChatTurnRequest) -> Result<ChatOutcome> {
        let session_id = req.session_id.trim();
        let text = req.message.trim();
        if session_id.is_empty() {
            return Err(Error::InvalidInput("session_id must not be empty".into()));
        }
        if text.is_empty() {
            return Err(Error::InvalidInput("message must not be empty".into()));
        }

        match classify(text) {
            TurnKind::Greeting => {
                let answer = responses::welcome_message(&self.products);
                self.record(session_id, text, &answer, &[], &[], Some("greeting"));
                Ok(self.outcome(session_id, text, answer, Vec::new()))
            }
            TurnKind::Farewell => {
                let answer = responses::farewell_message();
                self.record(session_id, text, &answer, &[], &[], Some("goodbye"));
                Ok(self.outcome(session_id, text, answer, Vec::new()))
            }
            TurnKind::LowInformation => {
                let answer = responses::clarify_message(text, &self.products);
                self.record(
                    session_id,
                    text,
                    &answer,
                    &[],
                    &[],
                    Some("clarification requested"),
                );
                Ok(self.outcome(session_id, text, answer, Vec::new()))
            }
            TurnKind::Substantive => self.substantive_turn(req, session_id, text).await,
        }
    }

    async fn substantive_turn(
        &self,
        req: &ChatTurnRequest,
        session_id: &str,
        text: &str,
    ) -> Result<ChatOutcome> {
        if let Err(e) = self.memory.get_or_create(session_id) {
            warn!("session bootstrap failed, continuing without memory: {}", e);
        }

        // Memory is an enhancement: read failures degrade to no context.
        let recent_doc_ids = self
            .memory
            .recent_doc_ids(session_id, self.config.memory_turns)
            .unwrap_or_else(|e| {
                warn!("memory read failed, proceeding without recency boosts: {}", e);
                Vec::new()
            });
        let inferred_product = self
            .memory
            .infer_active_product(session_id)
            .unwrap_or_else(|e| {
                warn!("product inference failed, proceeding without it: {}", e);
                None
            });

        // Effective product: explicit parameter wins; a product named in the
        // message overrides what memory inferred.
        let explicit = req
            .product
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from);
        let switched = detect_product_switch(text, &self.products);
        let effective_product = explicit.or(switched).or_else(|| inferred_product.clone());

        let memory_ctx = MemoryContext {
            recent_doc_ids,
            active_product: inferred_product,
        };

        let mut candidates = match self
            .ranker
            .retrieve(text, effective_product.as_deref(), Some(&memory_ctx), None)
            .await
        {
            Ok(c) => c,
            Err(e) => return Ok(self.failed_turn(session_id, text, e)),
        };

        // A too-narrow product filter is the usual cause of a false empty
        // result; retry once without it. This is the only retry.
        if candidates.is_empty() && effective_product.is_some() {
            info!(
                "no candidates for product {:?}, retrying unfiltered",
                effective_product
            );
            candidates = match self
                .ranker
                .retrieve(text, None, Some(&memory_ctx), None)
                .await
            {
                Ok(c) => c,
                Err(e) => return Ok(self.failed_turn(session_id, text, e)),
            };
        }

        if candidates.is_empty() {
            let answer = responses::no_information_message();
            self.record(session_id, text, &answer, &[], &[], None);
            return Ok(self.outcome(session_id, text, answer, Vec::new()));
        }

        let summary = responses::make_summary(text, &top_doc_titles(&candidates));

        match self
            .answerer
            .answer(text, &candidates, PromptVariant::Default, Some(&summary))
            .await
        {
            Ok((answer, citations)) => {
                let mut used_doc_ids: Vec<String> = Vec::new();
                for c in &citations {
                    if !used_doc_ids.contains(&c.doc_id) {
                        used_doc_ids.push(c.doc_id.clone());
                    }
                }
                let used_chunk_ids: Vec<i64> = citations.iter().map(|c| c.chunk_id).collect();

                self.record(
                    session_id,
                    text,
                    &answer,
                    &used_doc_ids,
                    &used_chunk_ids,
                    Some(&summary),
                );
                Ok(self.outcome(session_id, text, answer, citations))
            }
            Err(e) => {
                warn!("answerer failed: {}", e);
                self.record(
                    session_id,
                    text,
                    responses::ANSWER_UNAVAILABLE_MARKER,
                    &[],
                    &[],
                    Some(&summary),
                );
                Ok(self.outcome(session_id, text, responses::unable_message(), Vec::new()))
            }
        }
    }

    /// Convert a retrieval failure into a user-safe response, recording the
    /// turn with an error marker.
    fn failed_turn(&self, session_id: &str, text: &str, err: Error) -> ChatOutcome {
        warn!("retrieval failed: {}", err);
        let answer = match err {
            Error::Upstream(_) => responses::unable_message(),
            _ => responses::retrieval_error_message(),
        };
        self.record(
            session_id,
            text,
            responses::ANSWER_UNAVAILABLE_MARKER,
            &[],
            &[],
            None,
        );
        self.outcome(session_id, text, answer, Vec::new())
    }

    /// Best-effort turn recording: write failures must never block the
    /// user-visible answer.
    fn record(
        &self,
        session_id: &str,
        user_text: &str,
        answer_text: &str,
        used_doc_ids: &[String],
        used_chunk_ids: &[i64],
        summary: Option<&str>,
    ) {
        let turn = NewTurn {
            session_id,
            user_text,
            answer_text,
            used_doc_ids,
            used_chunk_ids,
            summary,
        };
        if let Err(e) = self.memory.record_turn(&turn) {
            warn!("failed to record turn for session {}: {}", session_id, e);
        }
    }

    fn outcome(
        &self,
        session_id: &str,
        message: &str,
        answer: String,
        sources: Vec<docsage_chat::Citation>,
    ) -> ChatOutcome {
        ChatOutcome {
            session_id: session_id.to_string(),
            message: message.to_string(),
            answer,
            sources,
        }
    }

}

/// A product named in the message is an explicit switch signal. The longest
/// match wins when tags overlap.
fn detect_product_switch(text: &str, products: &[String]) -> Option<String> {
    let lower = text.to_lowercase();
    products
        .iter()
        .filter(|p| !p.is_empty() && lower.contains(&p.to_lowercase()))
        .max_by_key(|p| p.len())
        .cloned()
}

/// Distinct document titles among the top candidates, for the summary.
fn top_doc_titles(candidates: &[RetrievalCandidate]) -> Vec<String> {
    let mut titles = Vec::new();
    for c in candidates {
        let title = c
            .chunk
            .doc_title
            .clone()
            .unwrap_or_else(|| c.chunk.doc_id.clone());
        if !titles.contains(&title) {
            titles.push(title);
        }
        if titles.len() >= 3 {
            break;
        }
    }
    titles
}

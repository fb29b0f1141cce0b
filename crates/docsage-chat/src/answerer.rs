//! The Answerer seam: (query, passages) → (answer text, citations).

use async_trait::async_trait;

use docsage_core::{Error, Result};
use docsage_rank::RetrievalCandidate;

use crate::config::LLMConfig;
use crate::prompts;
use crate::providers;
use crate::types::{Citation, PromptVariant};

const ANSWER_MAX_TOKENS: usize = 1024;

/// External answer generation, treated as a pure function of the query and
/// its passages.
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(
        &self,
        query: &str,
        passages: &[RetrievalCandidate],
        variant: PromptVariant,
        memory_summary: Option<&str>,
    ) -> Result<(String, Vec<Citation>)>;
}

/// Map retrieval candidates to citation rows, in passage order.
pub fn citations_for(passages: &[RetrievalCandidate]) -> Vec<Citation> {
    passages
        .iter()
        .map(|c| Citation {
            source_type: "document".into(),
            chunk_id: c.chunk.id,
            doc_id: c.chunk.doc_id.clone(),
            doc_title: c.chunk.doc_title.clone(),
            section_title: c.chunk.section_title.clone(),
            page_start: c.chunk.page_start,
            page_end: c.chunk.page_end,
            score: c.final_score(),
        })
        .collect()
}

/// Answerer backed by an OpenAI-compatible chat-completion endpoint.
pub struct LlmAnswerer {
    client: reqwest::Client,
    config: LLMConfig,
}

impl LlmAnswerer {
    pub fn new(config: LLMConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Answerer for LlmAnswerer {
    async fn answer(
        &self,
        query: &str,
        passages: &[RetrievalCandidate],
        variant: PromptVariant,
        memory_summary: Option<&str>,
    ) -> Result<(String, Vec<Citation>)> {
        let (provider, model, api_key) = self
            .config
            .resolve_provider()
            .ok_or_else(|| Error::Upstream("no LLM provider configured".into()))?;

        let (messages, temperature) = match &variant {
            PromptVariant::Default => {
                (prompts::build_answer_messages(query, passages, memory_summary), 0.1)
            }
            PromptVariant::ProductOverview { product } => (
                prompts::build_product_overview_messages(product, passages, memory_summary),
                0.2,
            ),
        };

        let answer = providers::complete(
            &self.client,
            provider,
            &messages,
            &model,
            &api_key,
            temperature,
            ANSWER_MAX_TOKENS,
        )
        .await?;

        Ok((answer, citations_for(passages)))
    }
}

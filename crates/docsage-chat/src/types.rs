//! Chat and citation types.

use serde::{Deserialize, Serialize};

/// LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Groq,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Groq => write!(f, "groq"),
        }
    }
}

/// Chat message sent to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Which prompt the answerer builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptVariant {
    /// Grounded question answering over the passages.
    Default,
    /// A broad product overview assembled from the passages.
    ProductOverview { product: String },
}

/// A cited source in the final answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub source_type: String,
    pub chunk_id: i64,
    pub doc_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    pub page_start: i32,
    pub page_end: i32,
    pub score: f64,
}

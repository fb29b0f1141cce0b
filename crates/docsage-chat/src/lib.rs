//! Docsage Chat — turns a query and its retrieved passages into answer
//! text with citations, via an external OpenAI-compatible LLM.

pub mod answerer;
pub mod config;
pub mod prompts;
pub mod providers;
pub mod types;

pub use answerer::{citations_for, Answerer, LlmAnswerer};
pub use config::LLMConfig;
pub use types::{ChatMessage, Citation, PromptVariant};

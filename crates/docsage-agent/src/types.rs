//! Chat turn request/response types.

use serde::{Deserialize, Serialize};

use docsage_chat::Citation;

/// One incoming chat turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurnRequest {
    pub session_id: String,
    pub message: String,
    /// Explicit product filter; takes precedence over inferred memory.
    #[serde(default)]
    pub product: Option<String>,
}

/// The completed exchange returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub session_id: String,
    pub message: String,
    pub answer: String,
    pub sources: Vec<Citation>,
}

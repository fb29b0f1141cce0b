//! Prompt construction for grounded answering.

use docsage_rank::RetrievalCandidate;

use crate::types::ChatMessage;

const EXCERPT_MAX_CHARS: usize = 1200;

/// Build the message array for a grounded answer over retrieved passages.
pub fn build_answer_messages(
    query: &str,
    passages: &[RetrievalCandidate],
    memory_summary: Option<&str>,
) -> Vec<ChatMessage> {
    let mut system = String::from(
        "You are a help-documentation assistant. Answer the user's question \
         using only the numbered passages below. Cite passages inline as [n]. \
         If the passages do not contain the answer, say so instead of guessing.",
    );
    push_context(&mut system, passages, memory_summary);

    vec![ChatMessage::system(system), ChatMessage::user(query)]
}

/// Build the message array for a broad product overview.
pub fn build_product_overview_messages(
    product: &str,
    passages: &[RetrievalCandidate],
    memory_summary: Option<&str>,
) -> Vec<ChatMessage> {
    let mut system = String::from(
        "You are a help-documentation assistant. Using only the numbered \
         passages below, write a concise overview of the product, covering \
         its main capabilities and setup steps. Cite passages inline as [n].",
    );
    push_context(&mut system, passages, memory_summary);

    vec![
        ChatMessage::system(system),
        ChatMessage::user(format!("Give me an overview of {}.", product)),
    ]
}

fn push_context(
    system: &mut String,
    passages: &[RetrievalCandidate],
    memory_summary: Option<&str>,
) {
    if let Some(summary) = memory_summary {
        system.push_str("\n\nConversation context: ");
        system.push_str(summary);
    }

    system.push_str("\n\nPassages:\n");
    for (i, passage) in passages.iter().enumerate() {
        system.push_str(&format_passage(i + 1, passage));
        system.push('\n');
    }
}

fn format_passage(n: usize, candidate: &RetrievalCandidate) -> String {
    let chunk = &candidate.chunk;
    let title = chunk.doc_title.as_deref().unwrap_or(&chunk.doc_id);
    let section = chunk.section_title.as_deref().unwrap_or("-");
    format!(
        "[{}] {} § {} (pp. {}-{}): {}",
        n,
        title,
        section,
        chunk.page_start,
        chunk.page_end,
        truncate(&chunk.content, EXCERPT_MAX_CHARS)
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

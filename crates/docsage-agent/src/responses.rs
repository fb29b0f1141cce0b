//! Canned responses for turns that bypass retrieval.

/// Recorded as the answer text when the answer pipeline fails, so the
/// exchange is preserved even though no answer was produced.
pub const ANSWER_UNAVAILABLE_MARKER: &str = "[answer unavailable]";

/// Example questions surfaced in welcome and clarification messages.
pub fn example_queries() -> &'static [&'static str] {
    &[
        "How do I create a dashboard in CRM Analytics?",
        "What are supported editions for B2B Commerce?",
        "Enable managed checkout for D2C Commerce",
        "What is Omnichannel Inventory?",
    ]
}

pub fn welcome_message(products: &[String]) -> String {
    let mut msg = String::from(
        "Hi! I can answer questions from the product documentation corpus.\n",
    );
    if !products.is_empty() {
        msg.push_str("\nProduct areas I know:\n");
        for p in products.iter().take(12) {
            msg.push_str(&format!("- {}\n", p));
        }
    }
    msg.push_str("\nTry asking:\n");
    for q in example_queries() {
        msg.push_str(&format!("• {}\n", q));
    }
    msg
}

pub fn farewell_message() -> String {
    "Goodbye! If you need anything else from the documentation later, just ask.".to_string()
}

pub fn clarify_message(user_text: &str, products: &[String]) -> String {
    let mut msg = format!(
        "I need a bit more detail to help.\nYour message was: \u{201c}{}\u{201d}.\n",
        user_text.trim()
    );
    if !products.is_empty() {
        msg.push_str("\nPlease name a product or feature, for example: ");
        msg.push_str(&products.iter().take(10).cloned().collect::<Vec<_>>().join(", "));
        msg.push('\n');
    }
    msg.push_str("\nFor example:\n");
    for q in example_queries().iter().take(3) {
        msg.push_str(&format!("• {}\n", q));
    }
    msg
}

pub fn no_information_message() -> String {
    "I couldn't find relevant information for that in the documentation. \
     Try rephrasing, or name the product you're asking about."
        .to_string()
}

pub fn unable_message() -> String {
    "I'm temporarily unable to answer. Please try again in a moment.".to_string()
}

pub fn retrieval_error_message() -> String {
    "The document index is temporarily unavailable. Please try again in a moment.".to_string()
}

/// Rolling one-line session summary.
pub fn make_summary(user_text: &str, recent_topics: &[String]) -> String {
    let head: String = user_text.chars().take(180).collect();
    let mut summary = format!("User is asking about: {}.", head);
    if !recent_topics.is_empty() {
        summary.push_str(" Recent topics: ");
        summary.push_str(
            &recent_topics
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        );
        summary.push('.');
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_lists_products_and_examples() {
        let msg = welcome_message(&["commerce".into(), "sales".into()]);
        assert!(msg.contains("- commerce"));
        assert!(msg.contains("- sales"));
        assert!(msg.contains("Try asking:"));
    }

    #[test]
    fn summary_truncates_and_appends_topics() {
        let long = "q".repeat(400);
        let summary = make_summary(&long, &["Commerce Guide".into()]);
        assert!(summary.len() < 250);
        assert!(summary.contains("Recent topics: Commerce Guide."));
    }
}

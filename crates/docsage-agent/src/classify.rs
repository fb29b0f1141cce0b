//! Lightweight per-turn utterance classification.
//!
//! A pure function over phrase sets so the classifier can be refined
//! without touching orchestrator control flow.

use once_cell::sync::Lazy;
use regex::Regex;

/// How a single turn is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Greeting,
    Farewell,
    LowInformation,
    Substantive,
}

static GREETING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(hi|hello|hey|yo|hola|namaste|good\s*(morning|afternoon|evening))\b")
        .unwrap()
});

static FAREWELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(bye|goodbye|see\s*you|see\s*ya|take\s*care)\b").unwrap());

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());

/// Filler words that carry no retrieval signal.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "please", "pls", "about", "on", "of", "for", "to",
    "me", "something", "some", "tell", "say", "explain", "help", "info", "information",
];

const MIN_CONTENT_TOKENS: usize = 3;

/// Classify a user utterance. Anything not matched is `Substantive`.
pub fn classify(text: &str) -> TurnKind {
    if GREETING_RE.is_match(text) {
        return TurnKind::Greeting;
    }
    if FAREWELL_RE.is_match(text) {
        return TurnKind::Farewell;
    }
    if content_tokens(text) < MIN_CONTENT_TOKENS {
        return TurnKind::LowInformation;
    }
    TurnKind::Substantive
}

fn content_tokens(text: &str) -> usize {
    TOKEN_RE
        .find_iter(&text.to_lowercase())
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_match() {
        for text in ["hi", "Hello there", "  hey!", "Good morning team"] {
            assert_eq!(classify(text), TurnKind::Greeting, "{}", text);
        }
    }

    #[test]
    fn farewells_match() {
        for text in ["bye", "ok goodbye now", "see you later", "take care!"] {
            assert_eq!(classify(text), TurnKind::Farewell, "{}", text);
        }
    }

    #[test]
    fn low_information_inputs() {
        for text in ["???", "tell me something", "please help", "info about the"] {
            assert_eq!(classify(text), TurnKind::LowInformation, "{}", text);
        }
    }

    #[test]
    fn substantive_questions() {
        for text in [
            "How do I enable Managed Checkout in a D2C store?",
            "What are supported editions for B2B Commerce?",
            "configure dashboards analytics permissions",
        ] {
            assert_eq!(classify(text), TurnKind::Substantive, "{}", text);
        }
    }

    #[test]
    fn greeting_wins_over_low_information() {
        // "hi" alone is also below the content threshold
        assert_eq!(classify("hi"), TurnKind::Greeting);
    }
}

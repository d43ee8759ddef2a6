//! Intent classification strategies and language detection
//!
//! Two interchangeable [`Classifier`] implementations exist: a keyword
//! heuristic that needs no network, and one backed by [`TextCompletion`]
//! that asks the model for a JSON verdict. Both recognise the exit phrases
//! before anything else and neither ever fails; an unusable answer becomes a
//! low-confidence `discussion`.
//!
//! [`TextCompletion`]: crate::ports::TextCompletion

mod completion;
mod keyword;
mod language;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::Intent;

pub use completion::CompletionClassifier;
pub use keyword::KeywordClassifier;
pub use language::{
    FALLBACK_EXTENSION, Language, detect_answered_language, detect_code_language,
    detect_requested_language, extension_for,
};

/// Confidence reported when classification had to fall back
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Phrases that end the pair programming session
pub const EXIT_PHRASES: [&str; 6] = [
    "thank you pair programming",
    "thanks pair programming",
    "thank you pair programmer",
    "goodbye pair programming",
    "exit pair programming",
    "stop pair programming",
];

/// A classifier verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f32,
    pub action: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_info: Option<serde_json::Value>,
}

impl IntentClassification {
    /// The verdict used whenever nothing better is available
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            intent: Intent::Discussion,
            confidence: FALLBACK_CONFIDENCE,
            action: "discuss".to_string(),
            message: "Let's talk it through.".to_string(),
            extracted_info: None,
        }
    }

    #[must_use]
    pub fn exit() -> Self {
        Self {
            intent: Intent::Exit,
            confidence: 1.0,
            action: "end_session".to_string(),
            message: "Ending the pair programming session.".to_string(),
            extracted_info: None,
        }
    }
}

/// Maps an utterance to an intent
#[async_trait(?Send)]
pub trait Classifier {
    async fn classify(&self, utterance: &str) -> IntentClassification;
}

/// Whether the utterance asks to end the session
#[must_use]
pub fn is_exit_phrase(utterance: &str) -> bool {
    let normalized: String = utterance
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    EXIT_PHRASES.iter().any(|phrase| normalized.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_phrases() {
        assert!(is_exit_phrase("Thank you, pair programming!"));
        assert!(is_exit_phrase("okay goodbye   pair programming"));
        assert!(!is_exit_phrase("thank you"));
        assert!(!is_exit_phrase("let's do some pair programming"));
    }

    #[test]
    fn test_fallback_verdict() {
        let verdict = IntentClassification::fallback();
        assert_eq!(verdict.intent, Intent::Discussion);
        assert!((verdict.confidence - 0.3).abs() < f32::EPSILON);
    }
}

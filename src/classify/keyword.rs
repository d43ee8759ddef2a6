//! Keyword-based intent classification

use async_trait::async_trait;

use super::{Classifier, IntentClassification, is_exit_phrase};
use crate::session::Intent;

const ANALYSIS_WORDS: &[&str] = &["clipboard", "copied", "this code", "pasted"];
const REVIEW_WORDS: &[&str] = &["review", "check", "analyze", "analyse", "audit"];
const FILE_WORDS: &[&str] = &[
    "open", "launch", "read", "show", "display", "contents", "list", "files", "directory",
    "folder",
];
const CODING_WORDS: &[&str] = &[
    "code", "program", "function", "class", "write", "create", "build", "implement", "script",
    "generate", "make",
];
const EXPLANATION_WORDS: &[&str] = &["explain", "what", "how", "why", "describe"];

/// Confidence assigned to a keyword hit
const KEYWORD_CONFIDENCE: f32 = 0.6;

/// Classifies by scanning for trigger words
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    /// Classify without going through the async trait
    #[must_use]
    pub fn classify_text(utterance: &str) -> IntentClassification {
        if is_exit_phrase(utterance) {
            return IntentClassification::exit();
        }

        let lower = utterance.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let mentions = |set: &[&str]| {
            set.iter().any(|kw| {
                if kw.contains(' ') {
                    lower.contains(kw)
                } else {
                    words.contains(kw)
                }
            })
        };

        let (intent, action) = if mentions(ANALYSIS_WORDS) {
            (Intent::CodeAnalysis, "analyze_clipboard")
        } else if mentions(REVIEW_WORDS) {
            (Intent::Review, "review_code")
        } else if mentions(FILE_WORDS) && !mentions(CODING_WORDS) {
            (Intent::FileOperations, "file_operation")
        } else if mentions(CODING_WORDS) {
            (Intent::Coding, "generate_code")
        } else if mentions(EXPLANATION_WORDS) {
            (Intent::Explanation, "explain")
        } else {
            return IntentClassification::fallback();
        };

        tracing::debug!(intent = intent.as_str(), "keyword classification");

        IntentClassification {
            intent,
            confidence: KEYWORD_CONFIDENCE,
            action: action.to_string(),
            message: format!("Sounds like a {} request.", intent.as_str().replace('_', " ")),
            extracted_info: None,
        }
    }
}

#[async_trait(?Send)]
impl Classifier for KeywordClassifier {
    async fn classify(&self, utterance: &str) -> IntentClassification {
        Self::classify_text(utterance)
    }
}

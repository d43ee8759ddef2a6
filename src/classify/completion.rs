//! LLM-backed intent classification

use std::rc::Rc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Classifier, IntentClassification, is_exit_phrase};
use crate::ports::{CompletionOptions, TextCompletion};
use crate::prompt;
use crate::session::Intent;

/// Raw model verdict, before the label is validated
#[derive(Debug, Deserialize)]
struct RawVerdict {
    intent: String,
    confidence: f32,
    action: String,
    message: String,
    #[serde(default)]
    extracted_info: Option<serde_json::Value>,
}

/// Asks a [`TextCompletion`] for a JSON verdict
pub struct CompletionClassifier {
    completion: Rc<dyn TextCompletion>,
}

impl CompletionClassifier {
    #[must_use]
    pub fn new(completion: Rc<dyn TextCompletion>) -> Self {
        Self { completion }
    }
}

#[async_trait(?Send)]
impl Classifier for CompletionClassifier {
    async fn classify(&self, utterance: &str) -> IntentClassification {
        if is_exit_phrase(utterance) {
            return IntentClassification::exit();
        }

        let options = CompletionOptions::default()
            .with_temperature(0.0)
            .with_max_tokens(200);
        match self
            .completion
            .complete(&prompt::intent_prompt(utterance), &options)
            .await
        {
            Ok(reply) => parse_verdict(&reply).unwrap_or_else(|| {
                tracing::warn!(reply = %reply, "unusable intent verdict, falling back");
                IntentClassification::fallback()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "intent classification failed, falling back");
                IntentClassification::fallback()
            }
        }
    }
}

/// Parse the JSON object out of a model reply
///
/// Tolerates surrounding prose or markdown fences. All four required keys
/// must be present and the intent label must be known.
fn parse_verdict(reply: &str) -> Option<IntentClassification> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }

    let raw: RawVerdict = serde_json::from_str(&reply[start..=end]).ok()?;
    let intent = Intent::from_label(&raw.intent)?;

    Some(IntentClassification {
        intent,
        confidence: raw.confidence.clamp(0.0, 1.0),
        action: raw.action,
        message: raw.message,
        extracted_info: raw.extracted_info,
    })
}

//! Five-way response clarification
//!
//! Used by turns that offer more than yes or no: picking a language and
//! checking in between todos.

use super::Turn;
use super::confirm::{YesNo, classify_yes_no};
use crate::Result;
use crate::prompt::speech;
use crate::session::Session;

const PAUSE_PHRASES: &[&str] = &[
    "wait",
    "pause",
    "hold on",
    "give me a second",
    "give me a minute",
    "one moment",
    "hang on",
];
const HELP_PHRASES: &[&str] = &[
    "help",
    "options",
    "support",
    "what can",
    "which languages",
    "what languages",
    "what other",
    "don't understand",
    "not sure",
];
const CHANGE_PHRASES: &[&str] = &[
    "change",
    "different",
    "instead",
    "something else",
    "switch",
    "modify",
    "rather",
];

/// What kind of answer the user gave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCategory {
    Yes,
    No,
    Help,
    Change,
    Pause,
}

/// Categorise an answer. Pause, help and change outrank yes and no.
#[must_use]
pub fn categorize(answer: &str) -> Option<ResponseCategory> {
    let lower = answer.to_lowercase().replace('\u{2019}', "'");
    let has_any = |set: &[&str]| set.iter().any(|p| lower.contains(p));

    if has_any(PAUSE_PHRASES) {
        Some(ResponseCategory::Pause)
    } else if has_any(HELP_PHRASES) {
        Some(ResponseCategory::Help)
    } else if has_any(CHANGE_PHRASES) {
        Some(ResponseCategory::Change)
    } else {
        match classify_yes_no(&lower) {
            YesNo::Deny => Some(ResponseCategory::No),
            YesNo::Affirm => Some(ResponseCategory::Yes),
            YesNo::Ambiguous => None,
        }
    }
}

/// Outcome of a clarification turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clarified {
    /// A recognised category, with the words that produced it
    Answer {
        category: ResponseCategory,
        text: String,
    },
    /// Text the caller asked to accept as-is
    Accepted(String),
    /// Still unclear after every re-ask
    Unclear(String),
    /// Nobody answered
    Silent,
}

/// Ask `question` and keep asking until the answer falls into a category
///
/// # Errors
///
/// Returns error if speaking or capturing fails
pub async fn clarify(
    turn: &Turn<'_>,
    session: &mut Session,
    question: &str,
    max_rounds: u32,
) -> Result<Clarified> {
    clarify_with(turn, session, question, max_rounds, |_| false).await
}

/// Like [`clarify`], but answers matching `accept` are returned directly
///
/// `accept` is checked before categorisation, so "JavaScript instead" can
/// be taken as a language choice rather than a change request.
///
/// # Errors
///
/// Returns error if speaking or capturing fails
pub async fn clarify_with<F>(
    turn: &Turn<'_>,
    session: &mut Session,
    question: &str,
    max_rounds: u32,
    accept: F,
) -> Result<Clarified>
where
    F: Fn(&str) -> bool,
{
    turn.ask(session, question).await?;

    let mut rounds = 0;
    loop {
        let Some(answer) = turn.hear(session).await? else {
            return Ok(Clarified::Silent);
        };

        if accept(&answer) {
            return Ok(Clarified::Accepted(answer));
        }
        if let Some(category) = categorize(&answer) {
            tracing::debug!(?category, answer = %answer, "clarified");
            return Ok(Clarified::Answer {
                category,
                text: answer,
            });
        }

        rounds += 1;
        if rounds >= max_rounds {
            return Ok(Clarified::Unclear(answer));
        }
        turn.ask(session, speech::CLARIFY).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(categorize("yes please"), Some(ResponseCategory::Yes));
        assert_eq!(categorize("nope"), Some(ResponseCategory::No));
        assert_eq!(
            categorize("what other languages do you support?"),
            Some(ResponseCategory::Help)
        );
        assert_eq!(
            categorize("no, I want something else"),
            Some(ResponseCategory::Change)
        );
        assert_eq!(categorize("hold on a moment"), Some(ResponseCategory::Pause));
        assert_eq!(categorize("purple elephants"), None);
    }

    #[test]
    fn test_help_outranks_deny() {
        assert_eq!(
            categorize("I don't understand the options"),
            Some(ResponseCategory::Help)
        );
    }
}

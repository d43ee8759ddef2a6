//! Refine-on-feedback turn

use super::Turn;
use super::confirm::{YesNo, classify_yes_no, words};
use crate::Result;
use crate::prompt::speech;
use crate::session::Session;

const SATISFIED_PHRASES: &[&str] = &[
    "looks good",
    "looks great",
    "that's fine",
    "it's fine",
    "all good",
    "perfect",
    "no changes",
    "that's great",
];

/// Words that carry no instruction on their own
const FILLER: &[&str] = &[
    "yes", "yeah", "yep", "sure", "ok", "okay", "no", "nope", "nah", "please", "thanks", "thank",
    "you", "i", "i'm", "think", "so", "it", "it's", "that", "that's", "is", "all", "um", "uh",
    "well", "good", "fine", "great", "nothing", "done",
];

/// How to treat a reply to "any changes?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackReply {
    /// The user is happy with the code
    NoChanges,
    /// The user wants changes but hasn't said which
    AskWhat,
    /// A concrete change request
    Change(String),
}

/// Interpret a reply to "would you like any changes?"
#[must_use]
pub fn interpret_feedback(reply: &str) -> FeedbackReply {
    let lower = reply.to_lowercase().replace('\u{2019}', "'");
    let tokens = words(&lower);
    let substantive = tokens.iter().any(|w| !FILLER.contains(&w.as_str()));

    if SATISFIED_PHRASES.iter().any(|p| lower.contains(p)) && tokens.len() <= 6 {
        return FeedbackReply::NoChanges;
    }
    if substantive {
        return FeedbackReply::Change(reply.trim().to_string());
    }
    match classify_yes_no(&lower) {
        YesNo::Affirm => FeedbackReply::AskWhat,
        YesNo::Deny | YesNo::Ambiguous => FeedbackReply::NoChanges,
    }
}

/// Ask for changes and return the requested change, if any
///
/// # Errors
///
/// Returns error if speaking or capturing fails
pub async fn collect_feedback(
    turn: &Turn<'_>,
    session: &mut Session,
    question: &str,
) -> Result<Option<String>> {
    turn.ask(session, question).await?;
    let Some(reply) = turn.hear(session).await? else {
        return Ok(None);
    };

    match interpret_feedback(&reply) {
        FeedbackReply::NoChanges => Ok(None),
        FeedbackReply::Change(change) => Ok(Some(change)),
        FeedbackReply::AskWhat => {
            turn.ask(session, speech::WHAT_TO_CHANGE).await?;
            let change = turn.hear(session).await?;
            Ok(change.filter(|c| interpret_feedback(c) != FeedbackReply::NoChanges))
        }
    }
}

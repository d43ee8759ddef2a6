//! Yes/no confirmation by voice

use super::Turn;
use crate::Result;
use crate::prompt::speech;
use crate::session::{Confirmation, Session};

const AFFIRM_WORDS: &[&str] = &[
    "yes", "yeah", "yep", "yup", "y", "correct", "right", "ok", "okay", "sure", "approve",
    "absolutely", "affirmative", "true",
];
const AFFIRM_PHRASES: &[&str] = &["go ahead", "sounds good", "that's it", "do it"];
const DENY_WORDS: &[&str] = &[
    "no", "nope", "nah", "wrong", "incorrect", "cancel", "nothing", "negative", "don't",
];
const DENY_PHRASES: &[&str] = &[
    "not right",
    "not correct",
    "no thanks",
    "that's all",
    "i'm done",
    "not really",
];

/// Reading of a free-form yes/no answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Affirm,
    Deny,
    Ambiguous,
}

/// Lowercase words, keeping apostrophes so "don't" stays one token
pub(crate) fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn mentions(text: &str, words: &[String], set_words: &[&str], set_phrases: &[&str]) -> bool {
    set_words.iter().any(|w| words.iter().any(|x| x == w))
        || set_phrases.iter().any(|p| text.contains(p))
}

/// Classify an answer. Denials win over affirmations ("no, that's not right").
#[must_use]
pub fn classify_yes_no(answer: &str) -> YesNo {
    let lower = answer.to_lowercase().replace('\u{2019}', "'");
    let tokens = words(&lower);

    if mentions(&lower, &tokens, DENY_WORDS, DENY_PHRASES) {
        YesNo::Deny
    } else if mentions(&lower, &tokens, AFFIRM_WORDS, AFFIRM_PHRASES) {
        YesNo::Affirm
    } else {
        YesNo::Ambiguous
    }
}

/// How a confirmation question is re-asked and defaulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmPolicy {
    /// Re-asks after an unclear answer before defaulting to affirm
    pub ambiguous_retries: u32,
    /// Re-asks after silence before applying `on_silence`
    pub silent_retries: u32,
    /// Verdict when nobody answers
    pub on_silence: Confirmation,
}

impl ConfirmPolicy {
    /// Silence counts as agreement
    #[must_use]
    pub const fn permissive(ambiguous_retries: u32, silent_retries: u32) -> Self {
        Self {
            ambiguous_retries,
            silent_retries,
            on_silence: Confirmation::Affirmed,
        }
    }

    /// Silence counts as refusal
    #[must_use]
    pub const fn strict(ambiguous_retries: u32, silent_retries: u32) -> Self {
        Self {
            ambiguous_retries,
            silent_retries,
            on_silence: Confirmation::Denied,
        }
    }

    /// Ask `question` and wait for a yes or no
    ///
    /// # Errors
    ///
    /// Returns error if speaking or capturing fails
    pub async fn confirm(
        &self,
        turn: &Turn<'_>,
        session: &mut Session,
        question: &str,
    ) -> Result<Confirmation> {
        turn.ask(session, question).await?;

        let mut ambiguous = 0;
        let mut silent = 0;
        loop {
            let Some(answer) = turn.hear(session).await? else {
                if silent >= self.silent_retries {
                    tracing::debug!(verdict = ?self.on_silence, "no answer, applying default");
                    return Ok(self.on_silence);
                }
                silent += 1;
                turn.ask(session, speech::STILL_THERE).await?;
                continue;
            };

            match classify_yes_no(&answer) {
                YesNo::Affirm => return Ok(Confirmation::Affirmed),
                YesNo::Deny => return Ok(Confirmation::Denied),
                YesNo::Ambiguous if ambiguous >= self.ambiguous_retries => {
                    tracing::debug!(answer = %answer, "still unclear, assuming yes");
                    return Ok(Confirmation::Affirmed);
                }
                YesNo::Ambiguous => {
                    ambiguous += 1;
                    turn.ask(session, speech::YES_OR_NO).await?;
                }
            }
        }
    }
}

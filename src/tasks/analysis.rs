//! Spoken answers: free-form discussion and clipboard code analysis

use crate::classify::detect_code_language;
use crate::ports::{Clipboard, CompletionOptions, TextCompletion};
use crate::prompt::{self, speech};
use crate::{Result, tasks};

/// Answers longer than this are cut at a sentence boundary
const MAX_ANSWER_CHARS: usize = 500;
const MORE_OFFER: &str = "Would you like me to explain more about any specific part?";

/// What to do with the code on the clipboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Explain,
    Review,
    Optimize,
    Debug,
}

impl AnalysisKind {
    /// Pick the analysis from the request wording; explain by default
    #[must_use]
    pub fn from_request(request: &str) -> Self {
        let lower = request.to_lowercase();
        let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has_any(&["review", "check", "critique"]) {
            Self::Review
        } else if has_any(&["optimize", "optimise", "improve", "better", "performance", "faster"]) {
            Self::Optimize
        } else if has_any(&["debug", "bug", "error", "issue", "problem", "broken"]) {
            Self::Debug
        } else {
            Self::Explain
        }
    }

    /// Instruction leading the analysis prompt
    #[must_use]
    pub const fn instruction(self) -> &'static str {
        match self {
            Self::Explain => "Explain what this code does in simple terms. Walk through",
            Self::Review => "Review for bugs, readability and best practices",
            Self::Optimize => "Suggest performance and readability improvements for",
            Self::Debug => "Find the most likely bugs and how to fix them in",
        }
    }
}

/// Answer a programming question out loud
///
/// # Errors
///
/// Returns error if the completion call fails
pub async fn discuss(completion: &dyn TextCompletion, question: &str) -> Result<String> {
    let options = CompletionOptions::default()
        .with_system(prompt::VOICE_SYSTEM)
        .with_temperature(0.7)
        .with_max_tokens(250);
    let answer = completion
        .complete(&prompt::discussion_prompt(question), &options)
        .await?;
    Ok(tasks::shorten_for_speech(
        answer.trim(),
        MAX_ANSWER_CHARS,
        MORE_OFFER,
    ))
}

/// Analyse whatever code is on the clipboard
///
/// An unreadable or empty clipboard yields a spoken how-to rather than an
/// error.
///
/// # Errors
///
/// Returns error if the completion call fails
pub async fn analyze_clipboard(
    clipboard: &dyn Clipboard,
    completion: &dyn TextCompletion,
    request: &str,
) -> Result<String> {
    let code = match clipboard.read().await {
        Ok(code) => code,
        Err(e) => {
            tracing::warn!(error = %e, "clipboard unavailable");
            String::new()
        }
    };
    if code.trim().is_empty() {
        return Ok(speech::EMPTY_CLIPBOARD.to_string());
    }

    let kind = AnalysisKind::from_request(request);
    let language = detect_code_language(&code);
    tracing::debug!(?kind, language = language.map(|l| l.key()), "analysing clipboard code");

    let options = CompletionOptions::default()
        .with_system(prompt::VOICE_SYSTEM)
        .with_temperature(0.7)
        .with_max_tokens(500);
    let answer = completion
        .complete(
            &prompt::analysis_prompt(kind.instruction(), language, &code),
            &options,
        )
        .await?;
    Ok(tasks::shorten_for_speech(
        answer.trim(),
        MAX_ANSWER_CHARS,
        MORE_OFFER,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_kind() {
        assert_eq!(AnalysisKind::from_request("explain this code"), AnalysisKind::Explain);
        assert_eq!(
            AnalysisKind::from_request("can you review the code I copied"),
            AnalysisKind::Review
        );
        assert_eq!(
            AnalysisKind::from_request("how do I make this faster"),
            AnalysisKind::Optimize
        );
        assert_eq!(
            AnalysisKind::from_request("there's a bug in my clipboard code"),
            AnalysisKind::Debug
        );
    }
}

//! Review dispatch and summarisation

use std::path::Path;

use crate::ports::{CompletionOptions, ExternalReviewer, ReviewReport, ReviewStatus, TextCompletion};
use crate::prompt::{self, speech};
use crate::session::SessionStatus;

/// How far past an issue marker to look for its comment
const COMMENT_LOOKAHEAD: usize = 10;
/// Comments shorter than this are noise
const MIN_COMMENT_CHARS: usize = 10;
const MAX_COMMENT_CHARS: usize = 100;

const NO_ISSUES: &str = "The code review looks good overall, no critical issues found.";

/// Run the reviewer over `dir` and fill in a spoken summary on success
pub async fn run_review(
    reviewer: &dyn ExternalReviewer,
    completion: &dyn TextCompletion,
    dir: &Path,
) -> ReviewReport {
    let mut report = reviewer.review_directory(dir).await;
    tracing::info!(status = report.status.as_str(), dir = %dir.display(), "review finished");

    if report.status == ReviewStatus::Completed && report.summary.is_empty() {
        report.summary = summarize(completion, &report.output).await;
    }
    report
}

/// Summarise review output with the model, falling back to [`simple_summary`]
pub async fn summarize(completion: &dyn TextCompletion, output: &str) -> String {
    if output.trim().is_empty() {
        return NO_ISSUES.to_string();
    }

    let options = CompletionOptions::default()
        .with_system(prompt::VOICE_SYSTEM)
        .with_max_tokens(200);
    match completion
        .complete(&prompt::review_summary_prompt(output), &options)
        .await
    {
        Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
        Ok(_) => simple_summary(output),
        Err(e) => {
            tracing::warn!(error = %e, "review summarisation failed");
            simple_summary(output)
        }
    }
}

/// Count flagged issues and quote the first one
#[must_use]
pub fn simple_summary(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let issues: Vec<String> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains("Type: potential_issue") || line.contains("Type: bug"))
        .filter_map(|(i, _)| {
            lines[i..]
                .iter()
                .take(COMMENT_LOOKAHEAD)
                .find_map(|line| line.split_once("Comment:").map(|(_, c)| c.trim()))
        })
        .filter(|comment| comment.chars().count() > MIN_COMMENT_CHARS)
        .map(|comment| match comment.char_indices().nth(MAX_COMMENT_CHARS) {
            Some((cut, _)) => format!("{}...", &comment[..cut]),
            None => comment.to_string(),
        })
        .collect();

    match issues.first() {
        None => NO_ISSUES.to_string(),
        Some(first) if issues.len() == 1 => format!("I found one critical issue: {first}"),
        Some(first) => format!(
            "I found {} critical issues. The main one is: {first}",
            issues.len()
        ),
    }
}

/// What to say for a finished review
#[must_use]
pub fn spoken_message(report: &ReviewReport) -> String {
    match report.status {
        ReviewStatus::Completed if report.summary.is_empty() => NO_ISSUES.to_string(),
        ReviewStatus::Completed => report.summary.clone(),
        ReviewStatus::RateLimited => speech::REVIEW_RATE_LIMITED.to_string(),
        ReviewStatus::Timeout => speech::REVIEW_TIMEOUT.to_string(),
        ReviewStatus::Error => speech::REVIEW_FAILED.to_string(),
    }
}

/// Session status recorded for a review outcome
#[must_use]
pub const fn session_status(status: ReviewStatus) -> SessionStatus {
    match status {
        ReviewStatus::Completed => SessionStatus::Completed,
        ReviewStatus::RateLimited => SessionStatus::RateLimited,
        ReviewStatus::Timeout => SessionStatus::Timeout,
        ReviewStatus::Error => SessionStatus::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
File: app.py
Line: 3 to 5
Type: potential_issue
Comment: The division by zero is not handled when the list is empty.

File: app.py
Line: 9
Type: nitpick
Comment: Consider renaming this variable for clarity.

File: util.py
Type: bug
Prompt for AI Agent:
Comment: Off by one error in the loop bounds skips the last item.
";

    #[test]
    fn test_simple_summary_counts_critical_issues() {
        let summary = simple_summary(OUTPUT);
        assert!(summary.starts_with("I found 2 critical issues."), "{summary}");
        assert!(summary.contains("division by zero"));
    }

    #[test]
    fn test_simple_summary_clean() {
        assert_eq!(simple_summary("No comments."), NO_ISSUES);
    }

    #[test]
    fn test_each_status_has_its_own_message() {
        let messages: Vec<String> = [
            ReviewStatus::RateLimited,
            ReviewStatus::Timeout,
            ReviewStatus::Error,
        ]
        .into_iter()
        .map(|status| spoken_message(&ReviewReport::new(status, "")))
        .collect();

        assert_eq!(messages[0], speech::REVIEW_RATE_LIMITED);
        assert_eq!(messages[1], speech::REVIEW_TIMEOUT);
        assert_eq!(messages[2], speech::REVIEW_FAILED);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            session_status(ReviewStatus::RateLimited),
            SessionStatus::RateLimited
        );
        assert_eq!(session_status(ReviewStatus::Completed), SessionStatus::Completed);
    }
}

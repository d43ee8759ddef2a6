//! Breaking a coding request into todos

use std::sync::LazyLock;

use regex::Regex;

use crate::ports::{CompletionOptions, TextCompletion};
use crate::prompt;

/// Longest plan accepted from the model
const MAX_TODOS: usize = 8;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:(?:step\s+)?\d+\s*[.):\-]|[-*\u{2022}])\s*").expect("valid regex")
});

fn has_word(lower: &str, candidates: &[&str]) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| candidates.contains(&w))
}

/// Decompose a request into todos without a model
///
/// Never returns an empty list.
#[must_use]
pub fn decompose_todos(request: &str) -> Vec<String> {
    let lower = request.to_lowercase();

    let steps: &[&str] = if has_word(&lower, &["test", "tests", "unittest"]) {
        &[
            "Identify the behaviour to cover",
            "Write the test cases",
            "Add assertions for edge cases",
        ]
    } else if has_word(&lower, &["api", "endpoint", "endpoints", "server", "rest"]) {
        &[
            "Set up the server and routes",
            "Implement the request handlers",
            "Add error handling and responses",
        ]
    } else if has_word(&lower, &["database", "sql", "table", "schema"]) {
        &[
            "Design the table schema",
            "Write the create statements",
            "Add example queries",
        ]
    } else if has_word(&lower, &["web", "website", "webpage", "html", "page"]) {
        &[
            "Create the page structure",
            "Add styling",
            "Add interactive behaviour",
        ]
    } else if has_word(&lower, &["class", "object"]) {
        &[
            "Define the class and its attributes",
            "Implement the class methods",
            "Add example usage",
        ]
    } else if has_word(&lower, &["function", "method"]) {
        &[
            "Define the function signature",
            "Implement the function logic",
            "Add example usage",
        ]
    } else {
        let request = request.trim();
        let goal = if request.is_empty() {
            "Implement the requested functionality".to_string()
        } else {
            format!("Implement: {request}")
        };
        return vec!["Set up the file structure".to_string(), goal];
    };

    steps.iter().map(ToString::to_string).collect()
}

/// Parse a numbered or bulleted list out of a model reply
///
/// When any line carries a list marker, unmarked lines are treated as
/// surrounding prose and dropped.
#[must_use]
pub fn parse_todo_list(reply: &str) -> Vec<String> {
    let lines: Vec<(bool, String)> = reply
        .lines()
        .filter(|line| !line.trim().starts_with("```"))
        .map(|line| {
            (
                LIST_MARKER.is_match(line),
                LIST_MARKER.replace(line, "").trim().to_string(),
            )
        })
        .filter(|(_, line)| !line.is_empty() && !line.ends_with(':'))
        .collect();
    let any_marked = lines.iter().any(|(marked, _)| *marked);

    lines
        .into_iter()
        .filter(|(marked, _)| *marked || !any_marked)
        .map(|(_, line)| line)
        .take(MAX_TODOS)
        .collect()
}

/// Plan todos with the model, falling back to [`decompose_todos`]
pub async fn plan_todos(completion: &dyn TextCompletion, request: &str) -> Vec<String> {
    let options = CompletionOptions::default().with_max_tokens(300);
    match completion.complete(&prompt::todo_prompt(request), &options).await {
        Ok(reply) => {
            let todos = parse_todo_list(&reply);
            if todos.is_empty() {
                tracing::warn!("model returned no todos, using heuristic plan");
                decompose_todos(request)
            } else {
                todos
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "todo planning failed, using heuristic plan");
            decompose_todos(request)
        }
    }
}

/// One-sentence spoken summary of a plan
#[must_use]
pub fn plan_summary(todos: &[String]) -> String {
    match todos {
        [] => "I don't have a plan yet.".to_string(),
        [only] => format!("I have one step planned: {only}."),
        [first, rest @ ..] => format!(
            "I've broken this into {} steps, starting with: {first}.",
            rest.len() + 1
        ),
    }
}

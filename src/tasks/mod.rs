//! Task handlers invoked by the dialogue engine

pub mod analysis;
pub mod codegen;
pub mod files;
pub mod review;
mod templates;
pub mod todo;

pub use analysis::{AnalysisKind, analyze_clipboard, discuss};
pub use codegen::{CodeRequest, GeneratedCode, TaskType, draft_code, generate_code};
pub use files::{FileOperation, Workspace};
pub use review::{run_review, simple_summary, spoken_message};
pub use todo::{decompose_todos, parse_todo_list, plan_summary, plan_todos};

/// Cut `text` to at most `max_chars`, preferring a sentence end, and append `tail`
///
/// Text that already fits is returned unchanged.
#[must_use]
pub fn shorten_for_speech(text: &str, max_chars: usize, tail: &str) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let head = &text[..cut];
    let head = head
        .rfind(['.', '!', '?'])
        .filter(|&end| end > cut / 2)
        .map_or(head, |end| &head[..=end]);
    format!("{}... {tail}", head.trim_end_matches(['.', '!', '?']).trim_end())
}

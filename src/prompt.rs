//! Prompt templates and fixed spoken phrases
//!
//! Prompts are configuration, not code paths: every builder here returns
//! plain text that a [`TextCompletion`](crate::ports::TextCompletion) sees
//! verbatim.

use crate::classify::Language;

/// System instruction for anything read aloud
pub const VOICE_SYSTEM: &str = "You are a friendly pair programming partner speaking out loud. \
Answer in two or three short conversational sentences. Never use markdown, bullet points or code blocks.";

/// System instruction for code generation
pub const CODE_SYSTEM: &str = "You are an expert programmer. Reply with a single complete source file \
and nothing else. Do not wrap it in markdown fences.";

/// Spoken phrases used by the dialogue engine
pub mod speech {
    pub const GREETING: &str = "Hi! What would you like to work on?";
    pub const NOTHING_HEARD: &str = "I didn't hear anything. Could you say that again?";
    pub const GIVE_UP_LISTENING: &str =
        "I'm having trouble hearing you. Say the wake word when you're ready.";
    pub const DIDNT_CATCH: &str = "Sorry, I didn't catch that.";
    pub const SAY_AGAIN: &str = "I'm sorry, can you say it again?";
    pub const STILL_THERE: &str = "Are you still there? Just say yes or no.";
    pub const YES_OR_NO: &str = "Sorry, was that a yes or a no?";
    pub const APOLOGY: &str =
        "Sorry, something went wrong on my end. Let's start over when you're ready.";
    pub const GOODBYE: &str =
        "Thanks for pair programming with me! Just say the wake word whenever you need me again.";
    pub const NEXT_REQUEST: &str = "Great! What would you like me to help you with next?";
    pub const ANYTHING_ELSE: &str = "Is there anything else you'd like me to help you with?";
    pub const SIGN_OFF: &str = "Perfect! Just say the wake word to start a new session. Goodbye!";
    pub const PLAN_REJECTED: &str = "Okay, I won't start on that.";
    pub const ANY_CHANGES: &str = "Would you like any changes to the code?";
    pub const WHAT_TO_CHANGE: &str = "What would you like me to change?";
    pub const ITERATION_LIMIT: &str =
        "That's as many revisions as I can do for this task, so I'll leave it here.";
    pub const CLARIFY: &str = "Sorry, I didn't quite get that. You can say yes, no, change, help or wait.";
    pub const WAITING: &str = "Sure, take your time. Just let me know when you're ready.";
    pub const STOPPING_EARLY: &str = "Okay, I'll stop here.";
    pub const REVIEW_STARTED: &str = "Running a code review on your project. This can take a minute.";
    pub const REVIEW_RATE_LIMITED: &str =
        "The code review service is rate limited right now. Please try again in a few minutes.";
    pub const REVIEW_TIMEOUT: &str =
        "The code review took too long and timed out. Try again with fewer changes.";
    pub const REVIEW_FAILED: &str = "The code review didn't work this time.";
    pub const EMPTY_CLIPBOARD: &str = "I couldn't find any code in your clipboard. Copy the code you want me to look at, then ask again.";
}

/// Intent classification prompt; the model must answer with JSON only
#[must_use]
pub fn intent_prompt(utterance: &str) -> String {
    format!(
        r#"Classify this request from a programmer speaking to a voice pair programming assistant.

Request: "{utterance}"

Intents:
- coding: write, create or generate code
- review: review the code in the current project
- code_analysis: explain, review, optimize or debug code the user copied to the clipboard
- file_operations: open, read or list files
- explanation: explain a programming concept
- discussion: anything else

Reply with JSON only, in this shape:
{{"intent": "coding", "confidence": 0.9, "action": "generate_code", "message": "short acknowledgement", "extracted_info": {{}}}}"#
    )
}

/// Ask for a numbered implementation plan
#[must_use]
pub fn todo_prompt(request: &str) -> String {
    format!(
        "Break this programming request into two to five short implementation steps.\n\
         Request: {request}\n\n\
         Reply with a numbered list only, one step per line, no explanations."
    )
}

/// Ask for source code implementing the request
#[must_use]
pub fn code_prompt(
    request: &str,
    todos: &[String],
    language: Language,
    notes: &[String],
    previous: Option<&str>,
    feedback: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Write {} code for this request: {request}\n",
        language.display_name()
    );
    if !todos.is_empty() {
        prompt.push_str("\nCover these steps:\n");
        for (i, todo) in todos.iter().enumerate() {
            prompt.push_str(&format!("{}. {todo}\n", i + 1));
        }
    }
    if !notes.is_empty() {
        prompt.push_str("\nThe user also asked for:\n");
        for note in notes {
            prompt.push_str(&format!("- {note}\n"));
        }
    }
    if let Some(previous) = previous {
        prompt.push_str(&format!("\nCurrent version:\n{previous}\n"));
    }
    if let Some(feedback) = feedback {
        prompt.push_str(&format!("\nRevise it according to this feedback: {feedback}\n"));
    }
    prompt
}

/// Summarise raw reviewer output for speech
#[must_use]
pub fn review_summary_prompt(output: &str) -> String {
    format!(
        "Summarize this code review for a developer listening by voice. Mention how many issues \
         were found and the most important one. Keep it under three sentences.\n\n{output}"
    )
}

/// Answer a free-form programming question
#[must_use]
pub fn discussion_prompt(question: &str) -> String {
    format!("A developer asks: {question}\n\nAnswer briefly, as you would out loud.")
}

/// Analyse a snippet copied to the clipboard
#[must_use]
pub fn analysis_prompt(task: &str, language: Option<Language>, code: &str) -> String {
    let language = language.map_or("", Language::display_name);
    format!("{task} the following {language} code, briefly and conversationally:\n\n{code}")
}

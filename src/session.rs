//! Conversation state carried across dialogue turns

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::classify::Language;
use crate::ports::AudioClip;

/// Engine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    WakeWait,
    CaptureVoice,
    Transcribe,
    Confirm,
    ClassifyIntent,
    GenerateTodos,
    GenerateCode,
    ExplainCode,
    ReviewCode,
    CollectFeedback,
    IterateCode,
    CheckTodoCompletion,
    RespondAndOfferMore,
    End,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Whether the user confirmed the transcription of their request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Confirmation {
    #[default]
    Pending,
    Affirmed,
    Denied,
}

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Coding,
    Discussion,
    FileOperations,
    CodeAnalysis,
    Review,
    Explanation,
    Exit,
}

impl Intent {
    /// Parse a classifier label, tolerating case and spacing differences
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "coding" | "code" => Some(Self::Coding),
            "discussion" | "discuss" => Some(Self::Discussion),
            "file_operations" | "file_operation" | "files" => Some(Self::FileOperations),
            "code_analysis" | "analysis" => Some(Self::CodeAnalysis),
            "review" => Some(Self::Review),
            "explanation" | "explain" => Some(Self::Explanation),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coding => "coding",
            Self::Discussion => "discussion",
            Self::FileOperations => "file_operations",
            Self::CodeAnalysis => "code_analysis",
            Self::Review => "review",
            Self::Explanation => "explanation",
            Self::Exit => "exit",
        }
    }
}

/// Ordered todo list with a cursor counting completed items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQueue {
    todos: Vec<String>,
    cursor: usize,
}

impl TaskQueue {
    #[must_use]
    pub const fn new(todos: Vec<String>) -> Self {
        Self { todos, cursor: 0 }
    }

    #[must_use]
    pub fn todos(&self) -> &[String] {
        &self.todos
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// The todo being worked on, if any remain
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.todos.get(self.cursor).map(String::as_str)
    }

    /// Todos finished so far, including the current one once advanced
    #[must_use]
    pub fn completed(&self) -> &[String] {
        &self.todos[..self.cursor]
    }

    /// Mark the current todo done. Saturates at the end of the queue.
    pub fn advance(&mut self) {
        if self.cursor < self.todos.len() {
            self.cursor += 1;
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.todos.len()
    }

    /// Forget the todos not started yet
    pub fn drop_remaining(&mut self) {
        self.todos.truncate(self.cursor);
    }
}

/// Kinds of output a task can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    GeneratedCode,
    Review,
    Explanation,
}

/// A task result and where it was saved, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub content: String,
    pub path: Option<PathBuf>,
}

/// Coarse session outcome, reported in summaries and logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Active,
    Completed,
    RateLimited,
    Timeout,
    Error,
}

impl SessionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }
}

/// All state for one wake-to-idle conversation
#[derive(Debug, Clone)]
pub struct Session {
    pub step: Step,
    pub raw_utterance: String,
    pub confirmed: Confirmation,
    pub intent: Option<Intent>,
    pub task_queue: TaskQueue,
    pub artifacts: HashMap<ArtifactKind, Artifact>,
    pub iteration_count: u32,
    pub max_iterations: u32,
    /// Prompts spoken since the user last answered
    pub spoken_prompts: Vec<String>,
    pub pending_audio: Option<AudioClip>,
    pub capture_attempts: u32,
    pub language: Option<Language>,
    pub feedback: Option<String>,
    pub step_notes: Vec<String>,
    pub status: SessionStatus,
    pub error_message: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(max_iterations: u32) -> Self {
        Self {
            step: Step::WakeWait,
            raw_utterance: String::new(),
            confirmed: Confirmation::Pending,
            intent: None,
            task_queue: TaskQueue::default(),
            artifacts: HashMap::new(),
            iteration_count: 0,
            max_iterations,
            spoken_prompts: Vec::new(),
            pending_audio: None,
            capture_attempts: 0,
            language: None,
            feedback: None,
            step_notes: Vec::new(),
            status: SessionStatus::Idle,
            error_message: None,
        }
    }

    /// Back to the zero state, keeping only the iteration bound
    pub fn reset(&mut self) {
        *self = Self::new(self.max_iterations);
    }

    /// Clear everything tied to the current request, keeping the conversation open
    pub fn reset_task(&mut self) {
        self.raw_utterance.clear();
        self.confirmed = Confirmation::Pending;
        self.intent = None;
        self.task_queue = TaskQueue::default();
        self.artifacts.clear();
        self.iteration_count = 0;
        self.pending_audio = None;
        self.capture_attempts = 0;
        self.language = None;
        self.feedback = None;
        self.step_notes.clear();
        self.status = SessionStatus::Active;
        self.error_message = None;
    }

    /// Forget prompts spoken in the current turn
    pub fn end_turn(&mut self) {
        self.spoken_prompts.clear();
    }

    /// Whether another feedback refinement round is allowed
    #[must_use]
    pub const fn can_iterate(&self) -> bool {
        self.iteration_count < self.max_iterations
    }

    #[must_use]
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.get(&kind)
    }

    /// Store a task result, replacing the previous one of the same kind
    pub fn set_artifact(&mut self, kind: ArtifactKind, content: String, path: Option<PathBuf>) {
        self.artifacts.insert(kind, Artifact { content, path });
    }

    /// Snapshot of what this session produced
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            request: self.raw_utterance.clone(),
            intent: self.intent,
            todos: self.task_queue.todos().to_vec(),
            artifacts: self.artifacts.clone(),
            iteration_count: self.iteration_count,
            status: self.status,
            error_message: self.error_message.clone(),
        }
    }
}

/// What a finished conversation left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub request: String,
    pub intent: Option<Intent>,
    pub todos: Vec<String>,
    pub artifacts: HashMap<ArtifactKind, Artifact>,
    pub iteration_count: u32,
    pub status: SessionStatus,
    pub error_message: Option<String>,
}

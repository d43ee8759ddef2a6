//! Pair Voice - a hands-free pair programming partner
//!
//! The assistant waits for a wake phrase, listens to a spoken request, reads
//! it back for confirmation and then plans, writes, reviews or explains code,
//! talking the user through each step.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Dialogue Engine                      │
//! │  transition table │ state handlers │ turn policies   │
//! └────────────────────┬────────────────────────────────┘
//!                      │ capability ports
//! ┌────────────────────▼────────────────────────────────┐
//! │  Microphone │ STT │ Speaker │ LLM │ Review │ Clipboard│
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod artifacts;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod llm;
pub mod policy;
pub mod ports;
pub mod prompt;
pub mod session;
pub mod tasks;
pub mod tools;
pub mod voice;

pub use classify::{
    Classifier, CompletionClassifier, IntentClassification, KeywordClassifier, Language,
};
pub use config::Config;
pub use engine::{Capabilities, DialogueEngine, EngineSettings, Outcome, StepReport};
pub use error::{Error, Result};
pub use llm::OpenAiCompletion;
pub use ports::{
    AudioClip, AudioInput, Clipboard, CompletionOptions, ExternalReviewer, ReviewReport,
    ReviewStatus, Synthesizer, TextCompletion, Transcriber, WakeWordListener,
};
pub use session::{
    Artifact, ArtifactKind, Confirmation, Intent, Session, SessionStatus, SessionSummary, Step,
    TaskQueue,
};
pub use tools::{CodeRabbitReviewer, SystemClipboard};

//! Text completion backends

mod openai;

pub use openai::OpenAiCompletion;

//! Subprocess-backed capabilities: code review and clipboard access

mod clipboard;
mod coderabbit;

pub use clipboard::SystemClipboard;
pub use coderabbit::{CodeRabbitReviewer, find_coderabbit};

//! Capability ports the dialogue engine depends on
//!
//! Every external effect (microphone, speech services, text completion,
//! code review, clipboard) sits behind one of these traits so the engine can
//! be driven by real devices or by scripted test doubles. Audio device
//! handles are not `Send`, so the traits are declared `?Send` and the engine
//! runs as a single actor on the calling task.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A span of mono PCM audio
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    #[must_use]
    pub const fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// An empty clip, meaning nothing usable was heard
    #[must_use]
    pub const fn silence(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Clip length
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}

/// Blocks until the wake phrase is heard
#[async_trait(?Send)]
pub trait WakeWordListener {
    /// Listen for the wake phrase
    ///
    /// Returns `false` when `timeout` elapses without a detection.
    async fn listen(&self, timeout: Option<Duration>) -> Result<bool>;
}

/// Microphone capture
#[async_trait(?Send)]
pub trait AudioInput {
    /// Record until trailing silence or `max_duration`
    ///
    /// Implementations discard audio buffered before the call. An empty clip
    /// means no speech was captured.
    async fn capture_until_silence(
        &self,
        max_duration: Duration,
        silence_threshold: f32,
    ) -> Result<AudioClip>;
}

/// Speech-to-text
#[async_trait(?Send)]
pub trait Transcriber {
    /// Transcribe a clip; returns an empty string when nothing was said
    async fn transcribe(&self, clip: &AudioClip) -> Result<String>;
}

/// Text-to-speech with playback
#[async_trait(?Send)]
pub trait Synthesizer {
    /// Speak `text`, returning once playback finishes or is stopped
    async fn speak(&self, text: &str) -> Result<()>;

    /// Interrupt any playback in progress
    fn stop(&self);
}

/// Sampling options for a completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// System instruction placed before the prompt
    pub system: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            system: None,
            temperature: 0.3,
            max_tokens: 800,
        }
    }
}

impl CompletionOptions {
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Large language model text completion
#[async_trait(?Send)]
pub trait TextCompletion {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}

/// Outcome category of an external review run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Completed,
    RateLimited,
    Timeout,
    Error,
}

impl ReviewStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }
}

/// Result of reviewing a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReport {
    pub status: ReviewStatus,
    /// Raw tool output (stdout, or stderr on failure)
    pub output: String,
    /// Short summary suitable for speech; filled in by the caller when empty
    pub summary: String,
}

impl ReviewReport {
    #[must_use]
    pub fn new(status: ReviewStatus, output: impl Into<String>) -> Self {
        Self {
            status,
            output: output.into(),
            summary: String::new(),
        }
    }
}

/// Out-of-process code reviewer
///
/// Review never fails as a call. Every failure mode is a [`ReviewStatus`].
#[async_trait(?Send)]
pub trait ExternalReviewer {
    async fn review_directory(&self, dir: &Path) -> ReviewReport;
}

/// System clipboard
#[async_trait(?Send)]
pub trait Clipboard {
    async fn read(&self) -> Result<String>;
}

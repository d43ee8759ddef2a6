//! Speaking and listening within a single dialogue turn

use std::time::Duration;

use crate::Result;
use crate::ports::{AudioInput, Synthesizer, Transcriber};
use crate::session::Session;

/// The speech ports a turn needs, plus capture tuning
pub struct Turn<'a> {
    synthesizer: &'a dyn Synthesizer,
    input: &'a dyn AudioInput,
    transcriber: &'a dyn Transcriber,
    silence_threshold: f32,
    response_window: Duration,
}

impl<'a> Turn<'a> {
    #[must_use]
    pub fn new(
        synthesizer: &'a dyn Synthesizer,
        input: &'a dyn AudioInput,
        transcriber: &'a dyn Transcriber,
        silence_threshold: f32,
        response_window: Duration,
    ) -> Self {
        Self {
            synthesizer,
            input,
            transcriber,
            silence_threshold,
            response_window,
        }
    }

    /// Speak `text` unless it was already spoken in this turn
    ///
    /// Returns whether anything was spoken.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    pub async fn say(&self, session: &mut Session, text: &str) -> Result<bool> {
        if session.spoken_prompts.iter().any(|p| p == text) {
            tracing::debug!(text, "prompt already spoken this turn");
            return Ok(false);
        }
        tracing::info!(text, "speaking");
        self.synthesizer.speak(text).await?;
        session.spoken_prompts.push(text.to_string());
        Ok(true)
    }

    /// Speak a question the user is expected to answer
    ///
    /// A question still waiting for its answer is not asked again.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    pub async fn ask(&self, session: &mut Session, question: &str) -> Result<bool> {
        self.say(session, question).await
    }

    /// Capture a short answer
    ///
    /// # Errors
    ///
    /// Returns error if the microphone fails
    pub async fn hear(&self, session: &mut Session) -> Result<Option<String>> {
        self.listen(session, self.response_window).await
    }

    /// Capture and transcribe up to `window` of speech
    ///
    /// Returns `None` on silence. A failed transcription also counts as
    /// silence so callers fall back to their silence default. Hearing speech
    /// ends the turn.
    ///
    /// # Errors
    ///
    /// Returns error if the microphone fails
    pub async fn listen(&self, session: &mut Session, window: Duration) -> Result<Option<String>> {
        let clip = self
            .input
            .capture_until_silence(window, self.silence_threshold)
            .await?;
        if clip.is_empty() {
            tracing::debug!("no speech captured");
            return Ok(None);
        }

        let text = match self.transcriber.transcribe(&clip).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed, treating as silence");
                return Ok(None);
            }
        };
        if text.is_empty() {
            return Ok(None);
        }

        tracing::info!(heard = %text, "user replied");
        session.end_turn();
        Ok(Some(text))
    }
}

//! Wake word detection
//!
//! Local energy detection finds speech segments; a transcript check against
//! the configured phrases confirms the wake word. The same detector, once
//! activated, end-points the utterance that follows.

use super::capture::{SAMPLE_RATE, rms};

/// Minimum duration of speech to count as an utterance (0.3 s)
const MIN_SPEECH_SAMPLES: usize = SAMPLE_RATE as usize * 3 / 10;

/// Trailing silence that ends an utterance (0.5 s)
const SILENCE_SAMPLES: usize = SAMPLE_RATE as usize / 2;

/// State of the wake word detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Detected potential speech, accumulating
    Listening,
    /// Wake word detected, capturing utterance
    Activated,
}

/// Detects wake words and end-points utterances
pub struct WakeWordDetector {
    wake_words: Vec<String>,
    threshold: f32,
    state: DetectorState,
    speech_buffer: Vec<f32>,
    speech_samples: usize,
    silence_counter: usize,
}

impl WakeWordDetector {
    /// Create a detector for `wake_words` using `threshold` as the speech RMS floor
    #[must_use]
    pub fn new(wake_words: Vec<String>, threshold: f32) -> Self {
        let wake_words: Vec<String> = wake_words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        tracing::debug!(?wake_words, threshold, "wake word detector initialized");

        Self {
            wake_words,
            threshold,
            state: DetectorState::Idle,
            speech_buffer: Vec::new(),
            speech_samples: 0,
            silence_counter: 0,
        }
    }

    /// Feed a block of samples
    ///
    /// Returns true when a speech segment has ended and is ready for a wake
    /// word check. Activated detectors keep accumulating and never return true;
    /// poll [`Self::is_utterance_complete`] instead.
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = rms(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Listening;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.speech_samples = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected, listening");
                }
            }
            DetectorState::Listening => {
                self.accumulate(samples, is_speech);

                if self.silence_counter > SILENCE_SAMPLES
                    && self.speech_samples > MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(samples = self.speech_buffer.len(), "speech segment complete");
                    return true;
                }

                if self.silence_counter > SILENCE_SAMPLES * 2 {
                    tracing::trace!("too little speech, resetting");
                    self.reset();
                }
            }
            DetectorState::Activated => {
                // Leading silence before the user starts talking is dropped
                if is_speech || self.speech_samples > 0 {
                    self.accumulate(samples, is_speech);
                }
            }
        }

        false
    }

    fn accumulate(&mut self, samples: &[f32], is_speech: bool) {
        self.speech_buffer.extend_from_slice(samples);
        if is_speech {
            self.speech_samples += samples.len();
            self.silence_counter = 0;
        } else {
            self.silence_counter += samples.len();
        }
    }

    /// Check a transcript for a wake word, activating on a match
    pub fn check_wake_word(&mut self, transcript: &str) -> bool {
        let normalized = transcript.to_lowercase();

        if let Some(wake_word) = self.wake_words.iter().find(|w| normalized.contains(w.as_str())) {
            tracing::info!(wake_word, transcript, "wake word detected");
            self.activate();
            return true;
        }

        self.reset();
        false
    }

    /// Take the speech buffer, clearing it
    pub fn take_speech_buffer(&mut self) -> Vec<f32> {
        self.speech_samples = 0;
        std::mem::take(&mut self.speech_buffer)
    }

    /// Whether enough speech has been heard to make an utterance
    #[must_use]
    pub const fn has_speech(&self) -> bool {
        self.speech_samples > MIN_SPEECH_SAMPLES
    }

    /// Whether an activated utterance has ended in silence
    #[must_use]
    pub fn is_utterance_complete(&self) -> bool {
        self.state == DetectorState::Activated
            && self.silence_counter > SILENCE_SAMPLES
            && self.has_speech()
    }

    /// Reset detector to idle state
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.speech_buffer.clear();
        self.speech_samples = 0;
        self.silence_counter = 0;
    }

    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }

    #[must_use]
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }

    /// Skip the wake word and start capturing an utterance
    pub fn activate(&mut self) {
        self.state = DetectorState::Activated;
        self.speech_buffer.clear();
        self.speech_samples = 0;
        self.silence_counter = 0;
    }
}

//! Microphone-backed ports: request capture and wake phrase listening

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncBufReadExt;
use tokio::time::Instant;

use super::capture::{AudioCapture, SAMPLE_RATE};
use super::stt::SpeechToText;
use super::wake_word::WakeWordDetector;
use crate::ports::{AudioClip, AudioInput, Transcriber, WakeWordListener};
use crate::Result;

/// How often the capture buffer is drained
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Give up on a capture when nobody starts talking within this long
const LEAD_IN: Duration = Duration::from_secs(8);

/// Shortest segment worth sending for a wake phrase check (0.5 s)
const MIN_WAKE_SAMPLES: usize = SAMPLE_RATE as usize / 2;

/// Captures spoken requests from a shared microphone
pub struct MicrophoneInput {
    capture: Rc<AudioCapture>,
}

impl MicrophoneInput {
    #[must_use]
    pub const fn new(capture: Rc<AudioCapture>) -> Self {
        Self { capture }
    }
}

#[async_trait(?Send)]
impl AudioInput for MicrophoneInput {
    async fn capture_until_silence(
        &self,
        max_duration: Duration,
        silence_threshold: f32,
    ) -> Result<AudioClip> {
        // Anything buffered belongs to an earlier prompt
        self.capture.discard();

        let mut detector = WakeWordDetector::new(Vec::new(), silence_threshold);
        detector.activate();

        let started = Instant::now();
        let deadline = started + max_duration;
        let lead_in = started + LEAD_IN.min(max_duration);

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            detector.process(&self.capture.drain());

            if detector.is_utterance_complete() {
                break;
            }
            let now = Instant::now();
            if now >= deadline || (now >= lead_in && !detector.has_speech()) {
                break;
            }
        }

        if !detector.has_speech() {
            tracing::debug!("no speech before timeout");
            return Ok(AudioClip::silence(SAMPLE_RATE));
        }

        let samples = detector.take_speech_buffer();
        tracing::debug!(samples = samples.len(), "utterance captured");
        Ok(AudioClip::new(samples, SAMPLE_RATE))
    }
}

/// Hands-free wake phrase detection: energy gate plus transcript check
pub struct MicrophoneWakeWord {
    capture: Rc<AudioCapture>,
    stt: SpeechToText,
    wake_words: Vec<String>,
    silence_threshold: f32,
    on_detect: Option<Box<dyn Fn(&str)>>,
}

impl MicrophoneWakeWord {
    #[must_use]
    pub fn new(
        capture: Rc<AudioCapture>,
        stt: SpeechToText,
        wake_words: Vec<String>,
        silence_threshold: f32,
    ) -> Self {
        Self {
            capture,
            stt,
            wake_words,
            silence_threshold,
            on_detect: None,
        }
    }

    /// Register a callback fired with the transcript on each detection
    pub fn set_on_detect<F>(&mut self, callback: F)
    where
        F: Fn(&str) + 'static,
    {
        self.on_detect = Some(Box::new(callback));
    }

    /// Check one finished speech segment for the wake phrase
    async fn verify(&self, detector: &mut WakeWordDetector) -> bool {
        let samples = detector.take_speech_buffer();
        if samples.len() <= MIN_WAKE_SAMPLES {
            detector.reset();
            return false;
        }

        let clip = AudioClip::new(samples, SAMPLE_RATE);
        match self.stt.transcribe(&clip).await {
            Ok(transcript) => {
                tracing::debug!(transcript = %transcript, "checking for wake word");
                if detector.check_wake_word(&transcript) {
                    if let Some(callback) = &self.on_detect {
                        callback(&transcript);
                    }
                    return true;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "wake phrase transcription failed");
                detector.reset();
            }
        }
        false
    }
}

#[async_trait(?Send)]
impl WakeWordListener for MicrophoneWakeWord {
    async fn listen(&self, timeout: Option<Duration>) -> Result<bool> {
        let mut detector = WakeWordDetector::new(self.wake_words.clone(), self.silence_threshold);
        let deadline = timeout.map(|t| Instant::now() + t);
        self.capture.discard();
        tracing::info!(wake_words = ?self.wake_words, "listening for wake word");

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(false);
            }

            let samples = self.capture.drain();
            if samples.is_empty() {
                continue;
            }

            if detector.process(&samples) && self.verify(&mut detector).await {
                self.capture.discard();
                return Ok(true);
            }
        }
    }
}

/// Degraded wake mode: the user presses Enter instead of speaking
pub struct ManualWakeWord;

#[async_trait(?Send)]
impl WakeWordListener for ManualWakeWord {
    async fn listen(&self, timeout: Option<Duration>) -> Result<bool> {
        tracing::info!("press Enter to start a session");
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

        let line = match timeout {
            Some(t) => match tokio::time::timeout(t, lines.next_line()).await {
                Ok(line) => line?,
                Err(_) => return Ok(false),
            },
            None => lines.next_line().await?,
        };

        // Closed stdin means nobody is left to press Enter
        Ok(line.is_some())
    }
}

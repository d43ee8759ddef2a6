//! Spoken output: synthesis followed by interruptible playback

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use crate::Result;
use crate::ports::Synthesizer;

/// Speaks text through the default output device
pub struct Speaker {
    tts: TextToSpeech,
    playback: AudioPlayback,
    stopped: AtomicBool,
}

impl Speaker {
    #[must_use]
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self {
            tts,
            playback,
            stopped: AtomicBool::new(false),
        }
    }
}

#[async_trait(?Send)]
impl Synthesizer for Speaker {
    async fn speak(&self, text: &str) -> Result<()> {
        self.stopped.store(false, Ordering::Release);
        let mp3 = self.tts.synthesize(text).await?;
        if self.stopped.load(Ordering::Acquire) {
            return Ok(());
        }
        self.playback.play_mp3(&mp3, &self.stopped).await
    }

    fn stop(&self) {
        tracing::debug!("stopping playback");
        self.stopped.store(true, Ordering::Release);
    }
}

//! Audio devices and speech services
//!
//! Everything here implements one of the capability ports in
//! [`crate::ports`]: the microphone captures requests and listens for the
//! wake phrase, the speaker synthesizes and plays replies, and
//! [`SpeechToText`] transcribes.

mod capture;
mod microphone;
mod playback;
mod speaker;
mod stt;
mod tts;
mod wake_word;

pub use capture::{AudioCapture, SAMPLE_RATE, peak, rms, samples_to_wav};
pub use microphone::{ManualWakeWord, MicrophoneInput, MicrophoneWakeWord};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, test_tone};
pub use speaker::Speaker;
pub use stt::{DEEPGRAM_WAKE_MODEL, SpeechToText};
pub use tts::{ELEVENLABS_DEFAULT_VOICE, TextToSpeech};
pub use wake_word::{DetectorState, WakeWordDetector};

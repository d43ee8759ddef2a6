//! Speech-to-text over Whisper or Deepgram

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::capture::samples_to_wav;
use crate::ports::{AudioClip, Transcriber};
use crate::{Error, Result, http};

const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const DEEPGRAM_URL: &str = "https://api.deepgram.com/v1/listen";

/// Deepgram model used for quick wake phrase checks
pub const DEEPGRAM_WAKE_MODEL: &str = "nova-2";

#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

#[derive(Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

impl DeepgramResponse {
    fn into_transcript(self) -> String {
        self.results
            .channels
            .into_iter()
            .next()
            .and_then(|c| c.alternatives.into_iter().next())
            .map(|a| a.transcript)
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Provider {
    Whisper,
    Deepgram,
}

impl Provider {
    const fn name(self) -> &'static str {
        match self {
            Self::Whisper => "Whisper",
            Self::Deepgram => "Deepgram",
        }
    }
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    provider: Provider,
}

impl SpeechToText {
    /// Transcribe with `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the client can't be built
    pub fn new_whisper(
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Self::new(api_key, model.into(), Provider::Whisper, timeout)
    }

    /// Transcribe with Deepgram
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the client can't be built
    pub fn new_deepgram(
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Self::new(api_key, model.into(), Provider::Deepgram, timeout)
    }

    fn new(
        api_key: SecretString,
        model: String,
        provider: Provider,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config(format!(
                "{} API key required for transcription",
                provider.name()
            )));
        }

        Ok(Self {
            client: http::client(timeout)?,
            api_key,
            model,
            provider,
        })
    }

    /// Transcribe WAV bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it
    pub async fn transcribe_wav(&self, wav: Vec<u8>) -> Result<String> {
        tracing::debug!(
            provider = self.provider.name(),
            audio_bytes = wav.len(),
            "starting transcription"
        );

        let request = match self.provider {
            Provider::Whisper => {
                let file = reqwest::multipart::Part::bytes(wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?;
                let form = reqwest::multipart::Form::new()
                    .part("file", file)
                    .text("model", self.model.clone());
                self.client
                    .post(WHISPER_URL)
                    .bearer_auth(self.api_key.expose_secret())
                    .multipart(form)
            }
            Provider::Deepgram => self
                .client
                .post(DEEPGRAM_URL)
                .query(&[("model", self.model.as_str()), ("punctuate", "true")])
                .header(
                    "Authorization",
                    format!("Token {}", self.api_key.expose_secret()),
                )
                .header("Content-Type", "audio/wav")
                .body(wav),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(provider = self.provider.name(), %status, "transcription rejected");
            return Err(Error::Stt(format!(
                "{} API error {status}: {body}",
                self.provider.name()
            )));
        }

        let transcript = match self.provider {
            Provider::Whisper => response.json::<WhisperResponse>().await?.text,
            Provider::Deepgram => response.json::<DeepgramResponse>().await?.into_transcript(),
        };

        tracing::debug!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}

#[async_trait(?Send)]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String> {
        if clip.is_empty() {
            return Ok(String::new());
        }
        let wav = samples_to_wav(&clip.samples, clip.sample_rate)?;
        let text = self.transcribe_wav(wav).await?;
        Ok(text.trim().to_string())
    }
}

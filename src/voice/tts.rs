//! Text-to-speech over `OpenAI` or `ElevenLabs`

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::{Error, Result, http};

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// `ElevenLabs` voice used when the configured voice is an `OpenAI` name
pub const ELEVENLABS_DEFAULT_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";
const ELEVENLABS_MODEL: &str = "eleven_monolingual_v1";

#[derive(Serialize)]
struct OpenAiSpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
}

#[derive(Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Clone, Debug)]
enum Provider {
    OpenAi { model: String, speed: f32 },
    ElevenLabs { model: String },
}

/// Synthesizes MP3 speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    provider: Provider,
}

impl TextToSpeech {
    /// Speak with `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the client can't be built
    pub fn new_openai(
        api_key: SecretString,
        model: impl Into<String>,
        voice: impl Into<String>,
        speed: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let provider = Provider::OpenAi {
            model: model.into(),
            speed: speed.clamp(0.25, 4.0),
        };
        Self::new(api_key, voice.into(), provider, timeout)
    }

    /// Speak with `ElevenLabs`
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the client can't be built
    pub fn new_elevenlabs(
        api_key: SecretString,
        voice_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let provider = Provider::ElevenLabs {
            model: ELEVENLABS_MODEL.to_string(),
        };
        Self::new(api_key, voice_id.into(), provider, timeout)
    }

    fn new(
        api_key: SecretString,
        voice: String,
        provider: Provider,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config("TTS API key required".to_string()));
        }
        Ok(Self {
            client: http::client(timeout)?,
            api_key,
            voice,
            provider,
        })
    }

    /// Synthesize `text` to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = match &self.provider {
            Provider::OpenAi { model, speed } => self
                .client
                .post(OPENAI_SPEECH_URL)
                .bearer_auth(self.api_key.expose_secret())
                .json(&OpenAiSpeechRequest {
                    model,
                    input: text,
                    voice: &self.voice,
                    speed: *speed,
                }),
            Provider::ElevenLabs { model } => self
                .client
                .post(format!("{ELEVENLABS_URL}/{}", self.voice))
                .header("xi-api-key", self.api_key.expose_secret())
                .json(&ElevenLabsRequest {
                    text,
                    model_id: model,
                }),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("speech synthesis error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), chars = text.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

//! Configuration management for the voice assistant
//!
//! Values resolve as environment variable > TOML file > built-in default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::{Error, Result};
use file::PairVoiceConfigFile;

/// Wake phrase used when none is configured
pub const DEFAULT_WAKE_WORD: &str = "blueberry";

/// Deadline for a single speech or completion request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Assistant configuration
#[derive(Debug)]
pub struct Config {
    /// Voice configuration
    pub voice: VoiceConfig,

    /// Dialogue session tuning
    pub session: SessionConfig,

    /// External code review
    pub review: ReviewConfig,

    /// Text completion model
    pub llm: LlmConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Deadline for each speech and completion request
    pub request_timeout: Duration,

    /// Directory generated files are written to and file operations are confined to
    pub workspace_dir: PathBuf,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Wake phrases, lowercase
    pub wake_words: Vec<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Stop waiting for the wake word after this long (`None` waits forever)
    pub wake_timeout: Option<Duration>,

    /// Maximum length of a spoken request
    pub utterance_window: Duration,

    /// Maximum length of a short answer
    pub response_window: Duration,

    /// RMS energy separating speech from silence
    pub silence_threshold: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            wake_words: vec![DEFAULT_WAKE_WORD.to_string()],
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            wake_timeout: None,
            utterance_window: Duration::from_secs(30),
            response_window: Duration::from_secs(5),
            silence_threshold: 0.03,
        }
    }
}

/// Dialogue session tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on feedback refinement rounds per task (at least 1)
    pub max_iterations: u32,

    /// Re-asks allowed when a yes/no answer is unclear
    pub ambiguous_retries: u32,

    /// Re-asks allowed when nobody answers
    pub silent_retries: u32,

    /// Re-recordings allowed when a request capture comes back empty
    pub capture_retries: u32,

    /// Language used when the request names none
    pub default_language: String,

    /// Check in with the user between todos
    pub discuss_each_step: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            ambiguous_retries: 1,
            silent_retries: 1,
            capture_retries: 1,
            default_language: "python".to_string(),
            discuss_each_step: true,
        }
    }
}

/// External review configuration
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Explicit reviewer binary; discovered on `PATH` when unset
    pub command: Option<PathBuf>,

    /// Review timeout
    pub timeout: Duration,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Text completion configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
        }
    }
}

/// API keys for external services
#[derive(Debug)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper, TTS and chat completions); required
    pub openai: SecretString,

    /// `Deepgram` API key; enables wake phrase verification
    pub deepgram: Option<SecretString>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,
}

impl Config {
    /// Load configuration from the process environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if `OPENAI_API_KEY` is missing or a value fails to parse
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the OpenAI key is absent from both sources or an
    /// environment override has the wrong type
    pub fn from_sources<F>(fc: PairVoiceConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        // API keys (env > toml > None)
        let openai = non_empty(env("OPENAI_API_KEY").or(fc.api_keys.openai)).ok_or_else(|| {
            Error::Config("OPENAI_API_KEY is required (set it in the environment)".to_string())
        })?;
        let api_keys = ApiKeys {
            openai: SecretString::from(openai),
            deepgram: non_empty(env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram))
                .map(SecretString::from),
            elevenlabs: non_empty(env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs))
                .map(SecretString::from),
        };

        let defaults = VoiceConfig::default();
        let wake_words = env("PAIR_VOICE_WAKE_WORDS")
            .map(|s| s.split(',').map(ToString::to_string).collect::<Vec<_>>())
            .or(fc.voice.wake_words)
            .map(normalize_wake_words)
            .filter(|w| !w.is_empty())
            .unwrap_or(defaults.wake_words);

        let voice = VoiceConfig {
            wake_words,
            stt_model: env("PAIR_VOICE_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(defaults.stt_model),
            tts_model: env("PAIR_VOICE_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or(defaults.tts_model),
            tts_voice: fc.voice.tts_voice.unwrap_or(defaults.tts_voice),
            tts_speed: fc.voice.tts_speed.unwrap_or(defaults.tts_speed).clamp(0.25, 4.0),
            wake_timeout: fc.voice.wake_timeout_secs.map(Duration::from_secs),
            utterance_window: fc
                .voice
                .utterance_secs
                .map_or(defaults.utterance_window, Duration::from_secs),
            response_window: fc
                .voice
                .response_secs
                .map_or(defaults.response_window, Duration::from_secs),
            silence_threshold: fc
                .voice
                .silence_threshold
                .unwrap_or(defaults.silence_threshold),
        };

        let session_defaults = SessionConfig::default();
        let max_iterations = match env("PAIR_VOICE_MAX_ITERATIONS") {
            Some(raw) => Some(raw.trim().parse::<u32>().map_err(|e| {
                Error::Config(format!("PAIR_VOICE_MAX_ITERATIONS must be a number: {e}"))
            })?),
            None => fc.session.max_iterations,
        };
        let session = SessionConfig {
            max_iterations: max_iterations
                .unwrap_or(session_defaults.max_iterations)
                .max(1),
            ambiguous_retries: fc
                .session
                .ambiguous_retries
                .unwrap_or(session_defaults.ambiguous_retries),
            silent_retries: fc
                .session
                .silent_retries
                .unwrap_or(session_defaults.silent_retries),
            capture_retries: fc
                .session
                .capture_retries
                .unwrap_or(session_defaults.capture_retries),
            default_language: fc
                .session
                .default_language
                .map(|l| l.to_lowercase())
                .unwrap_or(session_defaults.default_language),
            discuss_each_step: fc
                .session
                .discuss_each_step
                .unwrap_or(session_defaults.discuss_each_step),
        };

        let review = ReviewConfig {
            command: env("CODERABBIT_PATH")
                .or(fc.review.command)
                .map(PathBuf::from),
            timeout: fc
                .review
                .timeout_secs
                .map_or(ReviewConfig::default().timeout, Duration::from_secs),
        };

        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            model: env("PAIR_VOICE_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or(llm_defaults.model),
            temperature: fc.llm.temperature.unwrap_or(llm_defaults.temperature),
        };

        let request_timeout = match env("PAIR_VOICE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("PAIR_VOICE_REQUEST_TIMEOUT_SECS must be a number: {e}"))
            })?),
            None => fc.request_timeout_secs,
        }
        .map_or(DEFAULT_REQUEST_TIMEOUT, |secs| Duration::from_secs(secs.max(1)));

        let workspace_dir = env("PAIR_VOICE_WORKSPACE")
            .or(fc.workspace_dir)
            .map_or_else(
                || std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
                PathBuf::from,
            );

        if api_keys.deepgram.is_none() {
            tracing::warn!("DEEPGRAM_API_KEY not set, wake word detection disabled");
        }

        Ok(Self {
            voice,
            session,
            review,
            llm,
            api_keys,
            request_timeout,
            workspace_dir,
        })
    }

    /// Whether hands-free wake word detection is available
    #[must_use]
    pub const fn wake_word_enabled(&self) -> bool {
        self.api_keys.deepgram.is_some()
    }
}

fn normalize_wake_words(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

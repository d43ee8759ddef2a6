//! TOML configuration file loading
//!
//! Supports `~/.config/pair-voice/config.toml` as a persistent config source.
//! All fields are optional. The file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct PairVoiceConfigFile {
    /// Directory generated files are written to and file operations are confined to
    #[serde(default)]
    pub workspace_dir: Option<String>,

    /// Seconds before a speech or completion request is abandoned
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Dialogue session tuning
    #[serde(default)]
    pub session: SessionFileConfig,

    /// External code review
    #[serde(default)]
    pub review: ReviewFileConfig,

    /// Text completion model
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Wake phrases (e.g. `["blueberry"]`)
    pub wake_words: Option<Vec<String>>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// Give up waiting for the wake word after this many seconds
    pub wake_timeout_secs: Option<u64>,

    /// Maximum length of a spoken request
    pub utterance_secs: Option<u64>,

    /// Maximum length of a short answer (yes/no, feedback)
    pub response_secs: Option<u64>,

    /// RMS energy separating speech from silence
    pub silence_threshold: Option<f32>,
}

/// Dialogue session configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    pub max_iterations: Option<u32>,
    pub ambiguous_retries: Option<u32>,
    pub silent_retries: Option<u32>,
    pub capture_retries: Option<u32>,
    pub default_language: Option<String>,
    pub discuss_each_step: Option<bool>,
}

/// External review configuration
#[derive(Debug, Default, Deserialize)]
pub struct ReviewFileConfig {
    /// Explicit path to the `coderabbit` binary
    pub command: Option<String>,

    /// Review timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    /// Sampling temperature
    pub temperature: Option<f32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

impl PairVoiceConfigFile {
    /// Parse a config file from TOML text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML for this schema
    pub fn parse(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Load the TOML config file from the standard path
///
/// Returns `PairVoiceConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> PairVoiceConfigFile {
    let Some(path) = config_file_path() else {
        return PairVoiceConfigFile::default();
    };

    if !path.exists() {
        return PairVoiceConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match PairVoiceConfigFile::parse(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                PairVoiceConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            PairVoiceConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/pair-voice/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("pair-voice").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_file() {
        let file = PairVoiceConfigFile::parse(
            r#"
            [voice]
            wake_words = ["blueberry", "hey pair"]

            [session]
            max_iterations = 5
            "#,
        )
        .unwrap();

        assert_eq!(
            file.voice.wake_words,
            Some(vec!["blueberry".to_string(), "hey pair".to_string()])
        );
        assert_eq!(file.session.max_iterations, Some(5));
        assert!(file.llm.model.is_none());
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        assert!(PairVoiceConfigFile::parse("[session]\nmax_iterations = \"many\"").is_err());
    }
}

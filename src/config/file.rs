//! TOML configuration file loading
//!
//! Supports `~/.config/cctv-assistant/config.toml` as a persistent config
//! source. All fields are optional; the file is a partial overlay on top of
//! defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct AssistantConfigFile {
    /// Directory for history and other local state
    pub data_dir: Option<String>,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Session timing overrides
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Widget overlay, same shape as the embeddable `data-config` object
    pub widget: Option<toml::Value>,
}

/// Language model configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gemini-1.5-flash")
    pub model: Option<String>,

    /// Retries after a transient failure
    pub max_retries: Option<u32>,

    /// Seconds to stay offline after a failure before trying again
    pub offline_cooldown_secs: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// Recognition and synthesis locale (e.g. "id-ID")
    pub locale: Option<String>,

    /// STT provider ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// ElevenLabs voice identifier
    pub tts_voice_id: Option<String>,

    /// ElevenLabs model
    pub tts_model: Option<String>,

    /// Maximum characters per spoken chunk
    pub chunk_chars: Option<usize>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub gemini: Option<String>,
    pub elevenlabs: Option<String>,
    pub openai: Option<String>,
    pub deepgram: Option<String>,
}

/// Session timing configuration (milliseconds)
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    pub startup_delay_ms: Option<u64>,
    pub listen_window_ms: Option<u64>,
    pub retry_pause_ms: Option<u64>,
    pub restart_delay_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub words_per_second: Option<f64>,
    pub min_transcript_chars: Option<usize>,
}

/// Load the TOML config file from `path`, or the standard path when `None`
///
/// Returns `AssistantConfigFile::default()` if the file doesn't exist or
/// can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> AssistantConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return AssistantConfigFile::default();
    };

    if !path.exists() {
        return AssistantConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
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
                AssistantConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            AssistantConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/cctv-assistant/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("cctv-assistant").join("config.toml"))
}

//! Configuration management for the CCTV assistant
//!
//! Precedence is environment > TOML file > built-in defaults. Vendor
//! credentials are only ever read from the environment or the config file
//! and are held as [`SecretString`] so they never end up in logs.

pub mod file;
pub mod widget;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

pub use widget::{Customization, Features, Integration, Position, Size, Theme, WidgetConfig};

use crate::Result;

/// Default Gemini model
pub const DEFAULT_LLM_MODEL: &str = "gemini-1.5-flash";

/// Default ElevenLabs voice
pub const DEFAULT_TTS_VOICE_ID: &str = "GdyFAZdMpKMBHw5pc1Bu";

/// Default ElevenLabs model
pub const DEFAULT_TTS_MODEL: &str = "eleven_multilingual_v2";

/// Default recognition/synthesis locale
pub const DEFAULT_LOCALE: &str = "id-ID";

/// Assistant configuration
#[derive(Debug)]
pub struct Config {
    /// Directory for history and other local state
    pub data_dir: PathBuf,

    /// Language model configuration
    pub llm: LlmConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Session timings
    pub session: SessionConfig,

    /// Embeddable widget configuration
    pub widget: WidgetConfig,
}

/// Language model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Retries after a transient failure
    pub max_retries: u32,

    /// Base backoff delay, doubled per attempt
    pub retry_base_delay: Duration,

    /// How long to serve fallback replies after the model became unreachable
    pub offline_cooldown: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_LLM_MODEL.to_string(),
            max_retries: 2,
            retry_base_delay: Duration::from_secs(1),
            offline_cooldown: Duration::from_secs(5 * 60),
        }
    }
}

/// STT provider backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SttProvider {
    #[default]
    Whisper,
    Deepgram,
}

impl SttProvider {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "whisper" | "openai" => Some(Self::Whisper),
            "deepgram" => Some(Self::Deepgram),
            _ => None,
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input/output
    pub enabled: bool,

    /// Recognition and synthesis locale
    pub locale: String,

    /// STT provider
    pub stt_provider: SttProvider,

    /// STT model
    pub stt_model: String,

    /// ElevenLabs voice identifier
    pub tts_voice_id: String,

    /// ElevenLabs model
    pub tts_model: String,

    /// Maximum characters per spoken chunk
    pub chunk_chars: usize,

    /// Silence between spoken chunks
    pub chunk_pause: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locale: DEFAULT_LOCALE.to_string(),
            stt_provider: SttProvider::Whisper,
            stt_model: "whisper-1".to_string(),
            tts_voice_id: DEFAULT_TTS_VOICE_ID.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            chunk_chars: 200,
            chunk_pause: Duration::from_millis(300),
        }
    }
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// Google Gemini key
    pub gemini: Option<SecretString>,

    /// `ElevenLabs` key (primary TTS)
    pub elevenlabs: Option<SecretString>,

    /// `OpenAI` key (Whisper STT)
    pub openai: Option<SecretString>,

    /// Deepgram key (optional STT)
    pub deepgram: Option<SecretString>,
}

/// Session controller timings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Delay between entering continuous mode and the first window
    pub startup_delay: Duration,

    /// Length of one continuous-mode collection window
    pub listen_window: Duration,

    /// Pause before re-arming a window that collected nothing
    pub retry_pause: Duration,

    /// Delay before restarting the cycle after a turn completes
    pub restart_delay: Duration,

    /// Hold time after the last subtitle word before the avatar resets
    pub settle_delay: Duration,

    /// Subtitle reveal rate
    pub words_per_second: f64,

    /// A buffered transcript must be longer than this (in chars) to submit
    pub min_transcript_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_millis(1500),
            listen_window: Duration::from_secs(5),
            retry_pause: Duration::from_secs(1),
            restart_delay: Duration::from_secs(2),
            settle_delay: Duration::from_millis(1500),
            words_per_second: 2.5,
            min_transcript_chars: 2,
        }
    }
}

impl SessionConfig {
    /// Interval between subtitle words
    #[must_use]
    pub fn word_interval(&self) -> Duration {
        if self.words_per_second <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(1.0 / self.words_per_second)
    }
}

impl Config {
    /// Load configuration from the environment and an optional TOML file
    ///
    /// When `config_path` is `None` the standard location is used.
    ///
    /// # Errors
    ///
    /// Returns error if the widget section is invalid
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(config_path);
        let config = Self::from_sources(fc, |key| std::env::var(key).ok())?;

        // Ensure data dir exists
        std::fs::create_dir_all(&config.data_dir).ok();

        Ok(config)
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the widget section is invalid
    pub fn from_sources<F>(fc: file::AssistantConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |name: &str, fallback: Option<String>| {
            env(name)
                .or(fallback)
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from)
        };

        let api_keys = ApiKeys {
            gemini: secret("GEMINI_API_KEY", fc.api_keys.gemini),
            elevenlabs: secret("ELEVENLABS_API_KEY", fc.api_keys.elevenlabs),
            openai: secret("OPENAI_API_KEY", fc.api_keys.openai),
            deepgram: secret("DEEPGRAM_API_KEY", fc.api_keys.deepgram),
        };

        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            model: env("CCTV_ASSISTANT_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or(llm_defaults.model),
            max_retries: fc.llm.max_retries.unwrap_or(llm_defaults.max_retries),
            retry_base_delay: llm_defaults.retry_base_delay,
            offline_cooldown: fc
                .llm
                .offline_cooldown_secs
                .map_or(llm_defaults.offline_cooldown, Duration::from_secs),
        };

        let voice_defaults = VoiceConfig::default();
        let stt_provider = env("CCTV_ASSISTANT_STT_PROVIDER")
            .or(fc.voice.stt_provider)
            .map_or(voice_defaults.stt_provider, |s| {
                SttProvider::parse(&s).unwrap_or_else(|| {
                    tracing::warn!(provider = %s, "unknown STT provider, using whisper");
                    SttProvider::Whisper
                })
            });
        let voice = VoiceConfig {
            enabled: env("CCTV_ASSISTANT_DISABLE_VOICE")
                .map(|v| !(v == "1" || v.eq_ignore_ascii_case("true")))
                .or(fc.voice.enabled)
                .unwrap_or(voice_defaults.enabled),
            locale: env("CCTV_ASSISTANT_LOCALE")
                .or(fc.voice.locale)
                .unwrap_or(voice_defaults.locale),
            stt_provider,
            stt_model: fc.voice.stt_model.unwrap_or(voice_defaults.stt_model),
            tts_voice_id: env("ELEVENLABS_VOICE_ID")
                .or(fc.voice.tts_voice_id)
                .unwrap_or(voice_defaults.tts_voice_id),
            tts_model: fc.voice.tts_model.unwrap_or(voice_defaults.tts_model),
            chunk_chars: fc
                .voice
                .chunk_chars
                .filter(|&n| n > 0)
                .unwrap_or(voice_defaults.chunk_chars),
            chunk_pause: voice_defaults.chunk_pause,
        };

        let session_defaults = SessionConfig::default();
        let ms = |v: Option<u64>, d: Duration| v.map_or(d, Duration::from_millis);
        let session = SessionConfig {
            startup_delay: ms(fc.session.startup_delay_ms, session_defaults.startup_delay),
            listen_window: ms(fc.session.listen_window_ms, session_defaults.listen_window),
            retry_pause: ms(fc.session.retry_pause_ms, session_defaults.retry_pause),
            restart_delay: ms(fc.session.restart_delay_ms, session_defaults.restart_delay),
            settle_delay: ms(fc.session.settle_delay_ms, session_defaults.settle_delay),
            words_per_second: fc
                .session
                .words_per_second
                .unwrap_or(session_defaults.words_per_second),
            min_transcript_chars: fc
                .session
                .min_transcript_chars
                .unwrap_or(session_defaults.min_transcript_chars),
        };

        let widget = match fc.widget {
            Some(value) => WidgetConfig::from_overlay(&serde_json::to_value(value)?)?,
            None => WidgetConfig::default(),
        };

        // Determine data directory (~/.local/share/cctv-assistant on Linux)
        let data_dir = env("CCTV_ASSISTANT_DATA_DIR")
            .or(fc.data_dir)
            .map_or_else(default_data_dir, PathBuf::from);

        Ok(Self {
            data_dir,
            llm,
            voice,
            api_keys,
            session,
            widget,
        })
    }
}

/// Default data directory
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("cctv-assistant"))
}

/// Copy a secret without exposing it to logs
#[must_use]
pub fn clone_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

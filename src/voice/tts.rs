//! Text-to-speech backends

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::AudioPlayback;
use crate::config::{ApiKeys, VoiceConfig, clone_secret};
use crate::{Error, Result};

const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io/v1";

/// A speech engine that can say one chunk of text
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Short engine name for logs
    fn name(&self) -> &str;

    /// Whether the engine is believed to work right now
    async fn is_available(&self) -> bool;

    /// Speak `text`, returning when playback ends or `cancel` fires
    ///
    /// # Errors
    ///
    /// Returns `SynthesisFailed` or `Audio` if the text could not be spoken
    async fn speak(&self, text: &str, cancel: &CancellationToken) -> Result<()>;
}

/// Fixed voice parameters sent with every request
#[derive(Debug, Clone, Copy, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

const VOICE_SETTINGS: VoiceSettings = VoiceSettings {
    stability: 0.5,
    similarity_boost: 0.75,
    style: 0.4,
    use_speaker_boost: true,
};

#[derive(Debug, Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// `ElevenLabs` synthesis played through the default output device
///
/// A 401/403 from the API disables the engine for the rest of the process.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    api_key: SecretString,
    voice_id: String,
    model: String,
    base_url: String,
    rejected: AtomicBool,
}

impl ElevenLabsSynthesizer {
    /// Create an engine with the given voice and model
    #[must_use]
    pub fn new(api_key: SecretString, voice_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            voice_id: voice_id.into(),
            model: model.into(),
            base_url: ELEVENLABS_API_URL.to_string(),
            rejected: AtomicBool::new(false),
        }
    }

    /// Create an engine from configuration, if a key is present
    #[must_use]
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Option<Self> {
        keys.elevenlabs.as_ref().map(|key| {
            Self::new(clone_secret(key), voice.tts_voice_id.clone(), voice.tts_model.clone())
        })
    }

    /// Point the engine at a different API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Synthesize `text` to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns `SynthesisFailed` if the API rejects the request
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if self.rejected.load(Ordering::SeqCst) {
            return Err(Error::SynthesisFailed(
                "ElevenLabs credentials were rejected".to_string(),
            ));
        }

        let url = format!("{}/text-to-speech/{}", self.base_url, self.voice_id);
        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
            voice_settings: VOICE_SETTINGS,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.api_key.expose_secret())
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if is_auth_rejection(status.as_u16()) {
                self.mark_rejected();
            }
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SynthesisFailed(format!(
                "ElevenLabs TTS error {status}: {body}"
            )));
        }

        let audio = response.bytes().await?;
        tracing::debug!(audio_bytes = audio.len(), chars = text.chars().count(), "speech synthesized");
        Ok(audio.to_vec())
    }

    fn mark_rejected(&self) {
        if !self.rejected.swap(true, Ordering::SeqCst) {
            tracing::warn!("ElevenLabs rejected the API key, disabling for this session");
        }
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn is_available(&self) -> bool {
        if self.rejected.load(Ordering::SeqCst) {
            return false;
        }

        let response = self
            .client
            .get(format!("{}/user", self.base_url))
            .header("xi-api-key", self.api_key.expose_secret())
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => true,
            Ok(r) => {
                if is_auth_rejection(r.status().as_u16()) {
                    self.mark_rejected();
                }
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "ElevenLabs availability check failed");
                false
            }
        }
    }

    async fn speak(&self, text: &str, cancel: &CancellationToken) -> Result<()> {
        let audio = tokio::select! {
            audio = self.synthesize(text) => audio?,
            () = cancel.cancelled() => return Ok(()),
        };

        let playback = AudioPlayback::new()?;
        playback.play_mp3(&audio, cancel).await?;
        Ok(())
    }
}

const fn is_auth_rejection(status: u16) -> bool {
    status == 401 || status == 403
}

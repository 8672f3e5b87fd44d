//! Speech output with a primary engine and a local fallback

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{ElevenLabsSynthesizer, LocalSynthesizer, Synthesizer, chunk_for_speech};
use crate::config::Config;
use crate::{Error, Result};

/// Speaks replies one chunk at a time
///
/// Only one utterance plays at a time: starting a new one cancels the
/// previous one. If the primary engine fails, the rest of the utterance is
/// spoken by the fallback.
pub struct SpeechOutput {
    primary: Option<Arc<dyn Synthesizer>>,
    fallback: Option<Arc<dyn Synthesizer>>,
    chunk_chars: usize,
    chunk_pause: Duration,
    current: Mutex<CancellationToken>,
}

impl SpeechOutput {
    /// Create an output over the given engines
    #[must_use]
    pub fn new(
        primary: Option<Arc<dyn Synthesizer>>,
        fallback: Option<Arc<dyn Synthesizer>>,
        chunk_chars: usize,
        chunk_pause: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            chunk_chars,
            chunk_pause,
            current: Mutex::new(CancellationToken::new()),
        }
    }

    /// `ElevenLabs` when a key is configured, the local engine as fallback
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let primary = ElevenLabsSynthesizer::from_config(&config.voice, &config.api_keys)
            .map(|s| Arc::new(s) as Arc<dyn Synthesizer>);
        if primary.is_none() {
            tracing::info!("ELEVENLABS_API_KEY not set, using local speech only");
        }
        let fallback: Arc<dyn Synthesizer> = Arc::new(LocalSynthesizer::discover(&config.voice.locale));

        Self::new(
            primary,
            Some(fallback),
            config.voice.chunk_chars,
            config.voice.chunk_pause,
        )
    }

    /// Speak `text`, resolving when playback finishes or is stopped
    ///
    /// # Errors
    ///
    /// Returns `SynthesisFailed` if neither engine could speak a chunk
    pub async fn speak(&self, text: &str) -> Result<()> {
        let token = self.begin();
        let chunks = chunk_for_speech(text, self.chunk_chars);
        let mut use_primary = self.primary.is_some();

        tracing::debug!(chunks = chunks.len(), "speaking reply");

        for (i, chunk) in chunks.iter().enumerate() {
            if token.is_cancelled() {
                return Ok(());
            }

            if i > 0 {
                tokio::select! {
                    () = tokio::time::sleep(self.chunk_pause) => {}
                    () = token.cancelled() => return Ok(()),
                }
            }

            if use_primary {
                if let Some(primary) = &self.primary {
                    match primary.speak(chunk, &token).await {
                        Ok(()) => continue,
                        Err(e) => {
                            tracing::warn!(engine = primary.name(), error = %e, "primary speech failed, falling back");
                            use_primary = false;
                        }
                    }
                }
            }

            let Some(fallback) = &self.fallback else {
                return Err(Error::SynthesisFailed("no speech engine available".to_string()));
            };
            fallback
                .speak(chunk, &token)
                .await
                .map_err(|e| Error::SynthesisFailed(format!("{}: {e}", fallback.name())))?;
        }

        Ok(())
    }

    /// Halt playback immediately; safe to call at any time
    pub fn stop(&self) {
        self.lock().cancel();
    }

    /// Whether any engine is usable
    pub async fn check_availability(&self) -> bool {
        for engine in self.primary.iter().chain(self.fallback.iter()) {
            if engine.is_available().await {
                return true;
            }
        }
        false
    }

    /// Cancel whatever is playing and hand out a token for the next utterance
    fn begin(&self) -> CancellationToken {
        let mut current = self.lock();
        current.cancel();
        *current = CancellationToken::new();
        current.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

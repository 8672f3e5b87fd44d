//! Voice processing module
//!
//! Speech capture (microphone, utterance segmentation, remote STT) and
//! speech output (`ElevenLabs` with a local engine fallback).

mod capture;
mod chunking;
mod local;
mod microphone;
mod playback;
mod recognizer;
mod speaker;
mod stt;
mod tts;

pub use capture::{
    AudioCapture, SAMPLE_RATE, UtteranceSegmenter, calculate_energy, input_available,
    samples_to_wav,
};
pub use chunking::{DEFAULT_CHUNK_CHARS, chunk_for_speech};
pub use local::LocalSynthesizer;
pub use microphone::MicrophoneRecognizer;
pub use playback::{AudioPlayback, decode_mp3};
pub use recognizer::{
    CaptureEvent, CaptureState, EventSink, ListenOptions, Recognizer, RecognizerEvent,
    SpeechCapture, StartOutcome,
};
pub use speaker::SpeechOutput;
pub use stt::{SpeechToText, Transcriber};
pub use tts::{ElevenLabsSynthesizer, Synthesizer};

use std::sync::Arc;

use crate::config::Config;

/// Build the production recognizer from configuration
///
/// Without a transcription key the recognizer reports itself unsupported.
#[must_use]
pub fn recognizer_from_config(config: &Config) -> MicrophoneRecognizer {
    let transcriber = if config.voice.enabled {
        match SpeechToText::from_config(&config.voice, &config.api_keys) {
            Ok(stt) => Some(Arc::new(stt) as Arc<dyn Transcriber>),
            Err(e) => {
                tracing::info!(error = %e, "speech capture disabled");
                None
            }
        }
    } else {
        None
    };
    MicrophoneRecognizer::new(transcriber)
}

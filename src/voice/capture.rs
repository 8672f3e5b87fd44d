//! Microphone capture and utterance segmentation

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Minimum audio energy to count a frame as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech for an utterance (0.3 s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends an utterance (0.5 s at 16kHz)
const SILENCE_SAMPLES: usize = 8000;

/// Captures mono audio from the default input device
///
/// Holds a live `cpal` stream once started, which is not `Send`; keep it on
/// the thread that created it.
pub struct AudioCapture {
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

/// Whether the host has any input device at all
#[must_use]
pub fn input_available() -> bool {
    cpal::default_host().default_input_device().is_some()
}

impl AudioCapture {
    /// Open the default input device
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` if there is no usable input device, or
    /// `PermissionDenied` if the device refuses to report its configuration
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Unsupported("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::PermissionDenied(e.to_string()))?
            .filter(|c| {
                c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .min_by_key(cpal::SupportedStreamConfigRange::channels)
            .ok_or_else(|| Error::Unsupported("no 16kHz input config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing audio
    ///
    /// Multi-channel input is downmixed to mono as it arrives.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the input stream cannot be opened
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Unsupported("no input device".to_string()))?;
        let channels = usize::from(self.config.channels.max(1));

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        if channels == 1 {
                            buf.extend_from_slice(data);
                        } else {
                            buf.extend(data.chunks(channels).map(downmix));
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::PermissionDenied(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Error::PermissionDenied(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing audio
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
        self.clear_buffer();
    }

    /// Take the samples captured since the last call
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Discard captured samples
    pub fn clear_buffer(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }
}

#[allow(clippy::cast_precision_loss)]
fn downmix(frame: &[f32]) -> f32 {
    frame.iter().sum::<f32>() / frame.len() as f32
}

/// Segments a sample stream into utterances
///
/// An utterance starts at the first frame above the energy threshold and
/// ends once enough trailing silence follows enough speech. Noise bursts
/// that never reach the minimum length are dropped.
#[derive(Debug, Default)]
pub struct UtteranceSegmenter {
    in_speech: bool,
    speech: Vec<f32>,
    silence: usize,
}

impl UtteranceSegmenter {
    /// Create an idle segmenter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed samples; returns a complete utterance when one ends
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        if samples.is_empty() {
            return None;
        }

        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        if !self.in_speech {
            if is_speech {
                self.in_speech = true;
                self.speech.clear();
                self.speech.extend_from_slice(samples);
                self.silence = 0;
                tracing::trace!(energy, "speech detected");
            }
            return None;
        }

        self.speech.extend_from_slice(samples);
        if is_speech {
            self.silence = 0;
        } else {
            self.silence += samples.len();
        }

        let voiced = self.speech.len().saturating_sub(self.silence);
        if self.silence > SILENCE_SAMPLES && voiced > MIN_SPEECH_SAMPLES {
            tracing::debug!(samples = self.speech.len(), "utterance complete");
            self.in_speech = false;
            self.silence = 0;
            return Some(std::mem::take(&mut self.speech));
        }

        // Too much silence without enough speech: a noise burst
        if self.silence > SILENCE_SAMPLES * 2 {
            tracing::trace!("noise burst discarded");
            self.reset();
        }

        None
    }

    /// Whether speech has started but not yet ended
    #[must_use]
    pub const fn in_speech(&self) -> bool {
        self.in_speech
    }

    /// Drop any partial utterance
    pub fn reset(&mut self) {
        self.in_speech = false;
        self.speech.clear();
        self.silence = 0;
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: usize = 1600;

    #[test]
    fn energy_of_silence_and_tone() {
        assert!(calculate_energy(&[0.0; 100]) < 0.001);
        assert!(calculate_energy(&[0.5; 100]) > 0.4);
        assert!(calculate_energy(&[]).abs() < f32::EPSILON);
    }

    #[test]
    fn segmenter_emits_after_trailing_silence() {
        let mut seg = UtteranceSegmenter::new();
        let speech = vec![0.2f32; FRAME];
        let silence = vec![0.0f32; FRAME];

        // 0.5 s of speech
        for _ in 0..5 {
            assert!(seg.push(&speech).is_none());
        }
        assert!(seg.in_speech());

        // Silence until the utterance closes
        let mut utterance = None;
        for _ in 0..10 {
            if let Some(u) = seg.push(&silence) {
                utterance = Some(u);
                break;
            }
        }
        let utterance = utterance.expect("utterance should complete");
        assert!(utterance.len() > MIN_SPEECH_SAMPLES);
        assert!(!seg.in_speech());
    }

    #[test]
    fn segmenter_ignores_silence() {
        let mut seg = UtteranceSegmenter::new();
        for _ in 0..20 {
            assert!(seg.push(&[0.0; FRAME]).is_none());
        }
        assert!(!seg.in_speech());
    }

    #[test]
    fn wav_has_riff_header() {
        let wav = samples_to_wav(&[0.0, 0.5, -0.5], SAMPLE_RATE).unwrap();
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
    }
}

//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use cctv_assistant::Error;
use cctv_assistant::voice::{
    CaptureState, ListenOptions, RecognizerEvent, SAMPLE_RATE, SpeechCapture, SpeechOutput,
    StartOutcome, Synthesizer, UtteranceSegmenter, chunk_for_speech, samples_to_wav,
};

mod common;

use common::{RecordingSynthesizer, ScriptedRecognizer};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Feed samples in 100ms frames, returning the first completed utterance
fn feed(segmenter: &mut UtteranceSegmenter, samples: &[f32]) -> Option<Vec<f32>> {
    samples
        .chunks(SAMPLE_RATE as usize / 10)
        .find_map(|frame| segmenter.push(frame))
}

#[test]
fn test_segmenter_ignores_silence() {
    let mut segmenter = UtteranceSegmenter::new();
    assert!(feed(&mut segmenter, &generate_silence(1.0)).is_none());
    assert!(!segmenter.in_speech());
}

#[test]
fn test_segmenter_completes_after_trailing_silence() {
    let mut segmenter = UtteranceSegmenter::new();

    let speech = generate_sine_samples(440.0, 0.8, 0.3);
    assert!(feed(&mut segmenter, &speech).is_none());
    assert!(segmenter.in_speech());

    let utterance = feed(&mut segmenter, &generate_silence(0.8)).unwrap();
    assert!(utterance.len() >= speech.len());
    assert!(!segmenter.in_speech());
}

#[test]
fn test_segmenter_drops_noise_burst() {
    let mut segmenter = UtteranceSegmenter::new();

    // 100ms of noise is too short to be an utterance
    feed(&mut segmenter, &generate_sine_samples(440.0, 0.1, 0.3));
    assert!(feed(&mut segmenter, &generate_silence(1.2)).is_none());
    assert!(!segmenter.in_speech());
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");
    assert!(wav_data.len() > 44);
}

#[test]
fn test_wav_roundtrip() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), original_samples.len());
}

#[test]
fn test_long_reply_is_chunked_at_sentences() {
    let reply = "Kamera lobby aktif. ".repeat(20);
    let chunks = chunk_for_speech(&reply, 60);

    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.chars().count() <= 60));
    assert!(chunks.iter().all(|c| c.ends_with('.')));
    assert_eq!(chunks.join(" "), reply.trim_end());
}

#[tokio::test]
async fn test_capture_adapter_follows_backend_events() {
    let recognizer = ScriptedRecognizer::new();
    let (mut capture, mut rx) = SpeechCapture::new(recognizer.clone());

    let outcome = capture.start_listening(&ListenOptions::default()).await.unwrap();
    assert_eq!(outcome, StartOutcome::Started);
    assert_eq!(
        capture.start_listening(&ListenOptions::default()).await.unwrap(),
        StartOutcome::AlreadyActive
    );
    assert_eq!(recognizer.starts(), 1);

    let started = rx.recv().await.unwrap();
    assert_eq!(capture.handle_event(started), Some(RecognizerEvent::Started));
    assert!(capture.is_listening());

    recognizer.hear("rekaman kemarin");
    let transcript = rx.recv().await.unwrap();
    capture.handle_event(transcript);
    assert_eq!(capture.transcript(), "rekaman kemarin");

    recognizer.emit(RecognizerEvent::Error("network".to_string()));
    let failed = rx.recv().await.unwrap();
    capture.handle_event(failed);
    assert_eq!(capture.state(), CaptureState::Error);
    assert_eq!(capture.last_error(), Some("network"));
}

#[tokio::test]
async fn test_capture_unsupported_platform() {
    let (mut capture, _rx) = SpeechCapture::new(ScriptedRecognizer::unsupported());
    let err = capture.start_listening(&ListenOptions::default()).await;
    assert!(matches!(err, Err(Error::Unsupported(_))));
    assert_eq!(capture.state(), CaptureState::Error);
}

#[tokio::test(start_paused = true)]
async fn test_speech_output_falls_back_for_rest_of_reply() {
    let failing = Arc::new(RecordingSynthesizer {
        fail: true,
        ..RecordingSynthesizer::default()
    });
    let local = Arc::new(RecordingSynthesizer::default());
    let output = SpeechOutput::new(
        Some(failing as Arc<dyn Synthesizer>),
        Some(local.clone() as Arc<dyn Synthesizer>),
        20,
        Duration::from_millis(100),
    );

    output.speak("Satu dua tiga. Empat lima enam.").await.unwrap();
    assert_eq!(
        local.spoken(),
        vec!["Satu dua tiga.".to_string(), "Empat lima enam.".to_string()]
    );
    assert!(output.check_availability().await);
}

#[tokio::test(start_paused = true)]
async fn test_speech_output_without_engines_fails() {
    let output = SpeechOutput::new(None, None, 200, Duration::from_millis(100));
    let err = output.speak("halo").await;
    assert!(matches!(err, Err(Error::SynthesisFailed(_))));
    assert!(!output.check_availability().await);
}

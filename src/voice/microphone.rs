//! Microphone-backed recognizer
//!
//! A capture thread owns the `cpal` stream (which cannot leave its thread),
//! cuts the input into utterances and hands each one, WAV-encoded, to an
//! async task that transcribes it and reports the text.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::capture::{self, AudioCapture, SAMPLE_RATE, UtteranceSegmenter, samples_to_wav};
use super::recognizer::{EventSink, ListenOptions, Recognizer, RecognizerEvent};
use super::stt::Transcriber;
use crate::{Error, Result};

/// How often the capture thread drains the input buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Recognizer over the default microphone and a remote transcriber
pub struct MicrophoneRecognizer {
    transcriber: Option<Arc<dyn Transcriber>>,
    stop_flag: Mutex<Option<Arc<AtomicBool>>>,
}

impl MicrophoneRecognizer {
    /// Create a recognizer; without a transcriber it reports itself unsupported
    #[must_use]
    pub fn new(transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        Self {
            transcriber,
            stop_flag: Mutex::new(None),
        }
    }

    fn replace_stop_flag(&self, flag: Option<Arc<AtomicBool>>) {
        let mut slot = self
            .stop_flag
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.store(true, Ordering::SeqCst);
        }
        *slot = flag;
    }
}

#[async_trait]
impl Recognizer for MicrophoneRecognizer {
    fn is_supported(&self) -> bool {
        self.transcriber.is_some() && capture::input_available()
    }

    async fn request_permission(&self) -> Result<()> {
        // Opening and starting the device is the permission check
        tokio::task::spawn_blocking(|| -> Result<()> {
            let mut capture = AudioCapture::new()?;
            capture.start()?;
            capture.stop();
            Ok(())
        })
        .await
        .map_err(|e| Error::Audio(format!("permission probe failed: {e}")))?
    }

    async fn start(&self, options: &ListenOptions, sink: EventSink) -> Result<()> {
        let transcriber = self
            .transcriber
            .clone()
            .ok_or_else(|| Error::Unsupported("no transcription service configured".to_string()))?;

        let stop = Arc::new(AtomicBool::new(false));
        self.replace_stop_flag(Some(Arc::clone(&stop)));

        let continuous = options.continuous;
        let (utterance_tx, utterance_rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let thread_sink = sink.clone();
        let thread_stop = Arc::clone(&stop);
        std::thread::Builder::new()
            .name("speech-capture".to_string())
            .spawn(move || capture_loop(&thread_sink, &thread_stop, continuous, &utterance_tx))
            .map_err(|e| Error::Audio(format!("failed to spawn capture thread: {e}")))?;

        tokio::spawn(transcribe_loop(transcriber, utterance_rx, sink, stop, continuous));
        Ok(())
    }

    async fn stop(&self) {
        self.replace_stop_flag(None);
    }
}

/// Runs on the capture thread until stopped
fn capture_loop(
    sink: &EventSink,
    stop: &AtomicBool,
    continuous: bool,
    utterances: &mpsc::UnboundedSender<Vec<u8>>,
) {
    let mut capture = match AudioCapture::new().and_then(|mut c| c.start().map(|()| c)) {
        Ok(c) => c,
        Err(e) => {
            sink.send(RecognizerEvent::Error(e.to_string()));
            return;
        }
    };

    sink.send(RecognizerEvent::Started);
    let mut segmenter = UtteranceSegmenter::new();

    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_INTERVAL);

        let samples = capture.take_buffer();
        let Some(utterance) = segmenter.push(&samples) else {
            continue;
        };

        match samples_to_wav(&utterance, SAMPLE_RATE) {
            Ok(wav) => {
                if utterances.send(wav).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode utterance"),
        }

        if !continuous {
            break;
        }
    }

    capture.stop();
    tracing::debug!("capture thread exiting");
}

/// Transcribes utterances until the capture thread hangs up
async fn transcribe_loop(
    transcriber: Arc<dyn Transcriber>,
    mut utterances: mpsc::UnboundedReceiver<Vec<u8>>,
    sink: EventSink,
    stop: Arc<AtomicBool>,
    continuous: bool,
) {
    while let Some(wav) = utterances.recv().await {
        match transcriber.transcribe(&wav).await {
            Ok(text) if text.trim().is_empty() => {}
            Ok(text) => {
                sink.send(RecognizerEvent::Transcript {
                    text,
                    is_final: true,
                });
                if !continuous {
                    break;
                }
            }
            Err(e) => {
                sink.send(RecognizerEvent::Error(e.to_string()));
                stop.store(true, Ordering::SeqCst);
                return;
            }
        }
    }

    stop.store(true, Ordering::SeqCst);
    sink.send(RecognizerEvent::Ended);
}

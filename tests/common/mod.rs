//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use cctv_assistant::config::SessionConfig;
use cctv_assistant::history::{ChatHistoryStore, MemoryStore};
use cctv_assistant::llm::{Reply, ReplySource};
use cctv_assistant::voice::{
    EventSink, ListenOptions, Recognizer, RecognizerEvent, SpeechOutput, Synthesizer,
};
use cctv_assistant::{Error, InputMode, ProfanityFilter, Result, SessionDeps};

/// Recognizer that reports `Started` and then whatever the test feeds it
#[derive(Default)]
pub struct ScriptedRecognizer {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub options: Mutex<Vec<ListenOptions>>,
    sink: Mutex<Option<EventSink>>,
    pub unsupported: bool,
}

impl ScriptedRecognizer {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn unsupported() -> Arc<Self> {
        Arc::new(Self {
            unsupported: true,
            ..Self::default()
        })
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Send an event through the live session, if any
    pub fn emit(&self, event: RecognizerEvent) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.send(event);
        }
    }

    /// Deliver a final transcript
    pub fn hear(&self, text: &str) {
        self.emit(RecognizerEvent::Transcript {
            text: text.to_string(),
            is_final: true,
        });
    }

    /// End the live session the way a backend does after silence
    pub fn finish(&self) {
        self.emit(RecognizerEvent::Ended);
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    async fn request_permission(&self) -> Result<()> {
        Ok(())
    }

    async fn start(&self, options: &ListenOptions, sink: EventSink) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.options.lock().unwrap().push(options.clone());
        sink.send(RecognizerEvent::Started);
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Synthesizer that records what it was asked to say
#[derive(Default)]
pub struct RecordingSynthesizer {
    pub spoken: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingSynthesizer {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn is_available(&self) -> bool {
        !self.fail
    }

    async fn speak(&self, text: &str, _cancel: &CancellationToken) -> Result<()> {
        if self.fail {
            return Err(Error::SynthesisFailed("scripted failure".to_string()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Reply source with a fixed answer and a call log
pub struct ScriptedReplies {
    pub answer: String,
    pub delay: Duration,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedReplies {
    #[must_use]
    pub fn new(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            delay: Duration::from_millis(300),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySource for ScriptedReplies {
    async fn reply(&self, utterance: &str, _context: &str) -> Result<Reply> {
        self.calls.lock().unwrap().push(utterance.to_string());
        tokio::time::sleep(self.delay).await;
        Ok(Reply {
            text: self.answer.clone(),
            degraded: false,
        })
    }
}

/// Reply source whose every call fails
#[derive(Default)]
pub struct FailingReplies {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ReplySource for FailingReplies {
    async fn reply(&self, _utterance: &str, _context: &str) -> Result<Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::DispatchFailed("model unreachable".to_string()))
    }
}

/// Session wiring with in-memory history and a recording synthesizer
pub struct Harness {
    pub recognizer: Arc<ScriptedRecognizer>,
    pub synth: Arc<RecordingSynthesizer>,
    pub store: MemoryStore,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self::with_recognizer(ScriptedRecognizer::new())
    }

    #[must_use]
    pub fn with_recognizer(recognizer: Arc<ScriptedRecognizer>) -> Self {
        Self {
            recognizer,
            synth: Arc::new(RecordingSynthesizer::default()),
            store: MemoryStore::new(),
        }
    }

    /// Dependencies for a session answering from `replies`
    pub fn deps(&self, replies: Arc<dyn ReplySource>) -> SessionDeps {
        let speech = SpeechOutput::new(
            Some(self.synth.clone() as Arc<dyn Synthesizer>),
            None,
            200,
            Duration::from_millis(100),
        );
        SessionDeps {
            replies,
            recognizer: self.recognizer.clone(),
            speech: Arc::new(speech),
            history: ChatHistoryStore::new(Arc::new(self.store.clone())),
            filter: ProfanityFilter::new(),
            config: SessionConfig::default(),
            locale: "id-ID".to_string(),
            audio_enabled: true,
            mode: InputMode::Text,
        }
    }
}

/// Let spawned tasks run without moving the clock
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Advance paused time by `duration`, letting tasks run along the way
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
    settle().await;
}

//! Speech capture adapter
//!
//! [`SpeechCapture`] wraps a [`Recognizer`] backend with the
//! `Idle -> Starting -> Listening -> Idle` lifecycle. A `starting` guard
//! keeps two capture sessions from overlapping; it is cleared only when the
//! backend reports that the session started, ended or failed, or when the
//! adapter itself stops the session.
//!
//! Backends report through an [`EventSink`] tagged with the session that
//! created it, so events from a stopped session are ignored.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{Error, Result};

/// Options for one capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenOptions {
    /// Keep listening after the first final transcript
    pub continuous: bool,

    /// Deliver non-final transcripts when the backend has them
    pub interim_results: bool,

    /// Recognition locale
    pub locale: String,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            continuous: false,
            interim_results: true,
            locale: crate::config::DEFAULT_LOCALE.to_string(),
        }
    }
}

/// Something a recognizer backend reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// Audio is flowing
    Started,
    /// Latest transcript for the session, replacing any earlier one
    Transcript { text: String, is_final: bool },
    /// The session is over
    Ended,
    /// The session failed
    Error(String),
}

/// A recognizer event tagged with its capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent {
    pub session: u64,
    pub event: RecognizerEvent,
}

/// Where a backend sends its events
///
/// Usable from plain threads as well as async tasks.
#[derive(Debug, Clone)]
pub struct EventSink {
    session: u64,
    tx: mpsc::UnboundedSender<CaptureEvent>,
}

impl EventSink {
    /// Report an event; silently dropped once the adapter is gone
    pub fn send(&self, event: RecognizerEvent) {
        let _ = self.tx.send(CaptureEvent {
            session: self.session,
            event,
        });
    }
}

/// A speech recognition backend
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Whether the platform can capture speech at all
    fn is_supported(&self) -> bool;

    /// Ask for microphone access
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if access is refused
    async fn request_permission(&self) -> Result<()>;

    /// Begin a capture session, reporting through `sink`
    ///
    /// # Errors
    ///
    /// Returns error if the session could not be started
    async fn start(&self, options: &ListenOptions, sink: EventSink) -> Result<()>;

    /// End the current session, if any
    async fn stop(&self);
}

/// Adapter lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Starting,
    Listening,
    Error,
}

/// Result of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session is starting
    Started,
    /// A session was already starting or listening; nothing was done
    AlreadyActive,
}

/// Stateful wrapper around a [`Recognizer`]
pub struct SpeechCapture {
    recognizer: Arc<dyn Recognizer>,
    supported: bool,
    state: CaptureState,
    starting: bool,
    session: u64,
    transcript: String,
    last_error: Option<String>,
    tx: mpsc::UnboundedSender<CaptureEvent>,
}

impl SpeechCapture {
    /// Wrap `recognizer`, returning the adapter and its event stream
    ///
    /// Feed every event from the stream back into [`Self::handle_event`].
    #[must_use]
    pub fn new(recognizer: Arc<dyn Recognizer>) -> (Self, mpsc::UnboundedReceiver<CaptureEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let supported = recognizer.is_supported();
        tracing::debug!(supported, "speech capture adapter created");

        (
            Self {
                recognizer,
                supported,
                state: CaptureState::Idle,
                starting: false,
                session: 0,
                transcript: String::new(),
                last_error: None,
                tx,
            },
            rx,
        )
    }

    /// Start a capture session
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` without a capture backend, or
    /// `PermissionDenied` if microphone access is refused
    pub async fn start_listening(&mut self, options: &ListenOptions) -> Result<StartOutcome> {
        if !self.supported {
            let err = Error::Unsupported("speech capture is not available".to_string());
            self.fail(&err);
            return Err(err);
        }

        if self.starting || self.state == CaptureState::Listening {
            tracing::debug!(state = ?self.state, "capture already active");
            return Ok(StartOutcome::AlreadyActive);
        }

        self.starting = true;
        self.state = CaptureState::Starting;
        self.session += 1;
        self.last_error = None;

        if let Err(e) = self.recognizer.request_permission().await {
            self.fail(&e);
            return Err(e);
        }

        let sink = EventSink {
            session: self.session,
            tx: self.tx.clone(),
        };
        if let Err(e) = self.recognizer.start(options, sink).await {
            self.fail(&e);
            return Err(e);
        }

        tracing::debug!(session = self.session, continuous = options.continuous, "capture starting");
        Ok(StartOutcome::Started)
    }

    /// Stop capturing; safe from any state
    pub async fn stop_listening(&mut self) {
        if self.state != CaptureState::Idle {
            self.recognizer.stop().await;
            tracing::debug!(session = self.session, "capture stopped");
        }
        // Late events from this session are stale from here on
        self.session += 1;
        self.starting = false;
        self.state = CaptureState::Idle;
    }

    /// Apply a backend event, returning it if it belongs to the live session
    pub fn handle_event(&mut self, event: CaptureEvent) -> Option<RecognizerEvent> {
        if event.session != self.session {
            tracing::trace!(stale = event.session, current = self.session, "dropping stale capture event");
            return None;
        }

        match &event.event {
            RecognizerEvent::Started => {
                self.starting = false;
                self.state = CaptureState::Listening;
            }
            RecognizerEvent::Transcript { text, .. } => {
                self.transcript.clone_from(text);
            }
            RecognizerEvent::Ended => {
                self.starting = false;
                if self.state != CaptureState::Error {
                    self.state = CaptureState::Idle;
                }
            }
            RecognizerEvent::Error(message) => {
                tracing::warn!(error = %message, "speech capture failed");
                self.starting = false;
                self.state = CaptureState::Error;
                self.last_error = Some(message.clone());
            }
        }

        Some(event.event)
    }

    /// Clear the stored transcript
    pub fn reset_transcript(&mut self) {
        self.transcript.clear();
    }

    /// Whether audio is currently being captured
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state == CaptureState::Listening
    }

    /// Latest transcript
    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Whether capture is possible on this host
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.supported
    }

    /// Most recent failure, if any
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> CaptureState {
        self.state
    }

    fn fail(&mut self, err: &Error) {
        tracing::warn!(error = %err, "speech capture could not start");
        self.starting = false;
        self.state = CaptureState::Error;
        self.last_error = Some(err.to_string());
    }
}

//! Session controller actor
//!
//! A single task owns every piece of session state. Intents from the
//! presentation layer, capture events, timer firings and turn progress all
//! arrive over channels and are handled one at a time, so nothing here is
//! locked. The presentation layer observes the session through a broadcast
//! of [`SessionUpdate`]s.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use super::cycle::{ContinuousCycle, CycleAction, CycleEvent};
use super::timers::{TimerFired, Timers};
use super::{
    AvatarState, IgnoreReason, InputMode, Message, SessionPhase, SessionSnapshot, SessionUpdate,
    mood_for,
};
use crate::config::{Config, SessionConfig};
use crate::history::ChatHistoryStore;
use crate::llm::ReplySource;
use crate::profanity::ProfanityFilter;
use crate::voice::{
    CaptureEvent, CaptureState, ListenOptions, Recognizer, RecognizerEvent, SpeechCapture,
    SpeechOutput,
};
use crate::{Error, Result};

/// Bot reply when turn processing fails outright
pub const APOLOGY: &str =
    "Maaf, saya mengalami kendala teknis. Silakan coba lagi dalam beberapa saat.";

/// Subtitle while a reply is being generated
pub const THINKING_SUBTITLE: &str = "💭 Sedang berpikir...";

/// Subtitle while capture runs in continuous mode
pub const CONTINUOUS_SUBTITLE: &str = "🔄 Mode berkelanjutan aktif...";

/// Subtitle while capture runs in push-to-talk mode
pub const LISTENING_SUBTITLE: &str = "🎤 Mendengarkan...";

const INTENT_CAPACITY: usize = 32;
const UPDATE_CAPACITY: usize = 256;

/// Requests from the presentation layer
#[derive(Debug)]
enum Intent {
    Submit(String),
    SetMode(InputMode),
    Listen,
    StopListening,
    SetAudio(bool),
    ClearHistory,
    Open,
    Close,
    Announce(String),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Progress reported by the tasks of one turn
#[derive(Debug)]
enum TurnEvent {
    Replied(std::result::Result<String, String>),
    Subtitle(String),
    Settled,
    AudioFailed(String),
}

/// Everything a session needs from the outside
pub struct SessionDeps {
    pub replies: Arc<dyn ReplySource>,
    pub recognizer: Arc<dyn Recognizer>,
    pub speech: Arc<SpeechOutput>,
    pub history: ChatHistoryStore,
    pub filter: ProfanityFilter,
    pub config: SessionConfig,
    pub locale: String,
    pub audio_enabled: bool,
    pub mode: InputMode,
}

impl SessionDeps {
    /// Production wiring: microphone capture, configured speech output and
    /// file-backed history under the data directory
    #[must_use]
    pub fn from_config(config: &Config, replies: Arc<dyn ReplySource>) -> Self {
        Self {
            replies,
            recognizer: Arc::new(crate::voice::recognizer_from_config(config)),
            speech: Arc::new(SpeechOutput::from_config(config)),
            history: ChatHistoryStore::in_dir(config.data_dir.clone()),
            filter: ProfanityFilter::new(),
            config: config.session.clone(),
            locale: config.voice.locale.clone(),
            audio_enabled: config.voice.enabled,
            mode: InputMode::Text,
        }
    }
}

/// Cloneable handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    intents: mpsc::Sender<Intent>,
    updates: broadcast::Sender<SessionUpdate>,
}

impl SessionHandle {
    async fn send(&self, intent: Intent) -> Result<()> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| Error::SessionClosed)
    }

    /// Submit typed text as a turn
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn submit(&self, text: impl Into<String>) -> Result<()> {
        self.send(Intent::Submit(text.into())).await
    }

    /// Switch input mode, tearing down capture and timers of the old mode
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn set_mode(&self, mode: InputMode) -> Result<()> {
        self.send(Intent::SetMode(mode)).await
    }

    /// Start one push-to-talk capture, switching to voice mode if needed
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn listen(&self) -> Result<()> {
        self.send(Intent::Listen).await
    }

    /// End push-to-talk capture and submit what was heard
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn stop_listening(&self) -> Result<()> {
        self.send(Intent::StopListening).await
    }

    /// Enable or disable spoken replies
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn set_audio(&self, enabled: bool) -> Result<()> {
        self.send(Intent::SetAudio(enabled)).await
    }

    /// Drop the conversation and its stored copy
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn clear_history(&self) -> Result<()> {
        self.send(Intent::ClearHistory).await
    }

    /// Open the session
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn open(&self) -> Result<()> {
        self.send(Intent::Open).await
    }

    /// Close the session, stopping capture, timers and playback
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn close(&self) -> Result<()> {
        self.send(Intent::Close).await
    }

    /// Append a bot message outside of any turn
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn announce(&self, text: impl Into<String>) -> Result<()> {
        self.send(Intent::Announce(text.into())).await
    }

    /// Current session state
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task has stopped
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Intent::Snapshot(tx)).await?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Stop the session task
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` if the session task had already stopped
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Intent::Shutdown).await
    }

    /// Receive session updates from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }
}

/// The session actor
pub struct SessionController {
    replies: Arc<dyn ReplySource>,
    speech: Arc<SpeechOutput>,
    history: ChatHistoryStore,
    filter: ProfanityFilter,
    config: SessionConfig,
    locale: String,

    capture: SpeechCapture,
    capture_rx: mpsc::UnboundedReceiver<CaptureEvent>,
    cycle: ContinuousCycle,
    timers: Timers,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,
    turn_tx: mpsc::UnboundedSender<(u64, TurnEvent)>,
    turn_rx: mpsc::UnboundedReceiver<(u64, TurnEvent)>,
    updates: broadcast::Sender<SessionUpdate>,

    messages: Vec<Message>,
    phase: SessionPhase,
    mode: InputMode,
    avatar: AvatarState,
    subtitle: String,
    audio_enabled: bool,
    open: bool,
    voice_final: Option<String>,
    turn: u64,
    turn_tasks: Vec<JoinHandle<()>>,
}

impl SessionController {
    /// Build a controller and load stored history
    #[must_use]
    pub fn new(deps: SessionDeps) -> Self {
        let (capture, capture_rx) = SpeechCapture::new(deps.recognizer);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (turn_tx, turn_rx) = mpsc::unbounded_channel();
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        let messages = deps.history.load();

        tracing::debug!(restored = messages.len(), mode = %deps.mode, "session created");

        Self {
            replies: deps.replies,
            speech: deps.speech,
            history: deps.history,
            filter: deps.filter,
            cycle: ContinuousCycle::new(&deps.config),
            config: deps.config,
            locale: deps.locale,
            capture,
            capture_rx,
            timers: Timers::new(timer_tx),
            timer_rx,
            turn_tx,
            turn_rx,
            updates,
            messages,
            phase: SessionPhase::Idle,
            mode: InputMode::Text,
            avatar: AvatarState::Idle,
            subtitle: String::new(),
            audio_enabled: deps.audio_enabled,
            open: true,
            voice_final: None,
            turn: 0,
            turn_tasks: Vec::new(),
        }
    }

    /// Run the controller on its own task
    #[must_use]
    pub fn spawn(deps: SessionDeps) -> (SessionHandle, JoinHandle<()>) {
        let initial_mode = deps.mode;
        let controller = Self::new(deps);
        let (tx, rx) = mpsc::channel(INTENT_CAPACITY);
        let handle = SessionHandle {
            intents: tx,
            updates: controller.updates.clone(),
        };
        let task = tokio::spawn(controller.run(rx, initial_mode));
        (handle, task)
    }

    async fn run(mut self, mut intents: mpsc::Receiver<Intent>, initial_mode: InputMode) {
        if initial_mode != InputMode::Text {
            self.set_mode(initial_mode).await;
        }

        loop {
            tokio::select! {
                intent = intents.recv() => match intent {
                    Some(Intent::Shutdown) | None => break,
                    Some(intent) => self.handle_intent(intent).await,
                },
                Some(event) = self.capture_rx.recv() => self.on_capture_event(event).await,
                Some(fired) = self.timer_rx.recv() => self.on_timer(fired).await,
                Some((turn, event)) = self.turn_rx.recv() => self.on_turn_event(turn, event).await,
            }
        }

        self.teardown().await;
        tracing::info!("session stopped");
    }

    async fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Submit(text) => self.submit_turn(&text, false).await,
            Intent::SetMode(mode) => self.set_mode(mode).await,
            Intent::Listen => self.listen().await,
            Intent::StopListening => self.stop_push_to_talk().await,
            Intent::SetAudio(enabled) => {
                self.audio_enabled = enabled;
                if !enabled {
                    self.speech.stop();
                }
                self.emit(SessionUpdate::AudioEnabled(enabled));
            }
            Intent::ClearHistory => {
                self.messages.clear();
                if let Err(e) = self.history.clear() {
                    tracing::warn!(error = %e, "failed to clear stored history");
                }
                self.emit(SessionUpdate::HistoryCleared);
            }
            Intent::Open => self.open().await,
            Intent::Close => self.close().await,
            Intent::Announce(text) => self.append(Message::bot(text)),
            Intent::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            // Handled by the run loop
            Intent::Shutdown => {}
        }
    }

    // --- turns ---

    async fn submit_turn(&mut self, text: &str, is_voice: bool) {
        let actions = self.submit(text, is_voice);
        self.perform(actions).await;
    }

    /// Start a turn, returning the cycle actions that pause capture for it
    fn submit(&mut self, text: &str, is_voice: bool) -> Vec<CycleAction> {
        let reason = if !self.open {
            Some(IgnoreReason::Closed)
        } else if text.trim().is_empty() {
            Some(IgnoreReason::Empty)
        } else if self.phase.is_busy() {
            Some(IgnoreReason::Busy)
        } else {
            None
        };
        if let Some(reason) = reason {
            tracing::debug!(?reason, "submission ignored");
            self.emit(SessionUpdate::SubmissionIgnored(reason));
            return Vec::new();
        }

        self.turn += 1;
        let turn = self.turn;
        let paused = self.cycle.advance(CycleEvent::TurnStarted);

        if self.filter.contains_profanity(text) {
            tracing::info!(turn, "profanity detected, sending warning");
            let warning = self.filter.warning_message().to_string();
            self.append(Message::bot(warning.clone()));
            self.begin_speaking(warning, AvatarState::Sad);
            return paused;
        }

        let cleaned = self.filter.clean_text(text);
        self.append(Message::user(cleaned.clone(), is_voice));
        self.set_phase(SessionPhase::Dispatching);
        self.set_avatar(AvatarState::Thinking);
        self.set_subtitle(THINKING_SUBTITLE);

        tracing::info!(turn, is_voice, chars = cleaned.chars().count(), "dispatching turn");

        let replies = Arc::clone(&self.replies);
        let context = self.context_block();
        let tx = self.turn_tx.clone();
        self.turn_tasks.push(tokio::spawn(async move {
            let result = replies
                .reply(&cleaned, &context)
                .await
                .map(|reply| reply.text)
                .map_err(|e| e.to_string());
            let _ = tx.send((turn, TurnEvent::Replied(result)));
        }));
        paused
    }

    async fn on_turn_event(&mut self, turn: u64, event: TurnEvent) {
        if turn != self.turn {
            tracing::trace!(turn, current = self.turn, "dropping stale turn event");
            return;
        }

        match event {
            TurnEvent::Replied(Ok(text)) => {
                tracing::info!(turn, chars = text.chars().count(), "reply received");
                self.append(Message::bot(text.clone()));
                let mood = mood_for(&text);
                self.begin_speaking(text, mood);
            }
            TurnEvent::Replied(Err(e)) => {
                tracing::warn!(turn, error = %e, "turn failed, apologizing");
                self.append(Message::bot(APOLOGY));
                self.begin_speaking(APOLOGY.to_string(), AvatarState::Sad);
            }
            TurnEvent::Subtitle(text) => self.set_subtitle(&text),
            TurnEvent::AudioFailed(e) => self.emit(SessionUpdate::AudioFailed(e)),
            TurnEvent::Settled => {
                self.turn_tasks.clear();
                self.set_avatar(AvatarState::Idle);
                self.set_subtitle("");
                self.set_phase(SessionPhase::Idle);
                tracing::debug!(turn, "turn settled");

                if self.mode == InputMode::Continuous {
                    let actions = self.cycle.advance(CycleEvent::TurnCompleted);
                    self.perform(actions).await;
                }
            }
        }
    }

    /// Show the reply: optional audio, word-by-word subtitle, then settle
    fn begin_speaking(&mut self, text: String, mood: AvatarState) {
        self.set_phase(SessionPhase::Speaking);
        self.set_avatar(if mood == AvatarState::Idle {
            AvatarState::Speaking
        } else {
            mood
        });

        let turn = self.turn;

        if self.audio_enabled {
            let speech = Arc::clone(&self.speech);
            let tx = self.turn_tx.clone();
            let spoken = text.clone();
            // Audio is not awaited; the subtitle sets the pace of the turn
            tokio::spawn(async move {
                if let Err(e) = speech.speak(&spoken).await {
                    tracing::warn!(error = %e, "speech output failed");
                    let _ = tx.send((turn, TurnEvent::AudioFailed(e.to_string())));
                }
            });
        }

        let tx = self.turn_tx.clone();
        let interval = self.config.word_interval();
        let settle = self.config.settle_delay;
        self.turn_tasks
            .push(tokio::spawn(reveal(text, interval, settle, turn, tx)));
    }

    fn context_block(&self) -> String {
        let input = match self.mode {
            InputMode::Continuous => "Continuous voice mode aktif".to_string(),
            mode => mode.to_string(),
        };
        format!(
            "Platform: Asisten informasi CCTV dengan avatar virtual\n\
             Mode: Avatar interaktif dengan voice/TTS\n\
             Input: {input}\n\
             Audio: {}\n\
             Time: {}",
            if self.audio_enabled { "Enabled" } else { "Disabled" },
            chrono::Local::now().format("%-d/%-m/%Y, %H.%M.%S"),
        )
    }

    // --- capture ---

    async fn listen(&mut self) {
        if !self.open || self.phase.is_busy() {
            tracing::debug!(open = self.open, phase = ?self.phase, "listen request ignored");
            return;
        }
        if self.mode != InputMode::Voice {
            self.set_mode(InputMode::Voice).await;
        }

        self.voice_final = None;
        self.capture.reset_transcript();
        let options = ListenOptions {
            continuous: false,
            interim_results: true,
            locale: self.locale.clone(),
        };
        if let Err(e) = self.capture.start_listening(&options).await {
            self.emit(SessionUpdate::CaptureStatus(e.to_string()));
        }
    }

    async fn stop_push_to_talk(&mut self) {
        if self.mode != InputMode::Voice {
            return;
        }
        self.capture.stop_listening().await;
        self.leave_listening();
        if let Some(text) = self.voice_final.take() {
            self.submit_turn(&text, true).await;
        }
    }

    async fn on_capture_event(&mut self, event: CaptureEvent) {
        let Some(event) = self.capture.handle_event(event) else {
            return;
        };

        match event {
            RecognizerEvent::Started => {
                if !self.phase.is_busy() {
                    self.set_phase(SessionPhase::AwaitingCapture);
                    self.set_avatar(AvatarState::Listening);
                    self.set_subtitle(if self.mode == InputMode::Continuous {
                        CONTINUOUS_SUBTITLE
                    } else {
                        LISTENING_SUBTITLE
                    });
                }
            }
            RecognizerEvent::Transcript { text, is_final } => {
                if self.mode == InputMode::Continuous {
                    let actions = self.cycle.advance(CycleEvent::Transcript(text));
                    self.perform(actions).await;
                } else if is_final {
                    self.voice_final = Some(text);
                }
            }
            RecognizerEvent::Ended => {
                self.leave_listening();
                if self.mode == InputMode::Voice {
                    if let Some(text) = self.voice_final.take() {
                        self.submit_turn(&text, true).await;
                    }
                }
            }
            RecognizerEvent::Error(message) => {
                self.leave_listening();
                self.emit(SessionUpdate::CaptureStatus(message));
                if self.mode == InputMode::Continuous {
                    let actions = self.cycle.advance(CycleEvent::CaptureFailed);
                    self.perform(actions).await;
                }
            }
        }
    }

    /// Drop the listening presentation once capture is over
    fn leave_listening(&mut self) {
        if self.phase == SessionPhase::AwaitingCapture {
            self.set_phase(SessionPhase::Idle);
        }
        if self.avatar == AvatarState::Listening {
            self.set_avatar(AvatarState::Idle);
            self.set_subtitle("");
        }
    }

    // --- continuous cycle ---

    async fn on_timer(&mut self, fired: TimerFired) {
        if self.timers.accept(fired) {
            let actions = self.cycle.advance(CycleEvent::TimerElapsed(fired.slot));
            self.perform(actions).await;
        }
    }

    async fn perform(&mut self, actions: Vec<CycleAction>) {
        let mut queue = VecDeque::from(actions);

        while let Some(action) = queue.pop_front() {
            match action {
                CycleAction::ArmTimer(slot, delay) => self.timers.arm(slot, delay),
                CycleAction::CancelTimer(slot) => self.timers.cancel(slot),
                CycleAction::StopCapture => {
                    self.capture.stop_listening().await;
                    self.leave_listening();
                }
                CycleAction::Submit(text) => queue.extend(self.submit(&text, true)),
                CycleAction::StartCapture => {
                    self.capture.reset_transcript();
                    let options = ListenOptions {
                        continuous: true,
                        interim_results: true,
                        locale: self.locale.clone(),
                    };
                    match self.capture.start_listening(&options).await {
                        Ok(_) => {}
                        Err(e @ (Error::PermissionDenied(_) | Error::Unsupported(_))) => {
                            tracing::warn!(error = %e, "continuous mode cannot capture, leaving it");
                            self.emit(SessionUpdate::CaptureStatus(e.to_string()));
                            queue.extend(self.cycle.advance(CycleEvent::Exit));
                            self.mode = InputMode::Text;
                            self.emit(SessionUpdate::ModeChanged(InputMode::Text));
                        }
                        Err(e) => {
                            self.emit(SessionUpdate::CaptureStatus(e.to_string()));
                            queue.extend(self.cycle.advance(CycleEvent::CaptureFailed));
                        }
                    }
                }
            }
        }
    }

    // --- mode and lifecycle ---

    async fn set_mode(&mut self, mode: InputMode) {
        if mode == self.mode {
            return;
        }
        if mode == InputMode::Continuous && !self.capture.is_supported() {
            self.emit(SessionUpdate::CaptureStatus(
                "speech capture is not available".to_string(),
            ));
            return;
        }

        self.stop_capture_and_timers().await;
        tracing::debug!(from = %self.mode, to = %mode, "input mode changed");
        self.mode = mode;
        self.emit(SessionUpdate::ModeChanged(mode));

        if mode == InputMode::Continuous && self.open {
            self.enter_cycle().await;
        }
    }

    async fn stop_capture_and_timers(&mut self) {
        let actions = self.cycle.advance(CycleEvent::Exit);
        self.perform(actions).await;
        self.timers.cancel_all();
        self.capture.stop_listening().await;
        self.voice_final = None;
        self.leave_listening();
    }

    async fn open(&mut self) {
        if self.open {
            return;
        }
        self.open = true;
        tracing::debug!(mode = %self.mode, "session opened");
        self.emit(SessionUpdate::Opened);

        if self.mode == InputMode::Continuous {
            self.enter_cycle().await;
        }
    }

    /// Start the cycle, held until the turn in flight (if any) settles
    async fn enter_cycle(&mut self) {
        let mut actions = self.cycle.advance(CycleEvent::Enter);
        if self.phase.is_busy() {
            actions.extend(self.cycle.advance(CycleEvent::TurnStarted));
        }
        self.perform(actions).await;
    }

    async fn close(&mut self) {
        if !self.open {
            return;
        }
        self.teardown().await;
        self.open = false;
        tracing::debug!("session closed");
        self.emit(SessionUpdate::Closed);
    }

    async fn teardown(&mut self) {
        self.stop_capture_and_timers().await;
        self.speech.stop();
        for task in self.turn_tasks.drain(..) {
            task.abort();
        }
        // Anything still in flight belongs to an abandoned turn
        self.turn += 1;
        self.set_avatar(AvatarState::Idle);
        self.set_subtitle("");
        self.set_phase(SessionPhase::Idle);
    }

    // --- state and updates ---

    fn append(&mut self, message: Message) {
        self.messages.push(message.clone());
        if let Err(e) = self.history.save(&self.messages) {
            tracing::warn!(error = %e, "failed to save history");
        }
        self.emit(SessionUpdate::MessageAppended(message));
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "session phase");
            self.phase = phase;
            self.emit(SessionUpdate::PhaseChanged(phase));
        }
    }

    fn set_avatar(&mut self, avatar: AvatarState) {
        if self.avatar != avatar {
            self.avatar = avatar;
            self.emit(SessionUpdate::AvatarChanged(avatar));
        }
    }

    fn set_subtitle(&mut self, subtitle: &str) {
        if self.subtitle != subtitle {
            self.subtitle = subtitle.to_string();
            self.emit(SessionUpdate::SubtitleChanged(self.subtitle.clone()));
        }
    }

    fn emit(&self, update: SessionUpdate) {
        // No subscribers is fine
        let _ = self.updates.send(update);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            mode: self.mode,
            avatar: self.avatar,
            subtitle: self.subtitle.clone(),
            audio_enabled: self.audio_enabled,
            open: self.open,
            messages: self.messages.clone(),
            pending_timers: self.timers.pending(),
            capture_active: matches!(
                self.capture.state(),
                CaptureState::Starting | CaptureState::Listening
            ),
        }
    }
}

/// Reveal `text` one word at a time, then hold before settling
async fn reveal(
    text: String,
    interval: Duration,
    settle: Duration,
    turn: u64,
    tx: mpsc::UnboundedSender<(u64, TurnEvent)>,
) {
    let words: Vec<&str> = text.split_whitespace().collect();
    for shown in 0..=words.len() {
        let _ = tx.send((turn, TurnEvent::Subtitle(words[..shown].join(" "))));
        if shown < words.len() {
            tokio::time::sleep(interval).await;
        }
    }
    tokio::time::sleep(settle).await;
    let _ = tx.send((turn, TurnEvent::Settled));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn reveal_builds_subtitle_word_by_word() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        reveal(
            "Kamera ada di lobby".to_string(),
            Duration::from_millis(400),
            Duration::from_millis(1500),
            3,
            tx,
        )
        .await;

        let mut subtitles = Vec::new();
        while let Ok((turn, event)) = rx.try_recv() {
            assert_eq!(turn, 3);
            match event {
                TurnEvent::Subtitle(s) => subtitles.push(s),
                TurnEvent::Settled => subtitles.push("<settled>".to_string()),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(
            subtitles,
            vec![
                "",
                "Kamera",
                "Kamera ada",
                "Kamera ada di",
                "Kamera ada di lobby",
                "<settled>"
            ]
        );
    }
}

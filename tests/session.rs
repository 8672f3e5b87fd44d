//! Session controller integration tests
//!
//! Every test runs on a paused clock, so listening windows, subtitle reveal
//! and settle delays elapse deterministically.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use cctv_assistant::history::{ChatHistoryStore, KeyValueStore};
use cctv_assistant::session::{
    APOLOGY, AvatarState, IgnoreReason, InputMode, Message, Sender, SessionController,
    SessionHandle, SessionPhase, SessionUpdate,
};
use cctv_assistant::voice::RecognizerEvent;
use tokio::sync::broadcast;

mod common;

use common::{FailingReplies, Harness, ScriptedRecognizer, ScriptedReplies, advance, settle};

const ANSWER: &str = "Kamera lobby ada di lantai 1.";

fn drain(rx: &mut broadcast::Receiver<SessionUpdate>) -> Vec<SessionUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

fn by(messages: &[Message], sender: Sender) -> Vec<&Message> {
    messages.iter().filter(|m| m.sender == sender).collect()
}

#[tokio::test(start_paused = true)]
async fn submission_while_busy_is_ignored() {
    let harness = Harness::new();
    let replies = ScriptedReplies::new(ANSWER);
    let (session, task) = SessionController::spawn(harness.deps(replies.clone()));
    let mut updates = session.subscribe();

    session.submit("halo").await.unwrap();
    session.submit("apa kabar").await.unwrap();
    advance(Duration::from_secs(10)).await;

    let snapshot = session.snapshot().await.unwrap();
    let users = by(&snapshot.messages, Sender::User);
    let bots = by(&snapshot.messages, Sender::Bot);
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].text, "halo");
    assert!(!users[0].is_voice);
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].text, ANSWER);
    assert_eq!(replies.calls(), vec!["halo".to_string()]);

    let seen = drain(&mut updates);
    assert!(seen.contains(&SessionUpdate::SubmissionIgnored(IgnoreReason::Busy)));

    // Settled after the reveal
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert_eq!(snapshot.avatar, AvatarState::Idle);
    assert!(snapshot.subtitle.is_empty());

    session.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn turn_runs_thinking_then_speaking_then_settles() {
    let harness = Harness::new();
    let (session, _task) = SessionController::spawn(harness.deps(ScriptedReplies::new(ANSWER)));
    let mut updates = session.subscribe();

    session.submit("di mana kamera lobby?").await.unwrap();
    settle().await;
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Dispatching);
    assert_eq!(snapshot.avatar, AvatarState::Thinking);
    assert_eq!(snapshot.subtitle, "💭 Sedang berpikir...");

    // Reply lands after 300ms; the subtitle is mid-reveal a second later
    advance(Duration::from_millis(1300)).await;
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Speaking);
    assert_eq!(snapshot.avatar, AvatarState::Speaking);
    assert!(ANSWER.starts_with(&snapshot.subtitle));
    assert!(!snapshot.subtitle.is_empty());

    advance(Duration::from_secs(5)).await;
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert!(snapshot.subtitle.is_empty());

    let seen = drain(&mut updates);
    assert!(seen.contains(&SessionUpdate::SubtitleChanged(ANSWER.to_string())));
    assert_eq!(harness.synth.spoken(), vec![ANSWER.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn whitespace_input_is_ignored() {
    let harness = Harness::new();
    let replies = ScriptedReplies::new(ANSWER);
    let (session, _task) = SessionController::spawn(harness.deps(replies.clone()));
    let mut updates = session.subscribe();

    session.submit("").await.unwrap();
    session.submit("   \n\t").await.unwrap();
    advance(Duration::from_secs(5)).await;

    let snapshot = session.snapshot().await.unwrap();
    assert!(snapshot.messages.is_empty());
    assert!(replies.calls().is_empty());
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert_eq!(
        drain(&mut updates),
        vec![
            SessionUpdate::SubmissionIgnored(IgnoreReason::Empty),
            SessionUpdate::SubmissionIgnored(IgnoreReason::Empty),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn dispatch_failure_yields_one_apology() {
    let harness = Harness::new();
    let replies = Arc::new(FailingReplies::default());
    let (session, task) = SessionController::spawn(harness.deps(replies.clone()));

    session.submit("test").await.unwrap();
    advance(Duration::from_secs(1)).await;

    let snapshot = session.snapshot().await.unwrap();
    let bots = by(&snapshot.messages, Sender::Bot);
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].text, APOLOGY);
    assert_eq!(snapshot.avatar, AvatarState::Sad);
    assert_eq!(replies.calls.load(Ordering::SeqCst), 1);

    advance(Duration::from_secs(10)).await;
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(by(&snapshot.messages, Sender::Bot).len(), 1);
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert!(!task.is_finished());
}

#[tokio::test(start_paused = true)]
async fn profanity_gets_warning_without_dispatch() {
    let harness = Harness::new();
    let replies = ScriptedReplies::new(ANSWER);
    let (session, _task) = SessionController::spawn(harness.deps(replies.clone()));

    session.submit("dasar BODOH").await.unwrap();
    settle().await;

    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].sender, Sender::Bot);
    assert!(snapshot.messages[0].text.starts_with("Mohon gunakan bahasa yang sopan"));
    assert_eq!(snapshot.avatar, AvatarState::Sad);
    assert_eq!(snapshot.phase, SessionPhase::Speaking);

    advance(Duration::from_secs(10)).await;
    assert!(replies.calls().is_empty());
    assert_eq!(session.snapshot().await.unwrap().phase, SessionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn history_is_saved_after_each_append_and_restored() {
    let harness = Harness::new();
    let (session, task) = SessionController::spawn(harness.deps(ScriptedReplies::new(ANSWER)));

    session.submit("halo").await.unwrap();
    settle().await;
    let stored = ChatHistoryStore::new(Arc::new(harness.store.clone()));
    assert_eq!(stored.load().len(), 1);

    advance(Duration::from_secs(10)).await;
    assert_eq!(stored.load().len(), 2);

    session.shutdown().await.unwrap();
    task.await.unwrap();

    // A new session starts from the stored conversation
    let (session, _task) = SessionController::spawn(harness.deps(ScriptedReplies::new(ANSWER)));
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.messages[0].text, "halo");
}

#[tokio::test(start_paused = true)]
async fn clear_history_empties_session_and_store() {
    let harness = Harness::new();
    let (session, _task) = SessionController::spawn(harness.deps(ScriptedReplies::new(ANSWER)));

    session.announce("Selamat datang").await.unwrap();
    session.clear_history().await.unwrap();
    session.clear_history().await.unwrap();

    assert!(session.snapshot().await.unwrap().messages.is_empty());
    assert!(harness.store.get("chatbot_history").unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn continuous_silence_rearms_exactly_one_window() {
    let harness = Harness::new();
    let (session, _task) = SessionController::spawn(harness.deps(ScriptedReplies::new(ANSWER)));

    session.set_mode(InputMode::Continuous).await.unwrap();
    settle().await;
    assert_eq!(harness.recognizer.starts(), 0);
    assert_eq!(session.snapshot().await.unwrap().pending_timers, 1);

    // Startup delay elapses: first window opens
    advance(Duration::from_millis(1600)).await;
    assert_eq!(harness.recognizer.starts(), 1);
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.pending_timers, 1);
    assert!(snapshot.capture_active);
    assert_eq!(snapshot.avatar, AvatarState::Listening);
    assert_eq!(snapshot.subtitle, "🔄 Mode berkelanjutan aktif...");

    // Window closes with nothing heard: capture stops, a retry pause is armed
    advance(Duration::from_secs(5)).await;
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(harness.recognizer.starts(), 1);
    assert_eq!(snapshot.pending_timers, 1);
    assert!(!snapshot.capture_active);
    assert!(snapshot.messages.is_empty());

    // Exactly one new window
    advance(Duration::from_secs(1)).await;
    assert_eq!(harness.recognizer.starts(), 2);
    assert_eq!(session.snapshot().await.unwrap().pending_timers, 1);

    let options = harness.recognizer.options.lock().unwrap().clone();
    assert!(options.iter().all(|o| o.continuous && o.locale == "id-ID"));
}

#[tokio::test(start_paused = true)]
async fn continuous_speech_is_submitted_and_cycle_restarts() {
    let harness = Harness::new();
    let replies = ScriptedReplies::new(ANSWER);
    let (session, _task) = SessionController::spawn(harness.deps(replies.clone()));

    session.set_mode(InputMode::Continuous).await.unwrap();
    advance(Duration::from_millis(1600)).await;

    harness.recognizer.emit(RecognizerEvent::Transcript {
        text: "di mana".to_string(),
        is_final: false,
    });
    harness.recognizer.hear("di mana kamera lobby");
    advance(Duration::from_secs(5)).await;

    assert_eq!(replies.calls(), vec!["di mana kamera lobby".to_string()]);
    let snapshot = session.snapshot().await.unwrap();
    assert!(snapshot.messages[0].is_voice);
    assert_eq!(snapshot.pending_timers, 0);

    // Reply, reveal, settle, then the restart delay opens a new window
    advance(Duration::from_secs(10)).await;
    assert_eq!(harness.recognizer.starts(), 2);
    assert_eq!(by(&session.snapshot().await.unwrap().messages, Sender::Bot).len(), 1);
}

/// Step through a turn, checking capture stays off while it is busy
async fn ride_out_turn(session: &SessionHandle, harness: &Harness) {
    let starts = harness.recognizer.starts();
    for _ in 0..100 {
        advance(Duration::from_millis(100)).await;
        let snapshot = session.snapshot().await.unwrap();
        if !snapshot.phase.is_busy() {
            return;
        }
        assert!(!snapshot.capture_active, "capture open while {:?}", snapshot.phase);
        assert_eq!(harness.recognizer.starts(), starts);
    }
    panic!("turn never settled");
}

#[tokio::test(start_paused = true)]
async fn typed_turn_mid_window_pauses_continuous_capture() {
    let harness = Harness::new();
    let replies = ScriptedReplies::new(ANSWER);
    let (session, _task) = SessionController::spawn(harness.deps(replies.clone()));

    session.set_mode(InputMode::Continuous).await.unwrap();
    advance(Duration::from_millis(1600)).await;
    assert!(session.snapshot().await.unwrap().capture_active);

    session.submit("di mana kamera lobby").await.unwrap();
    settle().await;
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Dispatching);
    assert!(!snapshot.capture_active);
    assert_eq!(snapshot.pending_timers, 0);

    // The reply reaching the microphone must not become a turn
    harness.recognizer.hear(ANSWER);
    ride_out_turn(&session, &harness).await;

    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.pending_timers, 1);
    assert_eq!(harness.recognizer.starts(), 1);

    // Exactly one window after the restart delay
    advance(Duration::from_secs(2)).await;
    assert_eq!(harness.recognizer.starts(), 2);
    let snapshot = session.snapshot().await.unwrap();
    assert!(snapshot.capture_active);
    assert_eq!(snapshot.pending_timers, 1);
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(replies.calls(), vec!["di mana kamera lobby".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn typed_turn_during_retry_pause_holds_next_window() {
    let harness = Harness::new();
    let replies = ScriptedReplies::new(ANSWER);
    let (session, _task) = SessionController::spawn(harness.deps(replies.clone()));

    // Silent first window, then into the retry pause
    session.set_mode(InputMode::Continuous).await.unwrap();
    advance(Duration::from_millis(1600)).await;
    advance(Duration::from_secs(5)).await;
    let snapshot = session.snapshot().await.unwrap();
    assert!(!snapshot.capture_active);
    assert_eq!(snapshot.pending_timers, 1);

    session.submit("di mana kamera lobby").await.unwrap();
    settle().await;
    assert_eq!(session.snapshot().await.unwrap().pending_timers, 0);

    ride_out_turn(&session, &harness).await;
    assert_eq!(harness.recognizer.starts(), 1);

    advance(Duration::from_secs(2)).await;
    assert_eq!(harness.recognizer.starts(), 2);

    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(by(&snapshot.messages, Sender::Bot)[0].text, ANSWER);
}

#[tokio::test(start_paused = true)]
async fn short_continuous_transcript_is_dropped() {
    let harness = Harness::new();
    let replies = ScriptedReplies::new(ANSWER);
    let (session, _task) = SessionController::spawn(harness.deps(replies.clone()));

    session.set_mode(InputMode::Continuous).await.unwrap();
    advance(Duration::from_millis(1600)).await;
    harness.recognizer.hear(" ok ");
    advance(Duration::from_secs(5)).await;

    assert!(replies.calls().is_empty());
    assert!(session.snapshot().await.unwrap().messages.is_empty());
}

#[tokio::test(start_paused = true)]
async fn leaving_continuous_cancels_timers_and_capture() {
    let harness = Harness::new();
    let (session, _task) = SessionController::spawn(harness.deps(ScriptedReplies::new(ANSWER)));

    session.set_mode(InputMode::Continuous).await.unwrap();
    advance(Duration::from_secs(2)).await;
    assert_eq!(harness.recognizer.starts(), 1);

    session.set_mode(InputMode::Text).await.unwrap();
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.pending_timers, 0);
    assert!(!snapshot.capture_active);
    assert_eq!(snapshot.mode, InputMode::Text);
    assert_eq!(snapshot.avatar, AvatarState::Idle);
    assert!(harness.recognizer.stops.load(Ordering::SeqCst) >= 1);

    advance(Duration::from_secs(30)).await;
    assert_eq!(harness.recognizer.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn close_tears_down_and_reopen_resumes_cycle() {
    let harness = Harness::new();
    let (session, _task) = SessionController::spawn(harness.deps(ScriptedReplies::new(ANSWER)));

    session.set_mode(InputMode::Continuous).await.unwrap();
    advance(Duration::from_secs(2)).await;
    session.close().await.unwrap();

    let snapshot = session.snapshot().await.unwrap();
    assert!(!snapshot.open);
    assert_eq!(snapshot.pending_timers, 0);

    session.submit("halo").await.unwrap();
    advance(Duration::from_secs(30)).await;
    assert_eq!(harness.recognizer.starts(), 1);
    assert!(session.snapshot().await.unwrap().messages.is_empty());

    session.open().await.unwrap();
    advance(Duration::from_millis(1600)).await;
    assert_eq!(harness.recognizer.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn push_to_talk_submits_final_transcript() {
    let harness = Harness::new();
    let replies = ScriptedReplies::new(ANSWER);
    let (session, _task) = SessionController::spawn(harness.deps(replies.clone()));

    session.listen().await.unwrap();
    settle().await;
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.mode, InputMode::Voice);
    assert_eq!(snapshot.phase, SessionPhase::AwaitingCapture);
    assert_eq!(snapshot.subtitle, "🎤 Mendengarkan...");

    harness.recognizer.hear("jam operasional");
    harness.recognizer.finish();
    settle().await;

    assert_eq!(replies.calls(), vec!["jam operasional".to_string()]);
    let snapshot = session.snapshot().await.unwrap();
    assert!(snapshot.messages[0].is_voice);
    assert!(!harness.recognizer.options.lock().unwrap()[0].continuous);
}

#[tokio::test(start_paused = true)]
async fn continuous_mode_needs_capture_support() {
    let harness = Harness::with_recognizer(ScriptedRecognizer::unsupported());
    let (session, _task) = SessionController::spawn(harness.deps(ScriptedReplies::new(ANSWER)));
    let mut updates = session.subscribe();

    session.set_mode(InputMode::Continuous).await.unwrap();
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.mode, InputMode::Text);
    assert_eq!(snapshot.pending_timers, 0);
    assert!(matches!(
        drain(&mut updates).as_slice(),
        [SessionUpdate::CaptureStatus(_)]
    ));
}

#[tokio::test(start_paused = true)]
async fn muted_session_does_not_speak() {
    let harness = Harness::new();
    let (session, _task) = SessionController::spawn(harness.deps(ScriptedReplies::new(ANSWER)));

    session.set_audio(false).await.unwrap();
    session.submit("halo").await.unwrap();
    advance(Duration::from_secs(10)).await;

    assert!(harness.synth.spoken().is_empty());
    assert_eq!(by(&session.snapshot().await.unwrap().messages, Sender::Bot).len(), 1);
}

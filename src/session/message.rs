//! Session data model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_voice: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_typing: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

impl Message {
    /// Create a message stamped with the current time
    #[must_use]
    pub fn new(text: impl Into<String>, sender: Sender, is_voice: bool) -> Self {
        Self {
            id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            is_voice,
            is_typing: false,
        }
    }

    /// A message typed or spoken by the user
    #[must_use]
    pub fn user(text: impl Into<String>, is_voice: bool) -> Self {
        Self::new(text, Sender::User, is_voice)
    }

    /// A reply from the assistant
    #[must_use]
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Bot, false)
    }
}

/// Avatar expression; exactly one is shown at a time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarState {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
    Happy,
    Sad,
}

/// How the user is talking to the assistant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Push-to-talk: one capture session per turn
    Voice,
    #[default]
    Text,
    /// Hands-free listening windows, re-armed after every turn
    Continuous,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Voice => "voice",
            Self::Text => "text",
            Self::Continuous => "continuous",
        })
    }
}

/// Where the controller is in a turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    AwaitingCapture,
    Dispatching,
    Speaking,
}

impl SessionPhase {
    /// Whether a turn is in flight and new submissions must be ignored
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Dispatching | Self::Speaking)
    }
}

/// Why a submission did not start a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Empty,
    Busy,
    Closed,
}

/// Something the presentation layer should reflect
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    MessageAppended(Message),
    AvatarChanged(AvatarState),
    /// Current subtitle; empty clears it
    SubtitleChanged(String),
    PhaseChanged(SessionPhase),
    ModeChanged(InputMode),
    /// Capture status line, for example a permission failure
    CaptureStatus(String),
    /// Speech output failed; the message was still delivered
    AudioFailed(String),
    AudioEnabled(bool),
    HistoryCleared,
    Opened,
    Closed,
    SubmissionIgnored(IgnoreReason),
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub mode: InputMode,
    pub avatar: AvatarState,
    pub subtitle: String,
    pub audio_enabled: bool,
    pub open: bool,
    pub messages: Vec<Message>,
    /// Outstanding continuous-mode timers
    pub pending_timers: usize,
    pub capture_active: bool,
}

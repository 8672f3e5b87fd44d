//! Terminal presentation
//!
//! Turns [`SessionUpdate`]s into printable lines and parses the slash
//! commands of the interactive chat.

use std::fmt::Write as _;

use crate::session::{
    AvatarState, CONTINUOUS_SUBTITLE, IgnoreReason, InputMode, LISTENING_SUBTITLE, Message,
    Sender, SessionUpdate, THINKING_SUBTITLE,
};

/// A line typed into the interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Plain text to submit
    Text(String),
    Mode(InputMode),
    /// `/listen`: one push-to-talk capture
    Listen,
    Audio(bool),
    Clear,
    Open,
    Close,
    Help,
    Quit,
    /// Unrecognized slash command
    Unknown(String),
}

/// Parse one line of chat input
#[must_use]
pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return ChatInput::Text(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next().unwrap_or_default(), parts.next()) {
        ("voice", _) => ChatInput::Mode(InputMode::Voice),
        ("text", _) => ChatInput::Mode(InputMode::Text),
        ("continuous", _) => ChatInput::Mode(InputMode::Continuous),
        ("listen", _) => ChatInput::Listen,
        ("audio", Some("on")) => ChatInput::Audio(true),
        ("audio", Some("off")) => ChatInput::Audio(false),
        ("clear", _) => ChatInput::Clear,
        ("open", _) => ChatInput::Open,
        ("close", _) => ChatInput::Close,
        ("help", _) => ChatInput::Help,
        ("quit" | "exit", _) => ChatInput::Quit,
        _ => ChatInput::Unknown(trimmed.to_string()),
    }
}

/// Help text for the interactive chat
pub const HELP: &str = "\
Perintah:
  /voice         mode suara (push-to-talk, lalu /listen)
  /listen        dengarkan satu ucapan
  /text          mode teks
  /continuous    mode mendengarkan berkelanjutan
  /audio on|off  nyalakan atau matikan suara balasan
  /clear         hapus riwayat percakapan
  /open, /close  buka atau tutup chat
  /quit          keluar";

/// Emoji for an avatar expression
#[must_use]
pub const fn avatar_glyph(avatar: AvatarState) -> &'static str {
    match avatar {
        AvatarState::Idle => "🤖",
        AvatarState::Listening => "👂",
        AvatarState::Thinking => "💭",
        AvatarState::Speaking => "🗣️",
        AvatarState::Happy => "😊",
        AvatarState::Sad => "😟",
    }
}

/// Terminal renderer that remembers the avatar for bot lines
#[derive(Debug, Default)]
pub struct TerminalView {
    avatar: AvatarState,
}

impl TerminalView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Line to print for `update`, if any
    ///
    /// Word-by-word subtitle frames are not printed; the full reply is
    /// already shown when its message is appended.
    pub fn render(&mut self, update: &SessionUpdate) -> Option<String> {
        match update {
            SessionUpdate::MessageAppended(message) => Some(self.message_line(message)),
            SessionUpdate::AvatarChanged(avatar) => {
                self.avatar = *avatar;
                None
            }
            SessionUpdate::SubtitleChanged(text)
                if text == THINKING_SUBTITLE
                    || text == LISTENING_SUBTITLE
                    || text == CONTINUOUS_SUBTITLE =>
            {
                Some(format!("   {text}"))
            }
            SessionUpdate::ModeChanged(mode) => Some(format!("[mode: {mode}]")),
            SessionUpdate::CaptureStatus(status) => Some(format!("⚠️  {status}")),
            SessionUpdate::AudioFailed(error) => Some(format!("🔇 audio: {error}")),
            SessionUpdate::AudioEnabled(on) => {
                Some(format!("[audio {}]", if *on { "on" } else { "off" }))
            }
            SessionUpdate::HistoryCleared => Some("[riwayat dihapus]".to_string()),
            SessionUpdate::Opened => Some("[chat dibuka]".to_string()),
            SessionUpdate::Closed => Some("[chat ditutup]".to_string()),
            SessionUpdate::SubmissionIgnored(IgnoreReason::Busy) => {
                Some("(masih memproses, tunggu sebentar)".to_string())
            }
            SessionUpdate::SubmissionIgnored(IgnoreReason::Closed) => {
                Some("(chat ditutup, ketik /open)".to_string())
            }
            SessionUpdate::SubtitleChanged(_)
            | SessionUpdate::PhaseChanged(_)
            | SessionUpdate::SubmissionIgnored(IgnoreReason::Empty) => None,
        }
    }

    fn message_line(&self, message: &Message) -> String {
        match message.sender {
            Sender::User if message.is_voice => format!("🎤 {}", message.text),
            Sender::User => format!("> {}", message.text),
            Sender::Bot => format!("{} {}", avatar_glyph(self.avatar), message.text),
        }
    }
}

/// Transcript of stored messages with local timestamps
#[must_use]
pub fn render_history(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        let who = match message.sender {
            Sender::User => "Anda",
            Sender::Bot => "Asisten",
        };
        let at = message
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%d/%m/%Y %H:%M");
        let _ = writeln!(out, "[{at}] {who}: {}", message.text);
    }
    out
}

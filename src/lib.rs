//! CCTV Assistant - voice-enabled information assistant for a CCTV service
//!
//! This library provides the core of the assistant:
//! - Voice session controller (push-to-talk and continuous listening)
//! - Speech capture (microphone, remote STT) and speech output (TTS)
//! - Language-model replies with retry, offline detection and fallbacks
//! - Profanity filtering, chat history and the static knowledge store
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Presentation                        │
//! │      Terminal chat  │  Widget host  │  CLI          │
//! └────────────────────┬────────────────────────────────┘
//!                      │ intents / updates
//! ┌────────────────────▼────────────────────────────────┐
//! │               Session Controller                     │
//! │  Continuous cycle │ Profanity │ History │ Subtitles  │
//! └───────┬──────────────────┬──────────────────┬───────┘
//!         │                  │                  │
//! ┌───────▼──────┐  ┌────────▼────────┐  ┌──────▼───────┐
//! │Speech capture│  │  Reply source   │  │Speech output │
//! │ mic + STT    │  │ Gemini/knowledge│  │ElevenLabs/OS │
//! └──────────────┘  └─────────────────┘  └──────────────┘
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod knowledge;
pub mod llm;
pub mod presentation;
pub mod profanity;
pub mod session;
pub mod voice;
pub mod widget;

pub use config::{Config, WidgetConfig};
pub use error::{Error, Result};
pub use history::{ChatHistoryStore, FileStore, KeyValueStore, MemoryStore};
pub use knowledge::KnowledgeBase;
pub use llm::{Reply, ReplyGenerator, ReplySource};
pub use profanity::ProfanityFilter;
pub use session::{
    AvatarState, InputMode, Message, SessionController, SessionDeps, SessionHandle, SessionPhase,
    SessionSnapshot, SessionUpdate,
};
pub use voice::{SpeechCapture, SpeechOutput};
pub use widget::{Widget, WidgetHost};

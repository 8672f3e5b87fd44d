//! Voice-interaction session
//!
//! The controller turns user input into turns: filter, dispatch, append,
//! speak, settle. In continuous mode it also drives the listening cycle.

mod controller;
mod cycle;
mod message;
mod mood;
mod timers;

pub use controller::{
    APOLOGY, CONTINUOUS_SUBTITLE, LISTENING_SUBTITLE, SessionController, SessionDeps,
    SessionHandle, THINKING_SUBTITLE,
};
pub use cycle::{ContinuousCycle, CycleAction, CycleEvent, CyclePhase, TimerSlot};
pub use message::{
    AvatarState, IgnoreReason, InputMode, Message, Sender, SessionPhase, SessionSnapshot,
    SessionUpdate,
};
pub use mood::mood_for;
pub use timers::{TimerFired, Timers};

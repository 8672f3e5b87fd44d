//! Continuous listening cycle
//!
//! One state machine with one entry point, [`ContinuousCycle::advance`].
//! It never touches timers or the microphone itself: it returns the
//! actions the controller must carry out. Each timer slot holds at most one
//! outstanding timer, and leaving the cycle cancels everything it armed.

use std::time::Duration;

use crate::config::SessionConfig;

/// Timer slots owned by the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    /// End of a collection window
    Window,
    /// Start of the next window (startup, retry pause or post-turn restart)
    Restart,
}

/// Inputs to the cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEvent {
    /// Continuous mode was entered
    Enter,
    /// Latest transcript from capture; replaces the buffer
    Transcript(String),
    /// A timer fired
    TimerElapsed(TimerSlot),
    /// Capture failed mid-window
    CaptureFailed,
    /// A turn began; capture stays paused until it completes
    TurnStarted,
    /// The current turn finished
    TurnCompleted,
    /// Continuous mode was left or the session closed
    Exit,
}

/// Work for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleAction {
    ArmTimer(TimerSlot, Duration),
    CancelTimer(TimerSlot),
    StartCapture,
    StopCapture,
    /// Submit the collected utterance as a turn
    Submit(String),
}

/// Where the cycle is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Inactive,
    /// Waiting out the startup delay
    Starting,
    /// Capture running, window timer armed
    Collecting,
    /// Nothing usable was heard; waiting to re-arm
    Pausing,
    /// A turn is being answered; no capture and no timers
    AwaitingTurn,
    /// Turn done; waiting to re-arm
    Restarting,
}

/// Continuous-mode state machine
#[derive(Debug)]
pub struct ContinuousCycle {
    phase: CyclePhase,
    buffer: String,
    window_armed: bool,
    restart_armed: bool,
    capturing: bool,
    startup_delay: Duration,
    listen_window: Duration,
    retry_pause: Duration,
    restart_delay: Duration,
    min_chars: usize,
}

impl ContinuousCycle {
    /// Create an inactive cycle with the given timings
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            phase: CyclePhase::Inactive,
            buffer: String::new(),
            window_armed: false,
            restart_armed: false,
            capturing: false,
            startup_delay: config.startup_delay,
            listen_window: config.listen_window,
            retry_pause: config.retry_pause,
            restart_delay: config.restart_delay,
            min_chars: config.min_transcript_chars,
        }
    }

    /// Feed one event, returning the actions to perform in order
    pub fn advance(&mut self, event: CycleEvent) -> Vec<CycleAction> {
        let actions = match event {
            CycleEvent::Enter => self.enter(),
            CycleEvent::Transcript(text) => {
                if self.phase == CyclePhase::Collecting {
                    self.buffer = text;
                }
                Vec::new()
            }
            CycleEvent::TimerElapsed(TimerSlot::Window) => self.window_elapsed(),
            CycleEvent::TimerElapsed(TimerSlot::Restart) => self.restart_elapsed(),
            CycleEvent::CaptureFailed => self.capture_failed(),
            CycleEvent::TurnStarted => self.turn_started(),
            CycleEvent::TurnCompleted => self.turn_completed(),
            CycleEvent::Exit => self.exit(),
        };

        tracing::debug!(phase = ?self.phase, actions = actions.len(), "continuous cycle advanced");
        actions
    }

    fn enter(&mut self) -> Vec<CycleAction> {
        if self.phase != CyclePhase::Inactive {
            return Vec::new();
        }
        self.phase = CyclePhase::Starting;
        self.buffer.clear();
        vec![self.arm_restart(self.startup_delay)]
    }

    fn restart_elapsed(&mut self) -> Vec<CycleAction> {
        self.restart_armed = false;
        match self.phase {
            CyclePhase::Starting | CyclePhase::Pausing | CyclePhase::Restarting => {
                self.open_window()
            }
            _ => Vec::new(),
        }
    }

    fn open_window(&mut self) -> Vec<CycleAction> {
        self.phase = CyclePhase::Collecting;
        self.buffer.clear();
        self.capturing = true;
        self.window_armed = true;
        vec![
            CycleAction::StartCapture,
            CycleAction::ArmTimer(TimerSlot::Window, self.listen_window),
        ]
    }

    fn window_elapsed(&mut self) -> Vec<CycleAction> {
        self.window_armed = false;
        if self.phase != CyclePhase::Collecting {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if self.capturing {
            self.capturing = false;
            actions.push(CycleAction::StopCapture);
        }

        let collected = std::mem::take(&mut self.buffer);
        let collected = collected.trim();
        if collected.chars().count() > self.min_chars {
            self.phase = CyclePhase::AwaitingTurn;
            actions.push(CycleAction::Submit(collected.to_string()));
        } else {
            self.phase = CyclePhase::Pausing;
            actions.push(self.arm_restart(self.retry_pause));
        }
        actions
    }

    fn capture_failed(&mut self) -> Vec<CycleAction> {
        if self.phase != CyclePhase::Collecting {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if self.window_armed {
            self.window_armed = false;
            actions.push(CycleAction::CancelTimer(TimerSlot::Window));
        }
        if self.capturing {
            self.capturing = false;
            actions.push(CycleAction::StopCapture);
        }
        self.buffer.clear();
        self.phase = CyclePhase::Pausing;
        actions.push(self.arm_restart(self.restart_delay));
        actions
    }

    fn turn_started(&mut self) -> Vec<CycleAction> {
        if matches!(self.phase, CyclePhase::Inactive | CyclePhase::AwaitingTurn) {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if self.window_armed {
            self.window_armed = false;
            actions.push(CycleAction::CancelTimer(TimerSlot::Window));
        }
        if self.restart_armed {
            self.restart_armed = false;
            actions.push(CycleAction::CancelTimer(TimerSlot::Restart));
        }
        if self.capturing {
            self.capturing = false;
            actions.push(CycleAction::StopCapture);
        }
        self.buffer.clear();
        self.phase = CyclePhase::AwaitingTurn;
        actions
    }

    fn turn_completed(&mut self) -> Vec<CycleAction> {
        if self.phase != CyclePhase::AwaitingTurn || self.pending_timers() > 0 {
            return Vec::new();
        }
        self.phase = CyclePhase::Restarting;
        vec![self.arm_restart(self.restart_delay)]
    }

    fn exit(&mut self) -> Vec<CycleAction> {
        let mut actions = Vec::new();
        if self.window_armed {
            actions.push(CycleAction::CancelTimer(TimerSlot::Window));
        }
        if self.restart_armed {
            actions.push(CycleAction::CancelTimer(TimerSlot::Restart));
        }
        if self.capturing {
            actions.push(CycleAction::StopCapture);
        }
        self.window_armed = false;
        self.restart_armed = false;
        self.capturing = false;
        self.buffer.clear();
        self.phase = CyclePhase::Inactive;
        actions
    }

    fn arm_restart(&mut self, delay: Duration) -> CycleAction {
        self.restart_armed = true;
        CycleAction::ArmTimer(TimerSlot::Restart, delay)
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Whether the cycle is running
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != CyclePhase::Inactive
    }

    /// Collected transcript of the open window
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Number of timers the cycle has armed and not yet seen fire or cancelled
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        usize::from(self.window_armed) + usize::from(self.restart_armed)
    }
}

//! Loop lifecycle transitions.
//!
//! `Initializing → Priming → Running → Safing → Terminated`, with a direct
//! path to Safing from every live state. `Terminated` is absorbing.

use verdant_common::control_unit::state::LoopState;

/// Result of a `LoopState` transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded, new state.
    Ok(LoopState),
    /// Transition rejected, reason.
    Rejected(&'static str),
}

/// Event that can trigger a loop state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// All hardware bound and valve forced closed.
    BindingsReady,
    /// Priming interval elapsed, valve open.
    PrimingComplete,
    /// Sensor, actuator or log failure.
    Fault,
    /// Shutdown requested.
    Interrupt,
    /// Bounded run reached its cycle count.
    Finished,
    /// Safe state applied and hardware released.
    SafeStateApplied,
}

/// Holder of the current loop state.
#[derive(Debug, Clone, Default)]
pub struct LoopStateMachine {
    state: LoopState,
}

impl LoopStateMachine {
    /// Machine in `Initializing`.
    pub const fn new() -> Self {
        Self {
            state: LoopState::Initializing,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: LoopEvent) -> TransitionResult {
        use LoopEvent::*;
        use LoopState::*;

        let next = match (self.state, event) {
            (Terminated, _) => return TransitionResult::Rejected("loop already terminated"),

            (Initializing, BindingsReady) => Priming,
            (Priming, PrimingComplete) => Running,
            (Running, Finished) => Safing,

            // Faults and interrupts route every live state to Safing.
            (Initializing | Priming | Running, Fault | Interrupt) => Safing,
            // Already safing: a second fault does not restart the sequence.
            (Safing, Fault | Interrupt) => Safing,

            (Safing, SafeStateApplied) => Terminated,

            _ => return TransitionResult::Rejected(invalid_transition_reason(self.state, event)),
        };

        self.state = next;
        TransitionResult::Ok(next)
    }

    /// Whether the loop has reached Safing or Terminated.
    #[inline]
    pub const fn is_shutting_down(&self) -> bool {
        matches!(self.state, LoopState::Safing | LoopState::Terminated)
    }
}

fn invalid_transition_reason(state: LoopState, event: LoopEvent) -> &'static str {
    match (state, event) {
        (_, LoopEvent::SafeStateApplied) => "safe state can only complete from Safing",
        (_, LoopEvent::BindingsReady) => "bindings are only established once",
        (_, LoopEvent::PrimingComplete) => "priming completes only from Priming",
        (_, LoopEvent::Finished) => "only a running loop can finish",
        _ => "invalid transition",
    }
}

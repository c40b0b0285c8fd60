//! State enums for the control loop.
//!
//! Both enums use `#[repr(u8)]` so they can be logged or exported compactly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Control loop lifecycle state.
///
/// `Initializing → Priming → Running → Safing → Terminated`.
/// `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum LoopState {
    /// Bindings established, valve position unknown.
    #[default]
    Initializing = 0,
    /// Valve forced closed, seeding flow before the first cycle.
    Priming = 1,
    /// Periodic sense → decide → actuate cycle.
    Running = 2,
    /// Applying the safe state and releasing resources.
    Safing = 3,
    /// Resources released; no further actuation possible.
    Terminated = 4,
}

impl LoopState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Initializing),
            1 => Some(Self::Priming),
            2 => Some(Self::Running),
            3 => Some(Self::Safing),
            4 => Some(Self::Terminated),
            _ => None,
        }
    }

    /// Whether actuators may still be commanded in this state.
    #[inline]
    pub const fn can_actuate(self) -> bool {
        !matches!(self, Self::Terminated)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "Initializing",
            Self::Priming => "Priming",
            Self::Running => "Running",
            Self::Safing => "Safing",
            Self::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

/// Logical valve position. Derived from commands, never sensed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValvePosition {
    /// Open solenoid was last driven.
    Open = 0,
    /// Close solenoid was last driven.
    Closed = 1,
}

impl ValvePosition {
    /// The opposite position.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }
}

impl fmt::Display for ValvePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("Open"),
            Self::Closed => f.write_str("Closed"),
        }
    }
}

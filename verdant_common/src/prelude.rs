//! Prelude module for common re-exports.
//!
//! ```rust
//! use verdant_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::control_unit::config::ControlConfig;
pub use crate::hal::config::HalConfig;

// ─── State ──────────────────────────────────────────────────────────
pub use crate::control_unit::state::{LoopState, ValvePosition};

// ─── HAL ────────────────────────────────────────────────────────────
pub use crate::hal::driver::{CommandOutput, CommandRunner, HalError, OutputLine, SerialTransport};
pub use crate::hal::types::{
    ActuatorId, ActuatorKind, ActuatorState, FullScaleRange, SensorKind, SensorReading,
};

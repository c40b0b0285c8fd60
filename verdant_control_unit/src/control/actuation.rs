//! Timed actuator sequences.
//!
//! A driven line is always de-energized again before these functions return,
//! including when the wait is interrupted.

use std::time::Duration;

use tracing::debug;
use verdant_common::control_unit::state::ValvePosition;
use verdant_hal::DigitalOutput;

use crate::error::ControlError;
use crate::pacing::Pacer;

/// Drive `output` to `energized`, mapping driver failures to `Actuation`.
pub fn set_output(output: &mut DigitalOutput, energized: bool) -> Result<(), ControlError> {
    output
        .set(energized)
        .map_err(|source| ControlError::Actuation {
            actuator: output.id(),
            kind: output.kind(),
            source,
        })
}

/// Energize `output` for `duration`, then de-energize it.
///
/// A failed de-energize takes precedence over an interrupted wait.
pub fn pulse(
    output: &mut DigitalOutput,
    duration: Duration,
    pacer: &mut dyn Pacer,
) -> Result<(), ControlError> {
    set_output(output, true)?;
    let waited = pacer.pause(duration);
    set_output(output, false)?;
    waited
}

/// Move the valve to `target` by driving one solenoid of the pair.
///
/// The opposite solenoid is de-energized first so both coils are never
/// driven together.
pub fn drive_valve(
    open: &mut DigitalOutput,
    close: &mut DigitalOutput,
    target: ValvePosition,
    dwell: Duration,
    pacer: &mut dyn Pacer,
) -> Result<(), ControlError> {
    let (active, idle) = match target {
        ValvePosition::Open => (open, close),
        ValvePosition::Closed => (close, open),
    };
    debug!("Driving valve {} for {:?}", target, dwell);
    set_output(idle, false)?;
    pulse(active, dwell, pacer)
}

//! Binary actuator line (pump enable or valve solenoid).
//!
//! ## Safety contract
//!
//! The line is driven to its initial level as part of binding, so hardware
//! never observes a floating output. This type does not decide when a pump
//! may run; that is the control loop's job. It only guarantees that the line
//! is released exactly once, either explicitly or on drop.

use tracing::{debug, warn};
use verdant_common::hal::driver::{HalError, OutputLine};
use verdant_common::hal::types::{ActuatorId, ActuatorKind, ActuatorState};

/// One bound digital output.
pub struct DigitalOutput {
    state: ActuatorState,
    line: Box<dyn OutputLine>,
    released: bool,
}

impl DigitalOutput {
    /// Bind `line` as an output already driven to `initial`.
    ///
    /// # Errors
    /// Returns the driver's `HalError::Binding`; the line is left untouched.
    pub fn bind(
        id: ActuatorId,
        kind: ActuatorKind,
        mut line: Box<dyn OutputLine>,
        initial: bool,
    ) -> Result<Self, HalError> {
        line.bind(initial)?;
        debug!("Bound {} on {} (initial={})", kind, id, initial);
        Ok(Self {
            state: ActuatorState {
                id,
                kind,
                is_energized: initial,
            },
            line,
            released: false,
        })
    }

    /// Energize (`true`) or de-energize (`false`) the actuator.
    ///
    /// # Errors
    /// `HalError::Closed` after release, or the driver's write error.
    pub fn set(&mut self, energized: bool) -> Result<(), HalError> {
        if self.released {
            return Err(HalError::Closed);
        }
        self.line.write(energized)?;
        self.state.is_energized = energized;
        Ok(())
    }

    /// Last commanded state.
    #[inline]
    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Whether the line was last driven high.
    #[inline]
    pub fn is_energized(&self) -> bool {
        self.state.is_energized
    }

    /// Bound pin.
    #[inline]
    pub fn id(&self) -> ActuatorId {
        self.state.id
    }

    /// Role of the line.
    #[inline]
    pub fn kind(&self) -> ActuatorKind {
        self.state.kind
    }

    /// Whether the line has been handed back to the driver.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Hand the line back to the driver. Later calls are no-ops.
    pub fn release(&mut self) -> Result<(), HalError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.state.is_energized = false;
        debug!("Releasing {} on {}", self.state.kind, self.state.id);
        self.line.release()
    }
}

impl Drop for DigitalOutput {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(
                "Failed to release {} on {}: {}",
                self.state.kind, self.state.id, e
            );
        }
    }
}

impl std::fmt::Debug for DigitalOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOutput")
            .field("state", &self.state)
            .field("released", &self.released)
            .finish()
    }
}

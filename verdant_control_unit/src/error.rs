//! Control loop error taxonomy.
//!
//! Everything except `Binding` and `Config` happens after hardware is bound
//! and routes the loop to Safing.

use std::io;

use thiserror::Error;
use verdant_common::config::ConfigError;
use verdant_common::hal::driver::HalError;
use verdant_common::hal::types::{ActuatorId, ActuatorKind, SensorKind};

use crate::safety::SafingFaults;

/// Control loop error.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Hardware could not be bound at startup. Nothing to make safe.
    #[error("hardware binding failed: {0}")]
    Binding(#[source] HalError),

    /// A sensor read failed during Running.
    #[error("{sensor} read failed: {source}")]
    SensorRead {
        /// Sensor that failed.
        sensor: SensorKind,
        /// Driver-level cause.
        #[source]
        source: HalError,
    },

    /// An actuator line write failed.
    #[error("{kind} on {actuator} failed: {source}")]
    Actuation {
        /// Pin of the actuator.
        actuator: ActuatorId,
        /// Role of the actuator.
        kind: ActuatorKind,
        /// Driver-level cause.
        #[source]
        source: HalError,
    },

    /// The startup safe state could not be applied; valve position unknown.
    #[error("safe state incomplete: {0:?}")]
    SafeState(SafingFaults),

    /// Shutdown was requested.
    #[error("interrupted by shutdown request")]
    Interrupted,

    /// Measurement log I/O failed.
    #[error("measurement log: {0}")]
    Log(#[from] io::Error),

    /// Configuration missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ControlError {
    /// Whether this error ends the run because of a shutdown request rather
    /// than a fault.
    #[inline]
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }

    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted => 130,
            _ => 1,
        }
    }
}

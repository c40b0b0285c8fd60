//! # Verdant HAL Library
//!
//! Sensor and actuator abstractions for the reservoir rig, plus the drivers
//! that back them. Drivers implement the contracts defined in
//! `verdant_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`digital_output`] - `DigitalOutput`, one pump or solenoid line
//! - [`analog`] - `AnalogChannelReader` over the ADC driver binary
//! - [`gas`] - `GasSensorLink` over the CO2 client binary
//! - [`serial`] - `SerialSensorLink`, conductivity probe protocol
//! - [`rig`] - `Rig`, binds every component from `HalConfig`
//! - [`drivers`] - Linux and simulation backends
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        verdant_hal                           │
//! │  ┌───────────────┐   ┌──────────────┐   ┌────────────────┐   │
//! │  │ DigitalOutput │   │ Analog / Gas │   │ SerialSensor   │   │
//! │  │               │   │ readers      │   │ Link           │   │
//! │  └──────┬────────┘   └──────┬───────┘   └──────┬─────────┘   │
//! │         ▼                   ▼                  ▼             │
//! │    OutputLine         CommandRunner      SerialTransport     │
//! │         └───────────────────┼──────────────────┘             │
//! │                             ▼                                │
//! │                HalBackend (linux | simulation)               │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod analog;
pub mod digital_output;
pub mod drivers;
pub mod gas;
pub mod rig;
pub mod serial;

mod scalar;

// Re-export key types for convenience
pub use crate::analog::AnalogChannelReader;
pub use crate::digital_output::DigitalOutput;
pub use crate::drivers::{HalBackend, LinuxBackend};
pub use crate::gas::GasSensorLink;
pub use crate::rig::Rig;
pub use crate::serial::SerialSensorLink;

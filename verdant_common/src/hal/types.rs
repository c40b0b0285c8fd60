//! HAL value types.
//!
//! - `ActuatorKind` / `ActuatorState` - Write-only actuator bookkeeping
//! - `FullScaleRange` - ADS1115 programmable gain settings
//! - `SensorKind` / `SensorReading` - Timestamped sensor samples

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a digital output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActuatorKind {
    /// Peristaltic dosing pump enable line.
    Pump,
    /// Solenoid that drives the valve towards Open.
    ValveOpenSolenoid,
    /// Solenoid that drives the valve towards Closed.
    ValveCloseSolenoid,
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pump => write!(f, "pump"),
            Self::ValveOpenSolenoid => write!(f, "valve-open solenoid"),
            Self::ValveCloseSolenoid => write!(f, "valve-close solenoid"),
        }
    }
}

/// Configured pin identifier of an actuator (in the configured numbering scheme).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActuatorId(pub u8);

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pin {}", self.0)
    }
}

/// Last commanded state of an actuator. Never read back from hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    /// Bound pin.
    pub id: ActuatorId,
    /// Role of the line.
    pub kind: ActuatorKind,
    /// Whether the line is currently driven high.
    pub is_energized: bool,
}

/// Full-scale range of the ADS1115 programmable gain amplifier.
///
/// The discriminant is the range code passed to the ADC driver binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FullScaleRange {
    /// ±0.256 V
    #[serde(rename = "0.256V")]
    Fsr0_256V = 0,
    /// ±0.512 V
    #[serde(rename = "0.512V")]
    Fsr0_512V = 1,
    /// ±1.024 V
    #[serde(rename = "1.024V")]
    Fsr1_024V = 2,
    /// ±2.048 V
    #[serde(rename = "2.048V")]
    Fsr2_048V = 3,
    /// ±4.096 V
    #[serde(rename = "4.096V")]
    Fsr4_096V = 4,
    /// ±6.144 V
    #[serde(rename = "6.144V")]
    #[default]
    Fsr6_144V = 5,
}

impl FullScaleRange {
    /// All ranges, narrowest first.
    pub const ALL: [Self; 6] = [
        Self::Fsr0_256V,
        Self::Fsr0_512V,
        Self::Fsr1_024V,
        Self::Fsr2_048V,
        Self::Fsr4_096V,
        Self::Fsr6_144V,
    ];

    /// Range code understood by the ADC driver (0-5).
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Convert from a driver range code. Returns `None` for invalid values.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Fsr0_256V),
            1 => Some(Self::Fsr0_512V),
            2 => Some(Self::Fsr1_024V),
            3 => Some(Self::Fsr2_048V),
            4 => Some(Self::Fsr4_096V),
            5 => Some(Self::Fsr6_144V),
            _ => None,
        }
    }

    /// Maximum representable voltage magnitude [V].
    pub const fn volts(self) -> f64 {
        match self {
            Self::Fsr0_256V => 0.256,
            Self::Fsr0_512V => 0.512,
            Self::Fsr1_024V => 1.024,
            Self::Fsr2_048V => 2.048,
            Self::Fsr4_096V => 4.096,
            Self::Fsr6_144V => 6.144,
        }
    }
}

impl fmt::Display for FullScaleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "±{:.3}V", self.volts())
    }
}

/// Physical quantity a reading represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Reservoir conductivity [µS/cm].
    Conductivity,
    /// Ambient CO2 concentration [ppm].
    Co2,
    /// Auxiliary ADC channel (foam level probe) [V].
    AuxVoltage,
}

impl SensorKind {
    /// Engineering unit of the reading.
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Conductivity => "uS/cm",
            Self::Co2 => "ppm",
            Self::AuxVoltage => "V",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conductivity => write!(f, "conductivity"),
            Self::Co2 => write!(f, "CO2"),
            Self::AuxVoltage => write!(f, "aux voltage"),
        }
    }
}

/// One immutable sensor sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Quantity sampled.
    pub kind: SensorKind,
    /// Value in `kind.unit()`.
    pub value: f64,
    /// Wall-clock time the sample was taken.
    pub timestamp: DateTime<Local>,
}

impl SensorReading {
    /// Create a reading stamped with the current wall-clock time.
    pub fn now(kind: SensorKind, value: f64) -> Self {
        Self {
            kind,
            value,
            timestamp: Local::now(),
        }
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:.3}{}", self.kind, self.value, self.kind.unit())
    }
}

//! HAL configuration (`[hal]` table).
//!
//! Pin bindings, conductivity probe port, ADC and CO2 driver invocation.
//! Numeric fields default via `#[serde(default)]` so a minimal file only
//! names what differs from the reference rig.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use heapless::Vec as FixedVec;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, require_positive_secs};
use crate::consts::{
    COMMAND_TIMEOUT_S_DEFAULT, MAX_ADC_CHANNELS, MAX_PUMPS, SERIAL_BAUD_DEFAULT,
    SERIAL_TIMEOUT_S_DEFAULT,
};
use crate::hal::pins::PinNumbering;
use crate::hal::types::FullScaleRange;

/// Complete HAL configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalConfig {
    /// Numbering scheme of every pin below.
    #[serde(default)]
    pub pin_numbering: PinNumbering,

    /// Offset added to the BCM number to obtain the sysfs GPIO number.
    #[serde(default)]
    pub gpio_chip_base: u32,

    /// Peristaltic pump enable lines, primary dosing pump first by default.
    #[serde(default = "default_pump_pins")]
    pub pump_pins: FixedVec<u8, MAX_PUMPS>,

    /// Valve open-solenoid line.
    #[serde(default = "default_valve_open_pin")]
    pub valve_open_pin: u8,

    /// Valve close-solenoid line.
    #[serde(default = "default_valve_close_pin")]
    pub valve_close_pin: u8,

    /// Conductivity probe link.
    #[serde(default)]
    pub conductivity: SerialProbeConfig,

    /// ADC driver.
    #[serde(default)]
    pub adc: AdcConfig,

    /// CO2 sensor driver.
    #[serde(default)]
    pub co2: GasSensorConfig,
}

fn default_pump_pins() -> FixedVec<u8, MAX_PUMPS> {
    FixedVec::from_slice(&[37, 35, 33, 31]).unwrap_or_default()
}
fn default_valve_open_pin() -> u8 {
    29
}
fn default_valve_close_pin() -> u8 {
    32
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            pin_numbering: PinNumbering::default(),
            gpio_chip_base: 0,
            pump_pins: default_pump_pins(),
            valve_open_pin: default_valve_open_pin(),
            valve_close_pin: default_valve_close_pin(),
            conductivity: SerialProbeConfig::default(),
            adc: AdcConfig::default(),
            co2: GasSensorConfig::default(),
        }
    }
}

impl HalConfig {
    /// Validate pin assignments and driver parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pump_pins.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one pump pin is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for pin in self.all_pins() {
            if self.pin_numbering.to_bcm(pin).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "pin {pin} is not a GPIO in {:?} numbering",
                    self.pin_numbering
                )));
            }
            if !seen.insert(pin) {
                return Err(ConfigError::ValidationError(format!(
                    "pin {pin} assigned more than once"
                )));
            }
        }

        self.conductivity.validate()?;
        self.adc.validate()?;
        self.co2.validate()
    }

    /// Every configured output pin, pumps first.
    pub fn all_pins(&self) -> impl Iterator<Item = u8> + '_ {
        self.pump_pins
            .iter()
            .copied()
            .chain([self.valve_open_pin, self.valve_close_pin])
    }
}

/// Conductivity probe serial link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialProbeConfig {
    /// Serial device path.
    #[serde(default = "default_serial_port")]
    pub port: String,

    /// Baud rate.
    #[serde(default = "default_baud")]
    pub baud_rate: u32,

    /// Fixed response timeout [s].
    #[serde(default = "default_serial_timeout")]
    pub response_timeout_s: f64,

    /// Probe constant sent as `K,<value>` at startup. Omitted → probe default.
    #[serde(default)]
    pub sensitivity: Option<f64>,
}

fn default_serial_port() -> String {
    "/dev/serial0".to_string()
}
fn default_baud() -> u32 {
    SERIAL_BAUD_DEFAULT
}
fn default_serial_timeout() -> f64 {
    SERIAL_TIMEOUT_S_DEFAULT
}

impl Default for SerialProbeConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud(),
            response_timeout_s: default_serial_timeout(),
            sensitivity: None,
        }
    }
}

impl SerialProbeConfig {
    /// Response timeout as `Duration`.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.response_timeout_s)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port.is_empty() {
            return Err(ConfigError::ValidationError(
                "conductivity.port cannot be empty".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::ValidationError(
                "conductivity.baud_rate must be non-zero".to_string(),
            ));
        }
        if let Some(k) = self.sensitivity {
            if !k.is_finite() || k <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "conductivity.sensitivity must be positive, got {k}"
                )));
            }
        }
        require_positive_secs("conductivity.response_timeout_s", self.response_timeout_s)
    }
}

/// ADS1115 driver invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdcConfig {
    /// Driver binary, invoked as `<driver> <channel> <range_code>`.
    #[serde(default = "default_adc_driver")]
    pub driver: PathBuf,

    /// Number of channels addressable on the ADC.
    #[serde(default = "default_channel_count")]
    pub channel_count: u8,

    /// Initial full-scale range.
    #[serde(default)]
    pub range: FullScaleRange,

    /// Channel carrying the foam probe voltage. `None` disables valve control.
    #[serde(default)]
    pub aux_channel: Option<u8>,

    /// Driver process timeout [s].
    #[serde(default = "default_command_timeout")]
    pub command_timeout_s: f64,
}

fn default_adc_driver() -> PathBuf {
    PathBuf::from("/usr/local/bin/ads1115-driver")
}
fn default_channel_count() -> u8 {
    MAX_ADC_CHANNELS
}
fn default_command_timeout() -> f64 {
    COMMAND_TIMEOUT_S_DEFAULT
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            driver: default_adc_driver(),
            channel_count: default_channel_count(),
            range: FullScaleRange::default(),
            aux_channel: None,
            command_timeout_s: default_command_timeout(),
        }
    }
}

impl AdcConfig {
    /// Driver timeout as `Duration`.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.command_timeout_s)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_count == 0 || self.channel_count > MAX_ADC_CHANNELS {
            return Err(ConfigError::ValidationError(format!(
                "adc.channel_count must be in 1..={MAX_ADC_CHANNELS}, got {}",
                self.channel_count
            )));
        }
        if let Some(channel) = self.aux_channel {
            if channel >= self.channel_count {
                return Err(ConfigError::ValidationError(format!(
                    "adc.aux_channel {channel} out of range (0..{})",
                    self.channel_count
                )));
            }
        }
        require_positive_secs("adc.command_timeout_s", self.command_timeout_s)
    }
}

/// CO2 sensor client invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasSensorConfig {
    /// Vendor client binary, invoked as `<driver> -i <sensor_id>`.
    #[serde(default = "default_co2_driver")]
    pub driver: PathBuf,

    /// Sensor index on the USB bus.
    #[serde(default)]
    pub sensor_id: u32,

    /// Driver process timeout [s].
    #[serde(default = "default_command_timeout")]
    pub command_timeout_s: f64,
}

fn default_co2_driver() -> PathBuf {
    PathBuf::from("/usr/local/bin/usbtenkiget")
}

impl Default for GasSensorConfig {
    fn default() -> Self {
        Self {
            driver: default_co2_driver(),
            sensor_id: 0,
            command_timeout_s: default_command_timeout(),
        }
    }
}

impl GasSensorConfig {
    /// Driver timeout as `Duration`.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.command_timeout_s)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_positive_secs("co2.command_timeout_s", self.command_timeout_s)
    }
}

//! Rig assembly.
//!
//! `Rig` binds every actuator and sensor named in `HalConfig` against one
//! backend. Binding is all-or-nothing: if any step fails, everything bound so
//! far is released by drop before the error is returned.

use std::sync::Arc;

use tracing::{info, warn};
use verdant_common::hal::config::HalConfig;
use verdant_common::hal::driver::{HalError, SerialTransport};
use verdant_common::hal::types::{ActuatorId, ActuatorKind};

use crate::analog::AnalogChannelReader;
use crate::digital_output::DigitalOutput;
use crate::drivers::HalBackend;
use crate::gas::GasSensorLink;
use crate::serial::SerialSensorLink;

/// Conductivity probe link over whatever transport the backend provides.
pub type ProbeLink = SerialSensorLink<Box<dyn SerialTransport>>;

/// Every bound hardware handle of one reservoir rig.
#[derive(Debug)]
pub struct Rig {
    /// Pump enable lines, in `pump_pins` order.
    pub pumps: Vec<DigitalOutput>,
    /// Valve open solenoid.
    pub valve_open: DigitalOutput,
    /// Valve close solenoid.
    pub valve_close: DigitalOutput,
    /// Conductivity probe.
    pub conductivity: ProbeLink,
    /// ADC reader.
    pub adc: AnalogChannelReader,
    /// CO2 sensor.
    pub co2: GasSensorLink,
    /// ADC channel carrying the foam probe, if valve control is enabled.
    pub aux_channel: Option<u8>,
}

impl Rig {
    /// Bind all hardware described by `config`.
    ///
    /// Every output starts de-energized.
    ///
    /// # Errors
    /// The first `HalError::Binding` (or probe setup error) encountered.
    pub fn bind(config: &HalConfig, backend: &mut dyn HalBackend) -> Result<Self, HalError> {
        info!("Binding rig on {} backend", backend.name());

        let mut pumps = Vec::with_capacity(config.pump_pins.len());
        for &pin in config.pump_pins.iter() {
            pumps.push(bind_output(config, backend, pin, ActuatorKind::Pump)?);
        }
        let valve_open = bind_output(
            config,
            backend,
            config.valve_open_pin,
            ActuatorKind::ValveOpenSolenoid,
        )?;
        let valve_close = bind_output(
            config,
            backend,
            config.valve_close_pin,
            ActuatorKind::ValveCloseSolenoid,
        )?;

        let probe = &config.conductivity;
        let transport = backend.serial(probe)?;
        let conductivity =
            SerialSensorLink::open(transport, probe.response_timeout(), probe.sensitivity)?;

        let runner = backend.runner();
        let adc = AnalogChannelReader::new(&config.adc, Arc::clone(&runner));
        let co2 = GasSensorLink::new(&config.co2, runner);

        info!(
            "Rig bound: {} pumps, valve on {}/{}, probe on {}, aux channel {:?}",
            pumps.len(),
            valve_open.id(),
            valve_close.id(),
            probe.port,
            config.adc.aux_channel
        );

        Ok(Self {
            pumps,
            valve_open,
            valve_close,
            conductivity,
            adc,
            co2,
            aux_channel: config.adc.aux_channel,
        })
    }

    /// Whether any pump or solenoid is currently energized.
    pub fn any_energized(&self) -> bool {
        self.pumps
            .iter()
            .chain([&self.valve_open, &self.valve_close])
            .any(DigitalOutput::is_energized)
    }

    /// Release every line and close the probe.
    ///
    /// All handles are attempted; the first failure is returned.
    pub fn release(&mut self) -> Result<(), HalError> {
        let mut first_error = None;
        for output in self
            .pumps
            .iter_mut()
            .chain([&mut self.valve_open, &mut self.valve_close])
        {
            if let Err(e) = output.release() {
                warn!("Release of {} on {} failed: {}", output.kind(), output.id(), e);
                first_error.get_or_insert(e);
            }
        }
        self.conductivity.close();
        info!("Rig released");
        first_error.map_or(Ok(()), Err)
    }
}

fn bind_output(
    config: &HalConfig,
    backend: &mut dyn HalBackend,
    pin: u8,
    kind: ActuatorKind,
) -> Result<DigitalOutput, HalError> {
    let bcm = config
        .pin_numbering
        .to_bcm(pin)
        .ok_or_else(|| HalError::Binding {
            target: format!("pin {pin}"),
            reason: format!("not a GPIO in {:?} numbering", config.pin_numbering),
        })?;
    let gpio = config
        .gpio_chip_base
        .checked_add(u32::from(bcm))
        .ok_or_else(|| HalError::Binding {
            target: format!("pin {pin}"),
            reason: format!("gpio_chip_base {} overflows", config.gpio_chip_base),
        })?;
    let line = backend.output_line(gpio);
    DigitalOutput::bind(ActuatorId(pin), kind, line, false)
}

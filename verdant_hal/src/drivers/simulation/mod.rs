//! Simulation backend.
//!
//! Software rig for development and testing without hardware. Every driver
//! interaction lands in a shared [`Journal`] so tests can assert on ordering.

mod journal;
mod line;
mod probe;
mod runner;
mod signal;

pub use journal::{Journal, JournalEntry};
pub use line::SimulatedLine;
pub use probe::SimulatedProbe;
pub use runner::SimulatedRunner;
pub use signal::Signal;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use verdant_common::hal::config::{HalConfig, SerialProbeConfig};
use verdant_common::hal::driver::{CommandRunner, HalError, OutputLine, SerialTransport};

use super::HalBackend;

/// Conductivity reported when no signal is scripted [µS/cm].
const IDLE_CONDUCTIVITY: f64 = 1000.0;
/// CO2 reported when no signal is scripted [ppm].
const IDLE_CO2: f64 = 650.0;
/// Auxiliary voltage reported when no signal is scripted, inside the valve band [V].
const IDLE_AUX: f64 = 1.1;

/// Backend producing simulated lines, probe and drivers.
pub struct SimulationBackend {
    journal: Journal,
    runner: Arc<SimulatedRunner>,
    adc_driver: String,
    co2_driver: String,
    probe_signal: Option<Signal>,
    failing_gpio: HashSet<u32>,
}

impl SimulationBackend {
    /// Quiet rig matching the driver paths in `config`.
    ///
    /// Conductivity sits above the default dosing threshold and the auxiliary
    /// channel inside the valve band, so an unscripted run never actuates.
    pub fn new(config: &HalConfig, journal: Journal) -> Self {
        let backend = Self {
            runner: Arc::new(SimulatedRunner::new(journal.clone())),
            journal,
            adc_driver: config.adc.driver.to_string_lossy().into_owned(),
            co2_driver: config.co2.driver.to_string_lossy().into_owned(),
            probe_signal: Some(Signal::Constant(IDLE_CONDUCTIVITY)),
            failing_gpio: HashSet::new(),
        };
        backend
            .runner
            .respond(&backend.co2_driver, &[], Signal::Constant(IDLE_CO2));
        for channel in 0..config.adc.channel_count {
            backend.runner.respond(
                &backend.adc_driver,
                &[channel.to_string().as_str()],
                Signal::Constant(IDLE_AUX),
            );
        }
        backend
    }

    /// Slowly varying waveforms that exercise dosing and both valve moves.
    pub fn demo(config: &HalConfig, journal: Journal) -> Self {
        let mut backend = Self::new(config, journal).with_conductivity(Signal::Ramp {
            value: 960.0,
            step: -4.0,
            low: 860.0,
            high: 1000.0,
        });
        backend = backend.with_co2(Signal::Ramp {
            value: 620.0,
            step: 1.5,
            low: 450.0,
            high: 900.0,
        });
        if let Some(channel) = config.adc.aux_channel {
            backend = backend.with_analog(
                channel,
                Signal::Ramp {
                    value: 1.1,
                    step: -0.02,
                    low: 0.7,
                    high: 1.5,
                },
            );
        }
        backend
    }

    /// Script the conductivity probe.
    pub fn with_conductivity(mut self, signal: Signal) -> Self {
        self.probe_signal = Some(signal);
        self
    }

    /// Script the CO2 driver.
    pub fn with_co2(self, signal: Signal) -> Self {
        self.runner.respond(&self.co2_driver, &[], signal);
        self
    }

    /// Script one ADC channel, for every range.
    pub fn with_analog(self, channel: u8, signal: Signal) -> Self {
        self.runner
            .respond(&self.adc_driver, &[channel.to_string().as_str()], signal);
        self
    }

    /// Make binding of `gpio` fail.
    pub fn with_failing_gpio(mut self, gpio: u32) -> Self {
        self.failing_gpio.insert(gpio);
        self
    }

    /// Journal shared by everything this backend hands out.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

impl HalBackend for SimulationBackend {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn output_line(&mut self, gpio: u32) -> Box<dyn OutputLine> {
        let line = SimulatedLine::new(gpio, self.journal.clone());
        if self.failing_gpio.contains(&gpio) {
            Box::new(line.failing_bind())
        } else {
            Box::new(line)
        }
    }

    fn serial(&mut self, config: &SerialProbeConfig) -> Result<Box<dyn SerialTransport>, HalError> {
        let signal = self.probe_signal.take().ok_or_else(|| HalError::Binding {
            target: config.port.clone(),
            reason: "port already open".to_string(),
        })?;
        debug!("Simulated probe on {}", config.port);
        Ok(Box::new(SimulatedProbe::new(signal, self.journal.clone())))
    }

    fn runner(&mut self) -> Arc<dyn CommandRunner> {
        self.runner.clone()
    }
}

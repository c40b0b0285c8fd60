//! HAL backend implementations.
//!
//! A backend hands out the three driver capabilities a [`Rig`](crate::Rig)
//! needs: output lines, the probe transport and a command runner.
//!
//! - [`LinuxBackend`] - sysfs GPIO, `serialport`, real child processes
//! - [`simulation::SimulationBackend`] - software rig for development and tests

mod process;
mod serial_port;
pub mod simulation;
mod sysfs_gpio;

use std::sync::Arc;

use verdant_common::hal::config::SerialProbeConfig;
use verdant_common::hal::driver::{CommandRunner, HalError, OutputLine, SerialTransport};

pub use process::SystemCommandRunner;
pub use serial_port::SerialPortTransport;
pub use sysfs_gpio::SysfsLine;

/// Source of driver capabilities for one rig.
pub trait HalBackend {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Unbound output line for the global GPIO number `gpio`.
    fn output_line(&mut self, gpio: u32) -> Box<dyn OutputLine>;

    /// Open the conductivity probe transport.
    fn serial(&mut self, config: &SerialProbeConfig) -> Result<Box<dyn SerialTransport>, HalError>;

    /// Shared runner for external measurement drivers.
    fn runner(&mut self) -> Arc<dyn CommandRunner>;
}

/// Production backend for a Raspberry Pi class board.
#[derive(Debug)]
pub struct LinuxBackend {
    runner: Arc<SystemCommandRunner>,
}

impl LinuxBackend {
    /// Create a backend with the default process runner.
    pub fn new() -> Self {
        Self {
            runner: Arc::new(SystemCommandRunner::new()),
        }
    }
}

impl Default for LinuxBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HalBackend for LinuxBackend {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn output_line(&mut self, gpio: u32) -> Box<dyn OutputLine> {
        Box::new(SysfsLine::new(gpio))
    }

    fn serial(&mut self, config: &SerialProbeConfig) -> Result<Box<dyn SerialTransport>, HalError> {
        Ok(Box::new(SerialPortTransport::open(config)?))
    }

    fn runner(&mut self) -> Arc<dyn CommandRunner> {
        self.runner.clone()
    }
}

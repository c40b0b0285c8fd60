//! `SerialTransport` over a `serialport` handle.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::info;
use verdant_common::hal::config::SerialProbeConfig;
use verdant_common::hal::driver::{HalError, SerialTransport};

/// Per-read timeout. The response deadline is enforced by `SerialSensorLink`.
const READ_SLICE: Duration = Duration::from_millis(50);

/// Open serial device.
pub struct SerialPortTransport {
    port: Box<dyn SerialPort>,
}

impl SerialPortTransport {
    /// Open the probe port described by `config` as 8N1.
    pub fn open(config: &SerialProbeConfig) -> Result<Self, HalError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(READ_SLICE)
            .open()
            .map_err(|e| HalError::Binding {
                target: config.port.clone(),
                reason: e.to_string(),
            })?;
        info!("Opened {} at {} baud", config.port, config.baud_rate);
        Ok(Self { port })
    }
}

impl SerialTransport for SerialPortTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

impl std::fmt::Debug for SerialPortTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortTransport")
            .field("port", &self.port.name())
            .finish()
    }
}

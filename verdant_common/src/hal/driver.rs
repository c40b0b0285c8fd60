//! HAL driver traits and error types.
//!
//! This module defines:
//! - `HalError` enum - Error types for HAL operations
//! - `OutputLine` trait - One binary output line of the digital-I/O driver
//! - `CommandRunner` trait - Capability to invoke an external driver process
//! - `SerialTransport` trait - Byte transport to the conductivity probe
//!
//! The concrete implementations (sysfs GPIO, system processes, `serialport`,
//! simulation) live in `verdant_hal::drivers`.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Binding a pin or port at startup failed.
    #[error("Failed to bind {target}: {reason}")]
    Binding {
        /// Pin or port that could not be bound.
        target: String,
        /// Driver-reported cause.
        reason: String,
    },

    /// Hardware communication error.
    #[error("Hardware communication error: {0}")]
    Io(String),

    /// A blocking operation exceeded its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// What was waited for.
        operation: String,
        /// Deadline that expired.
        after: Duration,
    },

    /// External driver process could not be started or exited unsuccessfully.
    #[error("Driver command `{program}` failed: {reason}")]
    CommandFailed {
        /// Program that was invoked.
        program: String,
        /// Spawn error or exit status description.
        reason: String,
    },

    /// Response could not be decoded into a value.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The device answered a command with an error token.
    #[error("Device rejected command `{0}`")]
    DeviceRejected(String),

    /// The handle was already released.
    #[error("Handle already closed")]
    Closed,

    /// ADC channel outside `0..channel_count`.
    #[error("ADC channel {channel} out of range (0..{count})")]
    ChannelOutOfRange {
        /// Requested channel.
        channel: u8,
        /// Number of channels on the reader.
        count: u8,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<io::Error> for HalError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// One binary output line of the digital-I/O driver.
///
/// # Lifecycle
///
/// 1. `bind()` - Claims the line and drives `initial` in one step
/// 2. `write()` - Any number of level changes
/// 3. `release()` - Returns the line to the driver
///
/// Callers guarantee `release()` is invoked at most once.
pub trait OutputLine: Send {
    /// Claim the line as an output already driven to `initial`.
    fn bind(&mut self, initial: bool) -> Result<(), HalError>;

    /// Drive the line high (`true`) or low (`false`).
    fn write(&mut self, high: bool) -> Result<(), HalError>;

    /// Release the line back to the driver.
    fn release(&mut self) -> Result<(), HalError>;
}

/// Captured result of an external driver invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
}

impl CommandOutput {
    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Capability to run an external measurement driver.
///
/// Implementations must not block longer than `timeout`; on expiry the
/// process is terminated and `HalError::Timeout` is returned.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, capturing stdout and the exit status.
    fn run(&self, program: &str, args: &[String], timeout: Duration)
    -> Result<CommandOutput, HalError>;
}

/// Byte transport to a line-oriented serial device.
///
/// `read` must return within the transport's own (short) read timeout,
/// either with data, `Ok(0)`, or an `io::ErrorKind::TimedOut` /
/// `io::ErrorKind::WouldBlock` error.
pub trait SerialTransport: Send {
    /// Write the whole buffer.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read available bytes into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Drop any bytes already received but not yet read.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl<T: SerialTransport + ?Sized> SerialTransport for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        (**self).discard_input()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_error_display() {
        let err = HalError::Binding {
            target: "pin 37".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("pin 37"));

        let err = HalError::ChannelOutOfRange {
            channel: 5,
            count: 4,
        };
        assert_eq!(err.to_string(), "ADC channel 5 out of range (0..4)");
    }

    #[test]
    fn test_io_error_conversion() {
        let err: HalError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, HalError::Io(ref msg) if msg.contains("gone")));
    }

    #[test]
    fn test_command_output_success() {
        let ok = CommandOutput {
            status: Some(0),
            stdout: "1.0\n".to_string(),
        };
        let failed = CommandOutput {
            status: Some(2),
            stdout: String::new(),
        };
        let killed = CommandOutput {
            status: None,
            stdout: String::new(),
        };
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }
}

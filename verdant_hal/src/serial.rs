//! Conductivity probe command/response protocol.
//!
//! ASCII commands terminated by CR. The probe acknowledges every accepted
//! command with `*OK` and rejects with `*ER`; a reading request answers a
//! data line before the acknowledgment.
//!
//! | Command | Meaning                         |
//! |---------|---------------------------------|
//! | `R`     | single reading                  |
//! | `C,0/1` | continuous mode off / on        |
//! | `K,x`   | probe constant (sensitivity)    |

use std::io;
use std::time::{Duration, Instant};

use tracing::{debug, trace};
use verdant_common::consts::{SERIAL_ACK, SERIAL_NAK, SERIAL_RX_BUFFER, SERIAL_TERMINATOR};
use verdant_common::hal::driver::{HalError, SerialTransport};

const READ_COMMAND: &str = "R";

/// Request/response session with the conductivity probe.
///
/// The transport is owned exclusively and closed exactly once, by `close()`
/// or on drop.
pub struct SerialSensorLink<T: SerialTransport> {
    transport: Option<T>,
    timeout: Duration,
    last_command: String,
}

impl<T: SerialTransport> SerialSensorLink<T> {
    /// Take ownership of `transport` and put the probe in polled mode.
    ///
    /// Continuous output is switched off, anything it already sent is
    /// discarded, then `sensitivity` is applied if given.
    pub fn open(transport: T, timeout: Duration, sensitivity: Option<f64>) -> Result<Self, HalError> {
        let mut link = Self {
            transport: Some(transport),
            timeout,
            last_command: String::new(),
        };
        link.set_continuous_mode(false)?;
        link.transport_mut()?.discard_input()?;
        if let Some(k) = sensitivity {
            link.configure_sensitivity(k)?;
        }
        debug!("Conductivity probe ready (timeout {:?})", timeout);
        Ok(link)
    }

    fn transport_mut(&mut self) -> Result<&mut T, HalError> {
        self.transport.as_mut().ok_or(HalError::Closed)
    }

    /// Send `command` followed by the terminator.
    pub fn send(&mut self, command: &str) -> Result<(), HalError> {
        trace!("probe <- {}", command);
        let mut frame = String::with_capacity(command.len() + 1);
        frame.push_str(command);
        frame.push(SERIAL_TERMINATOR);
        self.transport_mut()?.write_all(frame.as_bytes())?;
        self.last_command.clear();
        self.last_command.push_str(command);
        Ok(())
    }

    /// Collect response lines until a complete answer arrived or the
    /// response timeout expires.
    ///
    /// Acknowledgments and blank lines are dropped.
    ///
    /// # Errors
    /// - `DeviceRejected` if the probe answered `*ER`
    /// - `InvalidResponse` on buffer overflow or non-UTF-8 data
    /// - `Timeout` if no data line arrived
    pub fn receive(&mut self) -> Result<Vec<String>, HalError> {
        let timeout = self.timeout;
        let deadline = Instant::now() + timeout;
        let mut buf: Vec<u8> = Vec::with_capacity(SERIAL_RX_BUFFER);
        let mut chunk = [0u8; 32];

        let expects_data = self.last_command == READ_COMMAND;
        let transport = self.transport.as_mut().ok_or(HalError::Closed)?;
        while Instant::now() < deadline {
            let n = match transport.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => 0,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                continue;
            }
            if buf.len() + n > SERIAL_RX_BUFFER {
                return Err(HalError::InvalidResponse(format!(
                    "response exceeds {SERIAL_RX_BUFFER} bytes"
                )));
            }
            buf.extend_from_slice(&chunk[..n]);
            if buf.ends_with(&[SERIAL_TERMINATOR as u8]) && is_complete(&buf, expects_data) {
                break;
            }
        }

        // An unterminated tail is a line cut off by the deadline.
        let complete = buf
            .iter()
            .rposition(|b| *b == SERIAL_TERMINATOR as u8)
            .map_or(0, |end| end + 1);
        let truncated = complete < buf.len();
        if truncated {
            debug!("Dropping {} bytes of unterminated probe output", buf.len() - complete);
            buf.truncate(complete);
        }

        let text = std::str::from_utf8(&buf)
            .map_err(|e| HalError::InvalidResponse(format!("non-UTF-8 response: {e}")))?;
        trace!("probe -> {:?}", text);

        let lines = split_response(text);
        if lines.iter().any(|l| l == SERIAL_NAK) {
            return Err(HalError::DeviceRejected(self.last_command.clone()));
        }
        if lines.is_empty() && (expects_data || truncated || !text.contains(SERIAL_ACK)) {
            return Err(HalError::Timeout {
                operation: format!("probe response to `{}`", self.last_command),
                after: timeout,
            });
        }
        Ok(lines)
    }

    /// Discard stale input, send `command` and collect its response.
    pub fn write_and_read_response(&mut self, command: &str) -> Result<Vec<String>, HalError> {
        self.transport_mut()?.discard_input()?;
        self.send(command)?;
        self.receive()
    }

    /// Apply the probe constant `K,<k>`.
    pub fn configure_sensitivity(&mut self, k: f64) -> Result<(), HalError> {
        self.write_and_read_response(&format!("K,{k}"))?;
        Ok(())
    }

    /// Switch continuous output on or off.
    pub fn set_continuous_mode(&mut self, enabled: bool) -> Result<(), HalError> {
        self.write_and_read_response(if enabled { "C,1" } else { "C,0" })?;
        Ok(())
    }

    /// Request one reading in µS/cm.
    ///
    /// The probe reports `EC[,TDS,S,SG]`; only the first field is used.
    pub fn get_conductivity(&mut self) -> Result<f64, HalError> {
        let lines = self.write_and_read_response(READ_COMMAND)?;
        let line = lines
            .first()
            .ok_or_else(|| HalError::InvalidResponse("no reading in response".to_string()))?;
        let field = line.split(',').next().unwrap_or("").trim();
        match field.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(HalError::InvalidResponse(format!(
                "expected conductivity, got {line:?}"
            ))),
        }
    }

    /// Whether the transport is still held.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Release the transport. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!("Conductivity probe closed");
        }
    }
}

/// A response is complete once it holds a data line or a rejection. A bare
/// acknowledgment completes it only for commands that return no data.
fn is_complete(buf: &[u8], expects_data: bool) -> bool {
    buf.split(|b| *b == SERIAL_TERMINATOR as u8)
        .map(<[u8]>::trim_ascii)
        .filter(|line| !line.is_empty())
        .any(|line| line != SERIAL_ACK.as_bytes() || !expects_data)
}

fn split_response(text: &str) -> Vec<String> {
    text.split(SERIAL_TERMINATOR)
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != SERIAL_ACK)
        .map(str::to_string)
        .collect()
}

impl<T: SerialTransport> Drop for SerialSensorLink<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: SerialTransport> std::fmt::Debug for SerialSensorLink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSensorLink")
            .field("open", &self.is_open())
            .field("timeout", &self.timeout)
            .finish()
    }
}

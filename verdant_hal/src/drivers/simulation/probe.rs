//! Simulated conductivity probe.

use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::Duration;

use verdant_common::consts::{SERIAL_ACK, SERIAL_NAK, SERIAL_TERMINATOR};
use verdant_common::hal::driver::{HalError, SerialTransport};

use super::journal::{Journal, JournalEntry};
use super::signal::Signal;

/// Mimics the probe firmware: `R` answers a reading then `*OK`, `C,n` and
/// `K,x` answer `*OK`, anything else answers `*ER`.
///
/// A scripted `DeviceRejected` sample answers `*ER`; any other scripted fault
/// makes the probe stay silent so the link times out.
pub struct SimulatedProbe {
    journal: Journal,
    signal: Signal,
    tx: String,
    rx: VecDeque<u8>,
}

impl SimulatedProbe {
    /// Probe reporting conductivity from `signal`.
    pub fn new(signal: Signal, journal: Journal) -> Self {
        Self {
            journal,
            signal,
            tx: String::new(),
            rx: VecDeque::new(),
        }
    }

    fn answer(&mut self, command: &str) -> Option<String> {
        let reply = match command {
            "R" => match self.signal.sample() {
                Ok(value) => format!("{value:.2}{SERIAL_TERMINATOR}{SERIAL_ACK}"),
                Err(HalError::DeviceRejected(_)) => SERIAL_NAK.to_string(),
                Err(_) => return None,
            },
            "C,0" | "C,1" => SERIAL_ACK.to_string(),
            k if k.starts_with("K,") && k[2..].parse::<f64>().is_ok() => SERIAL_ACK.to_string(),
            _ => SERIAL_NAK.to_string(),
        };
        Some(format!("{reply}{SERIAL_TERMINATOR}"))
    }
}

impl SerialTransport for SimulatedProbe {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tx.push_str(&String::from_utf8_lossy(bytes));
        while let Some(end) = self.tx.find(SERIAL_TERMINATOR) {
            let command: String = self.tx.drain(..=end).collect();
            let command = command.trim_end_matches(SERIAL_TERMINATOR).to_string();
            self.journal.record(JournalEntry::SerialTx(command.clone()));
            if let Some(reply) = self.answer(&command) {
                self.rx.extend(reply.bytes());
            }
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.rx.is_empty() {
            thread::sleep(Duration::from_millis(1));
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.rx.clear();
        Ok(())
    }
}

impl Drop for SimulatedProbe {
    fn drop(&mut self) {
        self.journal.record(JournalEntry::SerialClosed);
    }
}

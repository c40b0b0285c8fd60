//! Simulated output line.

use verdant_common::hal::driver::{HalError, OutputLine};

use super::journal::{Journal, JournalEntry};

/// Output line that records every level change in the journal.
#[derive(Debug)]
pub struct SimulatedLine {
    gpio: u32,
    journal: Journal,
    fail_bind: bool,
}

impl SimulatedLine {
    /// Line `gpio` reporting to `journal`.
    pub fn new(gpio: u32, journal: Journal) -> Self {
        Self {
            gpio,
            journal,
            fail_bind: false,
        }
    }

    /// Make `bind()` fail as if the pin were claimed elsewhere.
    pub fn failing_bind(mut self) -> Self {
        self.fail_bind = true;
        self
    }
}

impl OutputLine for SimulatedLine {
    fn bind(&mut self, initial: bool) -> Result<(), HalError> {
        if self.fail_bind {
            return Err(HalError::Binding {
                target: format!("gpio{}", self.gpio),
                reason: "Device or resource busy (simulated)".to_string(),
            });
        }
        self.journal.record(JournalEntry::Bind {
            gpio: self.gpio,
            initial,
        });
        Ok(())
    }

    fn write(&mut self, high: bool) -> Result<(), HalError> {
        self.journal.record(JournalEntry::Write {
            gpio: self.gpio,
            high,
        });
        Ok(())
    }

    fn release(&mut self) -> Result<(), HalError> {
        self.journal.record(JournalEntry::Release { gpio: self.gpio });
        Ok(())
    }
}

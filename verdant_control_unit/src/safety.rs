//! Safe state enforcement.
//!
//! Safe state: every pump off, valve driven closed. The sequence is
//! 1. de-energize all pumps
//! 2. de-energize the open solenoid
//! 3. energize the close solenoid for the full safe-close dwell
//! 4. de-energize the close solenoid
//!
//! Every step is attempted even if an earlier one failed. The dwell is never
//! cut short by a shutdown request.

use std::time::Duration;

use bitflags::bitflags;
use tracing::{error, info, warn};
use verdant_hal::{DigitalOutput, Rig};

use crate::pacing::Pacer;

bitflags! {
    /// Safe-state steps that failed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SafingFaults: u8 {
        /// At least one pump could not be switched off.
        const PUMP_OFF          = 0x01;
        /// Open solenoid could not be de-energized.
        const OPEN_COIL_OFF     = 0x02;
        /// Close solenoid could not be energized; valve position unknown.
        const CLOSE_COIL_ON     = 0x04;
        /// Close solenoid could not be de-energized after the dwell.
        const CLOSE_COIL_OFF    = 0x08;
        /// Releasing hardware handles failed.
        const RELEASE           = 0x10;
    }
}

impl SafingFaults {
    /// Whether a pump may still be running.
    #[inline]
    pub const fn pump_may_run(self) -> bool {
        self.contains(Self::PUMP_OFF)
    }

    /// Whether the valve may not be closed.
    #[inline]
    pub const fn valve_uncertain(self) -> bool {
        self.intersects(Self::OPEN_COIL_OFF.union(Self::CLOSE_COIL_ON))
    }
}

/// Applies the safe state to a bound rig.
#[derive(Debug, Clone, Copy)]
pub struct SafeStateExecutor {
    safe_close: Duration,
}

impl SafeStateExecutor {
    /// Executor holding the close solenoid for `safe_close`.
    pub const fn new(safe_close: Duration) -> Self {
        Self { safe_close }
    }

    /// Close-solenoid dwell.
    #[inline]
    pub const fn safe_close(&self) -> Duration {
        self.safe_close
    }

    /// Run the full sequence and report failed steps.
    pub fn apply(&self, rig: &mut Rig, pacer: &mut dyn Pacer) -> SafingFaults {
        let mut faults = SafingFaults::empty();

        for pump in &mut rig.pumps {
            if !switch(pump, false) {
                faults |= SafingFaults::PUMP_OFF;
            }
        }
        if !switch(&mut rig.valve_open, false) {
            faults |= SafingFaults::OPEN_COIL_OFF;
        }
        if switch(&mut rig.valve_close, true) {
            pacer.hold(self.safe_close);
        } else {
            faults |= SafingFaults::CLOSE_COIL_ON;
        }
        if !switch(&mut rig.valve_close, false) {
            faults |= SafingFaults::CLOSE_COIL_OFF;
        }

        if faults.is_empty() {
            info!("Safe state applied: pumps off, valve closed");
        } else {
            error!("Safe state incomplete: {:?}", faults);
        }
        faults
    }
}

fn switch(output: &mut DigitalOutput, energized: bool) -> bool {
    match output.set(energized) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "Safing: {} on {} -> {}: {}",
                output.kind(),
                output.id(),
                if energized { "on" } else { "off" },
                e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::SimulatedPacer;
    use verdant_common::hal::config::HalConfig;
    use verdant_hal::drivers::simulation::{Journal, JournalEntry, SimulationBackend};

    fn rig(journal: &Journal) -> Rig {
        let config = HalConfig::default();
        let mut backend = SimulationBackend::new(&config, journal.clone());
        Rig::bind(&config, &mut backend).unwrap()
    }

    #[test]
    fn test_sequence_order() {
        let journal = Journal::new();
        let mut rig = rig(&journal);
        rig.pumps[0].set(true).unwrap();
        journal.clear();

        let mut pacer = SimulatedPacer::new(journal.clone());
        let faults = SafeStateExecutor::new(Duration::from_secs(6)).apply(&mut rig, &mut pacer);
        assert!(faults.is_empty());

        let writes: Vec<JournalEntry> = journal.entries();
        assert_eq!(
            &writes[..4],
            &[
                JournalEntry::Write { gpio: 26, high: false },
                JournalEntry::Write { gpio: 19, high: false },
                JournalEntry::Write { gpio: 13, high: false },
                JournalEntry::Write { gpio: 6, high: false },
            ]
        );
        assert_eq!(
            &writes[4..],
            &[
                JournalEntry::Write { gpio: 5, high: false },
                JournalEntry::Write { gpio: 12, high: true },
                JournalEntry::Wait {
                    duration: Duration::from_secs(6),
                    interruptible: false
                },
                JournalEntry::Write { gpio: 12, high: false },
            ]
        );
    }

    #[test]
    fn test_dwell_ignores_cancellation() {
        let journal = Journal::new();
        let mut rig = rig(&journal);
        let mut pacer = SimulatedPacer::new(journal.clone()).cancel_after(0);
        assert!(pacer.cancelled());

        let faults = SafeStateExecutor::new(Duration::from_secs(6)).apply(&mut rig, &mut pacer);
        assert!(faults.is_empty());
        assert_eq!(pacer.elapsed(), Duration::from_secs(6));
    }

    #[test]
    fn test_every_step_attempted_after_failures() {
        let journal = Journal::new();
        let mut rig = rig(&journal);
        rig.pumps[1].release().unwrap();
        rig.valve_open.release().unwrap();
        journal.clear();

        let mut pacer = SimulatedPacer::new(journal.clone());
        let faults = SafeStateExecutor::new(Duration::from_secs(6)).apply(&mut rig, &mut pacer);
        assert_eq!(faults, SafingFaults::PUMP_OFF | SafingFaults::OPEN_COIL_OFF);
        assert!(faults.pump_may_run());
        assert!(faults.valve_uncertain());
        // Remaining pumps and the close coil were still driven.
        assert_eq!(journal.level(26), Some(false));
        assert_eq!(journal.level(6), Some(false));
        assert_eq!(journal.level(12), Some(false));
        assert_eq!(pacer.elapsed(), Duration::from_secs(6));
    }
}

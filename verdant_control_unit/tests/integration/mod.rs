//! Shared fixtures for the control loop integration tests.

mod end_to_end;
mod hysteresis;
mod safing;
mod startup;

use std::fs;
use std::time::Duration;

use chrono::Local;
use tempfile::TempDir;
use verdant_common::config::{ConfigLoader, RigConfig};
use verdant_control_unit::cycle::ControlLoop;
use verdant_control_unit::measurement_log::MeasurementLog;
use verdant_control_unit::pacing::SimulatedPacer;
use verdant_hal::Rig;
use verdant_hal::drivers::simulation::{Journal, JournalEntry, SimulationBackend};

/// Board pins 37, 35, 33, 31 on BCM.
pub const PUMP_GPIOS: [u32; 4] = [26, 19, 13, 6];
/// Board pin 29.
pub const OPEN_COIL: u32 = 5;
/// Board pin 32.
pub const CLOSE_COIL: u32 = 12;

pub const RIG_TOML: &str = r#"
[shared]
service_name = "it-reservoir"

[control]
max_cycles = 1

[hal.conductivity]
response_timeout_s = 0.05

[hal.adc]
driver = "ads1115"
aux_channel = 0

[hal.co2]
driver = "usbtenkiget"
"#;

pub fn rig_config(max_cycles: u64) -> RigConfig {
    let mut config = RigConfig::from_toml(RIG_TOML).unwrap();
    config.control.max_cycles = Some(max_cycles);
    config.validate().unwrap();
    config
}

pub struct Harness {
    pub journal: Journal,
    pub control: ControlLoop<SimulatedPacer>,
    pub log_dir: TempDir,
}

impl Harness {
    pub fn new(
        config: &RigConfig,
        pacer: impl FnOnce(SimulatedPacer) -> SimulatedPacer,
        backend: impl FnOnce(SimulationBackend) -> SimulationBackend,
    ) -> Self {
        let journal = Journal::new();
        let mut backend = backend(SimulationBackend::new(&config.hal, journal.clone()));
        let rig = Rig::bind(&config.hal, &mut backend).unwrap();
        let log_dir = TempDir::new().unwrap();
        let log = MeasurementLog::create(log_dir.path(), Local::now()).unwrap();
        let control = ControlLoop::new(
            config.control.clone(),
            rig,
            log,
            pacer(SimulatedPacer::new(journal.clone())),
        );
        Self {
            journal,
            control,
            log_dir,
        }
    }

    pub fn quiet(config: &RigConfig) -> Self {
        Self::new(config, |p| p, |b| b)
    }

    /// Log rows, header excluded.
    pub fn rows(&self) -> Vec<String> {
        fs::read_to_string(self.control.log().path())
            .unwrap()
            .lines()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    /// Journal entries from the first conductivity request on.
    pub fn running_entries(&self) -> Vec<JournalEntry> {
        let entries = self.journal.entries();
        let start = entries
            .iter()
            .position(|e| *e == JournalEntry::SerialTx("R".to_string()))
            .unwrap_or(entries.len());
        entries[start..].to_vec()
    }

    pub fn writes(&self, gpio: u32, high: bool) -> usize {
        self.journal
            .count(|e| *e == JournalEntry::Write { gpio, high })
    }

    pub fn waits(&self, duration: Duration, interruptible: bool) -> usize {
        self.journal.count(|e| {
            *e == JournalEntry::Wait {
                duration,
                interruptible,
            }
        })
    }

    /// Every pump and both coils de-energized and released exactly once,
    /// probe closed exactly once.
    pub fn assert_safed_and_released(&self) {
        for gpio in PUMP_GPIOS.into_iter().chain([OPEN_COIL, CLOSE_COIL]) {
            assert_eq!(self.journal.level(gpio), Some(false), "gpio {gpio} left high");
            assert_eq!(self.journal.releases(gpio), 1, "gpio {gpio} release count");
        }
        assert_eq!(
            self.journal.count(|e| *e == JournalEntry::SerialClosed),
            1
        );
        let last_wait = self
            .journal
            .entries()
            .into_iter()
            .rev()
            .find(|e| matches!(e, JournalEntry::Wait { .. }));
        assert_eq!(
            last_wait,
            Some(JournalEntry::Wait {
                duration: Duration::from_secs(6),
                interruptible: false
            })
        );
    }
}

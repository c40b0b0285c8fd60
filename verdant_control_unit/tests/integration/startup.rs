//! Integration test: configuration loading and hardware binding.

use std::fs;
use std::io::Write;

use chrono::Local;
use tempfile::{NamedTempFile, TempDir};
use verdant_common::config::ConfigError;
use verdant_common::hal::driver::HalError;
use verdant_control_unit::config::{Overrides, load_config};
use verdant_control_unit::cycle::ControlLoop;
use verdant_control_unit::error::ControlError;
use verdant_control_unit::measurement_log::MeasurementLog;
use verdant_control_unit::pacing::SimulatedPacer;
use verdant_hal::Rig;
use verdant_hal::drivers::simulation::{Journal, JournalEntry, SimulationBackend};

use super::{OPEN_COIL, PUMP_GPIOS, RIG_TOML, rig_config};

#[test]
fn binding_failure_releases_lines_already_bound() {
    let config = rig_config(1);
    let journal = Journal::new();
    let mut backend =
        SimulationBackend::new(&config.hal, journal.clone()).with_failing_gpio(OPEN_COIL);

    let err = Rig::bind(&config.hal, &mut backend).map_err(ControlError::Binding).unwrap_err();
    assert!(matches!(err, ControlError::Binding(HalError::Binding { .. })));
    assert_eq!(err.exit_code(), 1);

    for gpio in PUMP_GPIOS {
        assert_eq!(journal.level(gpio), Some(false));
        assert_eq!(journal.releases(gpio), 1);
    }
    // Never got as far as the probe.
    assert!(journal.serial_tx().is_empty());
    assert_eq!(journal.count(|e| *e == JournalEntry::SerialClosed), 0);
}

#[test]
fn config_file_with_overrides_drives_bounded_run() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(RIG_TOML.as_bytes()).unwrap();
    file.flush().unwrap();
    let log_dir = TempDir::new().unwrap();
    let overrides = Overrides {
        cycles: Some(3),
        log_dir: Some(log_dir.path().join("runs")),
    };

    let loaded = load_config(file.path(), &overrides).unwrap();
    let rig_config = loaded.rig;
    assert_eq!(rig_config.control.max_cycles, Some(3));

    let journal = Journal::new();
    let mut backend = SimulationBackend::new(&rig_config.hal, journal.clone());
    let rig = Rig::bind(&rig_config.hal, &mut backend).unwrap();
    let log = MeasurementLog::create(&rig_config.control.log_dir, Local::now()).unwrap();
    let path = log.path().to_path_buf();
    let mut control = ControlLoop::new(
        rig_config.control,
        rig,
        log,
        SimulatedPacer::new(journal.clone()),
    );

    let stats = control.run().unwrap();
    assert_eq!(stats.cycles, 3);

    assert!(path.starts_with(log_dir.path().join("runs")));
    let content = fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("Time, CO2 (ppm), Conductivity (us/cm)"));
    assert_eq!(lines.count(), 3);
}

#[test]
fn invalid_thresholds_rejected_before_binding() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[shared]
service_name = "bad-band"

[control]
valve_close_threshold_v = 1.5
valve_open_threshold_v = 1.2
"#
    )
    .unwrap();
    file.flush().unwrap();

    let err = load_config(file.path(), &Overrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
    let err = ControlError::from(err);
    assert_eq!(err.exit_code(), 1);
}

//! Integration test: full iterations from sensor read to log row.

use std::time::Duration;

use verdant_common::control_unit::state::{LoopState, ValvePosition};
use verdant_common::hal::types::FullScaleRange;
use verdant_hal::drivers::simulation::{JournalEntry, Signal};

use super::{CLOSE_COIL, Harness, OPEN_COIL, PUMP_GPIOS, rig_config};

#[test]
fn low_conductivity_and_low_foam_dose_and_close_in_one_iteration() {
    let config = rig_config(1);
    let mut h = Harness::new(
        &config,
        |p| p,
        |b| {
            b.with_conductivity(Signal::Constant(850.0))
                .with_analog(0, Signal::Constant(0.8))
        },
    );

    let stats = h.control.run().unwrap();
    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.doses, 1);
    assert_eq!(stats.valve_moves, 1);

    let running = h.running_entries();
    assert_eq!(
        &running[..10],
        &[
            JournalEntry::SerialTx("R".to_string()),
            JournalEntry::Command {
                program: "usbtenkiget".to_string(),
                args: vec!["-i".to_string(), "0".to_string()],
            },
            JournalEntry::Command {
                program: "ads1115".to_string(),
                args: vec!["0".to_string(), FullScaleRange::Fsr6_144V.code().to_string()],
            },
            JournalEntry::Write { gpio: PUMP_GPIOS[0], high: true },
            JournalEntry::Wait {
                duration: config.control.dosing_pulse(),
                interruptible: true
            },
            JournalEntry::Write { gpio: PUMP_GPIOS[0], high: false },
            JournalEntry::Write { gpio: OPEN_COIL, high: false },
            JournalEntry::Write { gpio: CLOSE_COIL, high: true },
            JournalEntry::Wait {
                duration: config.control.valve_settle(),
                interruptible: true
            },
            JournalEntry::Write { gpio: CLOSE_COIL, high: false },
        ]
    );

    let rows = h.rows();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].ends_with(", 650.0, 850.00"), "row: {}", rows[0]);

    assert_eq!(h.control.state(), LoopState::Terminated);
    assert_eq!(h.control.valve_position(), ValvePosition::Closed);
    h.assert_safed_and_released();
}

#[test]
fn priming_forces_closed_then_opens() {
    let config = rig_config(1);
    let mut h = Harness::quiet(&config);
    h.control.run().unwrap();

    let entries = h.journal.entries();
    let first_close = entries
        .iter()
        .position(|e| *e == JournalEntry::Write { gpio: CLOSE_COIL, high: true })
        .unwrap();
    let first_open = entries
        .iter()
        .position(|e| *e == JournalEntry::Write { gpio: OPEN_COIL, high: true })
        .unwrap();
    assert!(first_close < first_open);
    assert_eq!(
        entries[first_close + 1],
        JournalEntry::Wait {
            duration: Duration::from_secs(6),
            interruptible: false
        }
    );
    assert_eq!(
        entries[first_open + 1],
        JournalEntry::Wait {
            duration: config.control.priming_open(),
            interruptible: true
        }
    );
    // Opened once by priming, never by the quiet loop.
    assert_eq!(h.writes(OPEN_COIL, true), 1);
}

#[test]
fn bounded_run_logs_every_cycle_and_sleeps_between() {
    let config = rig_config(4);
    let mut h = Harness::new(
        &config,
        |p| p,
        |b| b.with_co2(Signal::sequence([610.0, 620.0, 630.0, 640.0])),
    );

    let stats = h.control.run().unwrap();
    assert_eq!(stats.cycles, 4);
    assert_eq!(stats.doses, 0);
    assert_eq!(stats.overruns, 0);

    let rows = h.rows();
    assert_eq!(rows.len(), 4);
    for (row, co2) in rows.iter().zip(["610.0", "620.0", "630.0", "640.0"]) {
        assert!(row.ends_with(&format!(", {co2}, 1000.00")), "row: {row}");
    }
    assert_eq!(h.control.log().rows(), 4);

    // No sleep after the last cycle.
    assert_eq!(h.waits(config.control.period(), true), 3);
    assert_eq!(h.control.state(), LoopState::Terminated);
    h.assert_safed_and_released();
}

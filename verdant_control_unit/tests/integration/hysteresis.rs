//! Integration test: dosing and valve hysteresis over many iterations.

use verdant_common::control_unit::state::ValvePosition;
use verdant_hal::drivers::simulation::Signal;

use super::{CLOSE_COIL, Harness, OPEN_COIL, PUMP_GPIOS, rig_config};

#[test]
fn valve_moves_only_at_band_crossings() {
    // Open after priming.
    let aux = [1.1, 0.9, 1.1, 1.15, 1.3, 1.1, 1.0, 0.95];
    let config = rig_config(aux.len() as u64);
    let mut h = Harness::new(
        &config,
        |p| p,
        |b| b.with_analog(0, Signal::sequence(aux)),
    );

    let stats = h.control.run().unwrap();
    assert_eq!(stats.cycles, aux.len() as u64);
    // Close at 0.9, open at 1.3, close at 0.95. 1.0 is on the boundary.
    assert_eq!(stats.valve_moves, 3);
    assert_eq!(stats.doses, 0);

    // Priming plus one hysteresis open.
    assert_eq!(h.writes(OPEN_COIL, true), 2);
    // Two safe states plus two hysteresis closes.
    assert_eq!(h.writes(CLOSE_COIL, true), 4);
    assert_eq!(h.waits(config.control.valve_settle(), true), 1 + 3);
    assert_eq!(h.control.valve_position(), ValvePosition::Closed);
}

#[test]
fn readings_inside_band_never_move_valve() {
    let aux = [1.0, 1.2, 1.05, 1.19, 1.01, 1.1];
    let config = rig_config(aux.len() as u64);
    let mut h = Harness::new(
        &config,
        |p| p,
        |b| b.with_analog(0, Signal::sequence(aux)),
    );

    let stats = h.control.run().unwrap();
    assert_eq!(stats.valve_moves, 0);
    assert_eq!(h.writes(OPEN_COIL, true), 1);
}

#[test]
fn every_under_threshold_reading_gets_one_pulse() {
    let conductivity = [850.0, 950.0, 880.0, 899.9, 900.0, 1400.0];
    let config = rig_config(conductivity.len() as u64);
    let mut h = Harness::new(
        &config,
        |p| p,
        |b| b.with_conductivity(Signal::sequence(conductivity)),
    );

    let stats = h.control.run().unwrap();
    assert_eq!(stats.doses, 3);
    assert_eq!(h.writes(PUMP_GPIOS[0], true), 3);
    assert_eq!(h.waits(config.control.dosing_pulse(), true), 3);
    // A 5 s pulse overruns the 0.1 s period.
    assert_eq!(stats.overruns, 3);
    for gpio in &PUMP_GPIOS[1..] {
        assert_eq!(h.writes(*gpio, true), 0);
    }
    assert_eq!(h.rows().len(), conductivity.len());
}

#[test]
fn secondary_pump_can_be_selected() {
    let mut config = rig_config(1);
    config.control.dosing_pump = 2;
    config.validate().unwrap();
    let mut h = Harness::new(
        &config,
        |p| p,
        |b| b.with_conductivity(Signal::Constant(500.0)),
    );

    h.control.run().unwrap();
    assert_eq!(h.writes(PUMP_GPIOS[0], true), 0);
    assert_eq!(h.writes(PUMP_GPIOS[2], true), 1);
}

#[test]
fn valve_control_disabled_without_aux_channel() {
    let mut config = rig_config(3);
    config.hal.adc.aux_channel = None;
    let mut h = Harness::new(
        &config,
        |p| p,
        |b| b.with_analog(0, Signal::Constant(0.2)),
    );

    let stats = h.control.run().unwrap();
    assert_eq!(stats.valve_moves, 0);
    assert_eq!(h.control.valve_position(), ValvePosition::Closed);
    assert!(h.journal.entries().iter().all(|e| !matches!(
        e,
        verdant_hal::drivers::simulation::JournalEntry::Command { program, .. } if program == "ads1115"
    )));
}

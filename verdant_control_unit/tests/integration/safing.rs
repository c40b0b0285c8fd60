//! Integration test: every exit path ends in the safe state.

use std::time::Duration;

use verdant_common::control_unit::state::{LoopState, ValvePosition};
use verdant_common::hal::driver::HalError;
use verdant_common::hal::types::SensorKind;
use verdant_control_unit::error::ControlError;
use verdant_control_unit::pacing::Pacer;
use verdant_hal::drivers::simulation::Signal;

use super::{CLOSE_COIL, Harness, OPEN_COIL, PUMP_GPIOS, rig_config};

#[test]
fn probe_fault_mid_loop_safes_and_releases_once() {
    let config = rig_config(10);
    let mut h = Harness::new(
        &config,
        |p| p,
        |b| {
            b.with_conductivity(Signal::script([
                Ok(1000.0),
                Ok(850.0),
                Err(HalError::DeviceRejected("R".to_string())),
            ]))
        },
    );

    let err = h.control.run().unwrap_err();
    assert!(
        matches!(
            err,
            ControlError::SensorRead {
                sensor: SensorKind::Conductivity,
                source: HalError::DeviceRejected(_)
            }
        ),
        "unexpected error: {err}"
    );
    assert_eq!(err.exit_code(), 1);
    assert_eq!(h.control.stats().cycles, 2);
    assert_eq!(h.rows().len(), 2);
    assert_eq!(h.control.state(), LoopState::Terminated);
    assert!(h.control.safing_faults().is_empty());
    assert!(h.control.rig().is_none());
    h.assert_safed_and_released();
}

#[test]
fn silent_probe_times_out_and_safes() {
    let config = rig_config(10);
    let mut h = Harness::new(
        &config,
        |p| p,
        |b| b.with_conductivity(Signal::script([Err(HalError::Io("unplugged".to_string()))])),
    );

    let err = h.control.run().unwrap_err();
    assert!(matches!(
        err,
        ControlError::SensorRead {
            sensor: SensorKind::Conductivity,
            source: HalError::Timeout { .. }
        }
    ));
    assert_eq!(h.rows().len(), 0);
    h.assert_safed_and_released();
}

#[test]
fn co2_driver_failure_aborts_run() {
    let config = rig_config(10);
    let mut h = Harness::new(
        &config,
        |p| p,
        |b| {
            b.with_conductivity(Signal::Constant(850.0))
                .with_co2(Signal::script([
                    Ok(640.0),
                    Err(HalError::CommandFailed {
                        program: "usbtenkiget".to_string(),
                        reason: "exit status 1".to_string(),
                    }),
                ]))
        },
    );

    let err = h.control.run().unwrap_err();
    assert!(matches!(
        err,
        ControlError::SensorRead {
            sensor: SensorKind::Co2,
            ..
        }
    ));
    // The first cycle dosed; the failing one never reached actuation.
    assert_eq!(h.control.stats().doses, 1);
    assert_eq!(h.writes(PUMP_GPIOS[0], true), 1);
    h.assert_safed_and_released();
}

#[test]
fn interrupt_during_dosing_pulse_leaves_pump_off() {
    // Pause 1 is priming, pause 2 the first dosing pulse.
    let config = rig_config(10);
    let mut h = Harness::new(
        &config,
        |p| p.cancel_after(2),
        |b| b.with_conductivity(Signal::Constant(850.0)),
    );

    let err = h.control.run().unwrap_err();
    assert!(err.is_interrupt());
    assert_eq!(err.exit_code(), 130);
    assert!(h.control.pacer().cancelled());
    // Interrupted before the log append.
    assert_eq!(h.rows().len(), 0);
    assert_eq!(h.control.state(), LoopState::Terminated);
    assert_eq!(h.control.valve_position(), ValvePosition::Closed);
    h.assert_safed_and_released();
}

#[test]
fn interrupt_during_priming() {
    let config = rig_config(10);
    let mut h = Harness::new(&config, |p| p.cancel_after(1), |b| b);

    let err = h.control.run().unwrap_err();
    assert!(matches!(err, ControlError::Interrupted));
    assert_eq!(h.control.stats().cycles, 0);
    h.assert_safed_and_released();
}

#[test]
fn interrupt_before_priming_never_opens_valve() {
    let config = rig_config(10);
    let mut h = Harness::new(&config, |p| p.cancel_after(0), |b| b);

    let err = h.control.run().unwrap_err();
    assert!(matches!(err, ControlError::Interrupted));
    assert_eq!(h.writes(OPEN_COIL, true), 0);
    assert_eq!(h.control.stats().cycles, 0);
    h.assert_safed_and_released();
}

#[test]
fn interrupt_during_period_sleep() {
    let config = rig_config(10);
    // Priming, then the sleep after cycle 1.
    let mut h = Harness::new(&config, |p| p.cancel_after(2), |b| b);

    let err = h.control.run().unwrap_err();
    assert!(err.is_interrupt());
    assert_eq!(h.control.stats().cycles, 1);
    assert_eq!(h.rows().len(), 1);
    h.assert_safed_and_released();
}

#[test]
fn safe_state_is_idempotent() {
    let config = rig_config(1);
    let mut h = Harness::quiet(&config);

    assert!(h.control.apply_safe_state().is_empty());
    assert!(h.control.apply_safe_state().is_empty());
    assert_eq!(h.control.valve_position(), ValvePosition::Closed);
    for gpio in PUMP_GPIOS {
        assert_eq!(h.journal.level(gpio), Some(false));
    }
    assert_eq!(h.journal.level(CLOSE_COIL), Some(false));
    assert_eq!(h.waits(Duration::from_secs(6), false), 2);
    assert!(h.control.rig().is_some());
}

#[test]
fn dropping_an_unstarted_loop_safes_and_releases() {
    let config = rig_config(1);
    let h = Harness::quiet(&config);
    let journal = h.journal.clone();
    let Harness {
        control, log_dir, ..
    } = h;
    drop(control);

    for gpio in PUMP_GPIOS {
        assert_eq!(journal.releases(gpio), 1);
    }
    assert_eq!(journal.level(CLOSE_COIL), Some(false));
    drop(log_dir);
}

//! Reservoir control loop.
//!
//! Owns the rig, the measurement log and the pacer, and drives the lifecycle
//! `Initializing → Priming → Running → Safing → Terminated`.
//!
//! One Running iteration:
//! 1. read conductivity, CO2 and (if configured) the foam probe voltage
//! 2. decide dosing and valve moves
//! 3. actuate
//! 4. append the readings to the measurement log
//! 5. wait out the rest of the control period
//!
//! Any read, actuation or log failure ends the run. Whatever the reason,
//! the loop then applies the safe state and releases the rig before `run`
//! returns.

use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use verdant_common::control_unit::config::ControlConfig;
use verdant_common::control_unit::state::{LoopState, ValvePosition};
use verdant_common::hal::driver::HalError;
use verdant_common::hal::types::{SensorKind, SensorReading};
use verdant_hal::Rig;

use crate::control::actuation::{drive_valve, pulse};
use crate::control::policy::{ActuationPolicy, Decision};
use crate::error::ControlError;
use crate::measurement_log::MeasurementLog;
use crate::pacing::Pacer;
use crate::safety::{SafeStateExecutor, SafingFaults};
use crate::state::{LoopEvent, LoopStateMachine, TransitionResult};

/// Overruns after the first are only logged at warn every this many.
const OVERRUN_WARN_EVERY: u64 = 50;

// ─── Run Statistics ─────────────────────────────────────────────────

/// Per-run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleStats {
    /// Completed Running iterations.
    pub cycles: u64,
    /// Dosing pulses delivered.
    pub doses: u64,
    /// Hysteresis valve moves.
    pub valve_moves: u64,
    /// Iterations that took longer than the control period.
    pub overruns: u64,
    /// Longest iteration.
    pub max_cycle: Duration,
}

impl CycleStats {
    fn record(&mut self, duration: Duration, period: Duration) -> bool {
        self.cycles += 1;
        self.max_cycle = self.max_cycle.max(duration);
        let overrun = duration > period;
        if overrun {
            self.overruns += 1;
        }
        overrun
    }
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycles={} doses={} valve_moves={} overruns={} max_cycle={:?}",
            self.cycles, self.doses, self.valve_moves, self.overruns, self.max_cycle
        )
    }
}

/// Readings of one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    /// Conductivity [µS/cm].
    pub conductivity: SensorReading,
    /// CO2 [ppm].
    pub co2: SensorReading,
    /// Foam probe voltage [V], `None` when valve control is disabled.
    pub aux: Option<SensorReading>,
}

// ─── Control Loop ───────────────────────────────────────────────────

/// The reservoir control loop.
pub struct ControlLoop<P: Pacer> {
    config: ControlConfig,
    policy: ActuationPolicy,
    safe_state: SafeStateExecutor,
    rig: Option<Rig>,
    log: MeasurementLog,
    pacer: P,
    machine: LoopStateMachine,
    valve: ValvePosition,
    stats: CycleStats,
    safing_faults: SafingFaults,
}

impl<P: Pacer> ControlLoop<P> {
    /// Loop over an already bound rig.
    ///
    /// `config` is expected to be validated against the rig's pump count.
    pub fn new(config: ControlConfig, rig: Rig, log: MeasurementLog, pacer: P) -> Self {
        Self {
            policy: ActuationPolicy::from_config(&config),
            safe_state: SafeStateExecutor::new(config.safe_close()),
            config,
            rig: Some(rig),
            log,
            pacer,
            machine: LoopStateMachine::new(),
            // Unknown until the first safe state; assume the worst.
            valve: ValvePosition::Open,
            stats: CycleStats::default(),
            safing_faults: SafingFaults::empty(),
        }
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> LoopState {
        self.machine.state()
    }

    /// Logical valve position.
    #[inline]
    pub fn valve_position(&self) -> ValvePosition {
        self.valve
    }

    /// Counters so far.
    #[inline]
    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Steps that failed during the final safe state.
    #[inline]
    pub fn safing_faults(&self) -> SafingFaults {
        self.safing_faults
    }

    /// Measurement log of this run.
    pub fn log(&self) -> &MeasurementLog {
        &self.log
    }

    /// The pacer driving this loop.
    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// The bound rig, `None` once released.
    pub fn rig(&self) -> Option<&Rig> {
        self.rig.as_ref()
    }

    /// Run the loop to completion.
    ///
    /// Returns the run statistics after a bounded run finished normally, or
    /// the error that ended it. In both cases the safe state has been applied
    /// and the rig released when this returns.
    pub fn run(&mut self) -> Result<CycleStats, ControlError> {
        let outcome = self.operate();

        let event = match &outcome {
            Ok(()) => {
                info!("Run complete after {} cycles", self.stats.cycles);
                LoopEvent::Finished
            }
            Err(e) if e.is_interrupt() => {
                info!("Shutdown requested, entering Safing");
                LoopEvent::Interrupt
            }
            Err(e) => {
                error!("Fault in {}: {}", self.state(), e);
                LoopEvent::Fault
            }
        };
        self.transition(event);
        self.shutdown();

        info!("Run statistics: {}", self.stats);
        outcome.map(|()| self.stats)
    }

    /// Force all pumps off and the valve closed.
    ///
    /// Safe to call repeatedly; each call repeats the full close dwell.
    /// Does nothing once the rig has been released.
    pub fn apply_safe_state(&mut self) -> SafingFaults {
        let Some(rig) = self.rig.as_mut() else {
            debug!("Safe state requested after release, nothing to do");
            return SafingFaults::empty();
        };
        let faults = self.safe_state.apply(rig, &mut self.pacer);
        if !faults.valve_uncertain() {
            self.valve = ValvePosition::Closed;
        }
        faults
    }

    fn operate(&mut self) -> Result<(), ControlError> {
        self.prime()?;
        self.run_cycles()
    }

    fn prime(&mut self) -> Result<(), ControlError> {
        info!("Forcing valve closed before priming");
        let faults = self.apply_safe_state();
        if !faults.is_empty() {
            return Err(ControlError::SafeState(faults));
        }
        self.transition(LoopEvent::BindingsReady);
        if self.pacer.cancelled() {
            return Err(ControlError::Interrupted);
        }

        let rig = self.rig.as_mut().ok_or(ControlError::Binding(HalError::Closed))?;
        info!("Priming: valve open for {:?}", self.config.priming_open());
        drive_valve(
            &mut rig.valve_open,
            &mut rig.valve_close,
            ValvePosition::Open,
            self.config.priming_open(),
            &mut self.pacer,
        )?;
        self.valve = ValvePosition::Open;
        self.transition(LoopEvent::PrimingComplete);
        Ok(())
    }

    fn run_cycles(&mut self) -> Result<(), ControlError> {
        let period = self.config.period();
        info!(
            "Running: period {:?}, {}",
            period,
            match self.config.max_cycles {
                Some(n) => format!("{n} cycles"),
                None => "until interrupted".to_string(),
            }
        );

        loop {
            if self.pacer.cancelled() {
                return Err(ControlError::Interrupted);
            }

            let started = self.pacer.now();
            self.iterate()?;
            let elapsed = self.pacer.now().saturating_sub(started);

            if self.stats.record(elapsed, period) {
                self.report_overrun(elapsed, period);
            }
            if self.config.max_cycles.is_some_and(|max| self.stats.cycles >= max) {
                return Ok(());
            }
            if let Some(remaining) = period.checked_sub(elapsed).filter(|d| !d.is_zero()) {
                self.pacer.pause(remaining)?;
            }
        }
    }

    /// One sense → decide → actuate → log pass.
    pub fn iterate(&mut self) -> Result<Decision, ControlError> {
        let readings = self.read_sensors()?;
        let decision = self.policy.decide(
            readings.conductivity.value,
            readings.aux.map(|r| r.value),
            self.valve,
        );
        debug!(
            "cycle {}: {} {} aux={} valve={} -> {:?}",
            self.stats.cycles + 1,
            readings.conductivity,
            readings.co2,
            readings.aux.map_or_else(|| "off".to_string(), |r| r.to_string()),
            self.valve,
            decision
        );

        self.actuate(decision)?;
        self.log.record_at(
            readings.conductivity.timestamp,
            readings.co2.value,
            readings.conductivity.value,
        )?;
        Ok(decision)
    }

    fn read_sensors(&mut self) -> Result<Readings, ControlError> {
        let rig = self.rig.as_mut().ok_or(ControlError::Binding(HalError::Closed))?;

        let conductivity = rig
            .conductivity
            .get_conductivity()
            .map_err(|source| ControlError::SensorRead {
                sensor: SensorKind::Conductivity,
                source,
            })?;
        let co2 = rig.co2.read_ppm().map_err(|source| ControlError::SensorRead {
            sensor: SensorKind::Co2,
            source,
        })?;
        let aux = match rig.aux_channel {
            Some(channel) => Some(rig.adc.read(channel).map_err(|source| {
                ControlError::SensorRead {
                    sensor: SensorKind::AuxVoltage,
                    source,
                }
            })?),
            None => None,
        };

        Ok(Readings {
            conductivity: SensorReading::now(SensorKind::Conductivity, conductivity),
            co2: SensorReading::now(SensorKind::Co2, co2),
            aux: aux.map(|v| SensorReading::now(SensorKind::AuxVoltage, v)),
        })
    }

    fn actuate(&mut self, decision: Decision) -> Result<(), ControlError> {
        let rig = self.rig.as_mut().ok_or(ControlError::Binding(HalError::Closed))?;

        if decision.dose {
            let pump = rig
                .pumps
                .get_mut(self.config.dosing_pump)
                .ok_or_else(|| {
                    ControlError::Binding(HalError::ConfigError(format!(
                        "dosing pump {} not bound",
                        self.config.dosing_pump
                    )))
                })?;
            info!(
                "Conductivity below {:.0} uS/cm, dosing {:?}",
                self.config.dosing_threshold_us_cm,
                self.config.dosing_pulse()
            );
            pulse(pump, self.config.dosing_pulse(), &mut self.pacer)?;
            self.stats.doses += 1;
        }

        if let Some(target) = decision.valve {
            info!("Foam probe crossed threshold, valve -> {}", target);
            drive_valve(
                &mut rig.valve_open,
                &mut rig.valve_close,
                target,
                self.config.valve_settle(),
                &mut self.pacer,
            )?;
            self.valve = target;
            self.stats.valve_moves += 1;
        }
        Ok(())
    }

    fn report_overrun(&self, elapsed: Duration, period: Duration) {
        let n = self.stats.overruns;
        if n == 1 || n % OVERRUN_WARN_EVERY == 0 {
            warn!(
                "Cycle {} took {:?} (period {:?}), {} overruns so far",
                self.stats.cycles, elapsed, period, n
            );
        } else {
            debug!("Cycle {} overran: {:?}", self.stats.cycles, elapsed);
        }
    }

    fn shutdown(&mut self) {
        let mut faults = self.apply_safe_state();
        if let Some(mut rig) = self.rig.take() {
            if let Err(e) = rig.release() {
                error!("Releasing rig failed: {e}");
                faults |= SafingFaults::RELEASE;
            }
        }
        if !faults.is_empty() {
            error!("Safing finished with faults: {:?}", faults);
        }
        self.safing_faults = faults;
        self.transition(LoopEvent::SafeStateApplied);
    }

    fn transition(&mut self, event: LoopEvent) {
        let from = self.machine.state();
        match self.machine.handle_event(event) {
            TransitionResult::Ok(to) if to != from => info!("{} -> {} ({:?})", from, to, event),
            TransitionResult::Ok(_) => {}
            TransitionResult::Rejected(reason) => {
                warn!("Ignored {:?} in {}: {}", event, from, reason)
            }
        }
    }
}

impl<P: Pacer> Drop for ControlLoop<P> {
    fn drop(&mut self) {
        if self.rig.is_some() {
            warn!("Control loop dropped with rig bound, safing");
            if !self.machine.is_shutting_down() {
                self.transition(LoopEvent::Fault);
            }
            self.shutdown();
        }
    }
}

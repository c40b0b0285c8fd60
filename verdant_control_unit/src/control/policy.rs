//! Actuation policy: dosing threshold and valve hysteresis.
//!
//! Pure decision functions. The loop feeds them readings and carries out
//! whatever they return.

use verdant_common::control_unit::config::ControlConfig;
use verdant_common::control_unit::state::ValvePosition;

/// Conductivity dosing rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DosingPolicy {
    /// Readings strictly below this trigger a pulse [µS/cm].
    pub threshold: f64,
}

impl DosingPolicy {
    /// Whether `conductivity` calls for one dosing pulse.
    #[inline]
    pub fn should_dose(&self, conductivity: f64) -> bool {
        conductivity < self.threshold
    }
}

/// Two-threshold valve rule on the foam probe voltage.
///
/// An open valve closes below `close_below`; a closed valve opens above
/// `open_above`. Readings in between never move the valve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValveHysteresis {
    /// Close threshold [V].
    pub close_below: f64,
    /// Open threshold [V].
    pub open_above: f64,
}

impl ValveHysteresis {
    /// Target position if `aux` calls for a move from `current`.
    #[inline]
    pub fn evaluate(&self, current: ValvePosition, aux: f64) -> Option<ValvePosition> {
        match current {
            ValvePosition::Open if aux < self.close_below => Some(ValvePosition::Closed),
            ValvePosition::Closed if aux > self.open_above => Some(ValvePosition::Open),
            _ => None,
        }
    }
}

/// What one iteration decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    /// Pulse the dosing pump.
    pub dose: bool,
    /// Drive the valve to this position.
    pub valve: Option<ValvePosition>,
}

/// Dosing and valve rules evaluated together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuationPolicy {
    /// Dosing rule.
    pub dosing: DosingPolicy,
    /// Valve rule.
    pub valve: ValveHysteresis,
}

impl ActuationPolicy {
    /// Policy using the thresholds in `config`.
    pub fn from_config(config: &ControlConfig) -> Self {
        Self {
            dosing: DosingPolicy {
                threshold: config.dosing_threshold_us_cm,
            },
            valve: ValveHysteresis {
                close_below: config.valve_close_threshold_v,
                open_above: config.valve_open_threshold_v,
            },
        }
    }

    /// Decide both actions. `aux` is `None` when valve control is disabled.
    pub fn decide(&self, conductivity: f64, aux: Option<f64>, valve: ValvePosition) -> Decision {
        Decision {
            dose: self.dosing.should_dose(conductivity),
            valve: aux.and_then(|v| self.valve.evaluate(valve, v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy() -> ActuationPolicy {
        ActuationPolicy::from_config(&ControlConfig::default())
    }

    #[test]
    fn test_dosing_threshold_is_strict() {
        let p = policy().dosing;
        assert!(p.should_dose(850.0));
        assert!(p.should_dose(899.99));
        assert!(!p.should_dose(900.0));
        assert!(!p.should_dose(1413.0));
    }

    #[test]
    fn test_valve_moves_only_on_crossings() {
        let v = policy().valve;
        assert_eq!(v.evaluate(ValvePosition::Open, 0.8), Some(ValvePosition::Closed));
        assert_eq!(v.evaluate(ValvePosition::Open, 1.0), None);
        assert_eq!(v.evaluate(ValvePosition::Open, 1.5), None);
        assert_eq!(v.evaluate(ValvePosition::Closed, 1.3), Some(ValvePosition::Open));
        assert_eq!(v.evaluate(ValvePosition::Closed, 1.2), None);
        assert_eq!(v.evaluate(ValvePosition::Closed, 0.2), None);
    }

    #[test]
    fn test_low_then_high_sequence() {
        let v = policy().valve;
        let mut position = ValvePosition::Open;
        let mut history = vec![position];
        for aux in [1.1, 0.9, 0.95, 1.1, 1.19, 1.25, 1.1, 1.3] {
            if let Some(next) = v.evaluate(position, aux) {
                position = next;
                history.push(position);
            }
        }
        assert_eq!(
            history,
            vec![ValvePosition::Open, ValvePosition::Closed, ValvePosition::Open]
        );
    }

    #[test]
    fn test_decide_combines_both_rules() {
        let decision = policy().decide(850.0, Some(0.8), ValvePosition::Open);
        assert_eq!(
            decision,
            Decision {
                dose: true,
                valve: Some(ValvePosition::Closed)
            }
        );
        let decision = policy().decide(950.0, None, ValvePosition::Open);
        assert_eq!(decision, Decision::default());
    }

    proptest! {
        #[test]
        fn in_band_readings_never_move_valve(
            start_open in any::<bool>(),
            readings in prop::collection::vec(1.0f64..=1.2, 1..200),
        ) {
            let v = policy().valve;
            let position = if start_open { ValvePosition::Open } else { ValvePosition::Closed };
            for aux in readings {
                prop_assert_eq!(v.evaluate(position, aux), None);
            }
        }

        #[test]
        fn at_or_above_threshold_never_doses(conductivity in 900.0f64..20_000.0) {
            prop_assert!(!policy().dosing.should_dose(conductivity));
        }

        #[test]
        fn moves_always_go_to_the_opposite_position(
            start_open in any::<bool>(),
            aux in -1.0f64..7.0,
        ) {
            let v = policy().valve;
            let position = if start_open { ValvePosition::Open } else { ValvePosition::Closed };
            if let Some(next) = v.evaluate(position, aux) {
                prop_assert_eq!(next, position.opposite());
            }
        }
    }
}

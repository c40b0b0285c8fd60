//! Control loop configuration (`[control]` table).
//!
//! All durations are seconds as `f64` in TOML and exposed as `Duration`.
//! Every field has a default matching the reference rig.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, require_positive_secs};
use crate::consts::{
    DEFAULT_LOG_DIR, DOSING_PULSE_S_DEFAULT, DOSING_THRESHOLD_DEFAULT, PERIOD_S_DEFAULT,
    PRIMING_OPEN_S_DEFAULT, SAFE_CLOSE_S_DEFAULT, VALVE_CLOSE_THRESHOLD_DEFAULT,
    VALVE_OPEN_THRESHOLD_DEFAULT, VALVE_SETTLE_S_DEFAULT,
};

/// Control loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Control period [s].
    #[serde(default = "default_period")]
    pub period_s: f64,

    /// Stop normally after this many Running iterations. `None` runs until
    /// interrupted or faulted.
    #[serde(default)]
    pub max_cycles: Option<u64>,

    /// Conductivity below which the dosing pump is pulsed [µS/cm].
    #[serde(default = "default_dosing_threshold")]
    pub dosing_threshold_us_cm: f64,

    /// Dosing pulse length [s].
    #[serde(default = "default_dosing_pulse")]
    pub dosing_pulse_s: f64,

    /// Index into `hal.pump_pins` of the primary dosing pump.
    #[serde(default)]
    pub dosing_pump: usize,

    /// Auxiliary voltage below which an open valve is closed [V].
    #[serde(default = "default_valve_close_threshold")]
    pub valve_close_threshold_v: f64,

    /// Auxiliary voltage above which a closed valve is opened [V].
    #[serde(default = "default_valve_open_threshold")]
    pub valve_open_threshold_v: f64,

    /// Solenoid drive time for a hysteresis move [s].
    #[serde(default = "default_valve_settle")]
    pub valve_settle_s: f64,

    /// Valve open time during priming [s].
    #[serde(default = "default_priming_open")]
    pub priming_open_s: f64,

    /// Close-solenoid drive time when forcing the safe state [s].
    #[serde(default = "default_safe_close")]
    pub safe_close_s: f64,

    /// Directory receiving the per-run measurement CSV.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_period() -> f64 {
    PERIOD_S_DEFAULT
}
fn default_dosing_threshold() -> f64 {
    DOSING_THRESHOLD_DEFAULT
}
fn default_dosing_pulse() -> f64 {
    DOSING_PULSE_S_DEFAULT
}
fn default_valve_close_threshold() -> f64 {
    VALVE_CLOSE_THRESHOLD_DEFAULT
}
fn default_valve_open_threshold() -> f64 {
    VALVE_OPEN_THRESHOLD_DEFAULT
}
fn default_valve_settle() -> f64 {
    VALVE_SETTLE_S_DEFAULT
}
fn default_priming_open() -> f64 {
    PRIMING_OPEN_S_DEFAULT
}
fn default_safe_close() -> f64 {
    SAFE_CLOSE_S_DEFAULT
}
fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            period_s: default_period(),
            max_cycles: None,
            dosing_threshold_us_cm: default_dosing_threshold(),
            dosing_pulse_s: default_dosing_pulse(),
            dosing_pump: 0,
            valve_close_threshold_v: default_valve_close_threshold(),
            valve_open_threshold_v: default_valve_open_threshold(),
            valve_settle_s: default_valve_settle(),
            priming_open_s: default_priming_open(),
            safe_close_s: default_safe_close(),
            log_dir: default_log_dir(),
        }
    }
}

impl ControlConfig {
    /// Validate bounds. `pump_count` is the number of configured pump pins.
    pub fn validate(&self, pump_count: usize) -> Result<(), ConfigError> {
        require_positive_secs("control.period_s", self.period_s)?;
        require_positive_secs("control.dosing_pulse_s", self.dosing_pulse_s)?;
        require_positive_secs("control.valve_settle_s", self.valve_settle_s)?;
        require_positive_secs("control.priming_open_s", self.priming_open_s)?;
        require_positive_secs("control.safe_close_s", self.safe_close_s)?;

        if !self.dosing_threshold_us_cm.is_finite() {
            return Err(ConfigError::ValidationError(
                "control.dosing_threshold_us_cm must be finite".to_string(),
            ));
        }
        if !self.valve_close_threshold_v.is_finite() || !self.valve_open_threshold_v.is_finite()
        {
            return Err(ConfigError::ValidationError(
                "valve thresholds must be finite".to_string(),
            ));
        }
        if self.valve_close_threshold_v >= self.valve_open_threshold_v {
            return Err(ConfigError::ValidationError(format!(
                "valve_close_threshold_v ({}) must be below valve_open_threshold_v ({})",
                self.valve_close_threshold_v, self.valve_open_threshold_v
            )));
        }
        if self.dosing_pump >= pump_count {
            return Err(ConfigError::ValidationError(format!(
                "control.dosing_pump {} out of range (0..{pump_count})",
                self.dosing_pump
            )));
        }
        if self.max_cycles == Some(0) {
            return Err(ConfigError::ValidationError(
                "control.max_cycles must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Control period.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.period_s)
    }

    /// Dosing pulse length.
    pub fn dosing_pulse(&self) -> Duration {
        Duration::from_secs_f64(self.dosing_pulse_s)
    }

    /// Hysteresis valve drive time.
    pub fn valve_settle(&self) -> Duration {
        Duration::from_secs_f64(self.valve_settle_s)
    }

    /// Priming open time.
    pub fn priming_open(&self) -> Duration {
        Duration::from_secs_f64(self.priming_open_s)
    }

    /// Safe-state close drive time.
    pub fn safe_close(&self) -> Duration {
        Duration::from_secs_f64(self.safe_close_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControlConfig::default();
        assert_eq!(config.period(), Duration::from_millis(100));
        assert_eq!(config.dosing_pulse(), Duration::from_secs(5));
        assert_eq!(config.safe_close(), Duration::from_secs(6));
        assert_eq!(config.priming_open(), Duration::from_millis(700));
        assert!(config.validate(4).is_ok());
    }

    #[test]
    fn test_inverted_band_rejected() {
        let config = ControlConfig {
            valve_close_threshold_v: 1.2,
            valve_open_threshold_v: 1.2,
            ..ControlConfig::default()
        };
        let err = config.validate(4).unwrap_err();
        assert!(err.to_string().contains("must be below"));
    }

    #[test]
    fn test_dosing_pump_index_checked() {
        let config = ControlConfig {
            dosing_pump: 4,
            ..ControlConfig::default()
        };
        assert!(config.validate(4).is_err());
        assert!(config.validate(5).is_ok());
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = ControlConfig {
            period_s: 0.0,
            ..ControlConfig::default()
        };
        assert!(config.validate(4).is_err());
    }

    #[test]
    fn test_huge_durations_rejected() {
        let config = ControlConfig {
            period_s: 1e20,
            ..ControlConfig::default()
        };
        assert!(config.validate(4).is_err());

        let config = ControlConfig {
            dosing_pulse_s: 1e300,
            ..ControlConfig::default()
        };
        assert!(config.validate(4).is_err());
    }

    #[test]
    fn test_zero_max_cycles_rejected() {
        let config = ControlConfig {
            max_cycles: Some(0),
            ..ControlConfig::default()
        };
        assert!(config.validate(4).is_err());
    }

    #[test]
    fn test_partial_table() {
        let config: ControlConfig = toml::from_str(
            r#"
period_s = 10.0
dosing_threshold_us_cm = 850.0
max_cycles = 3
"#,
        )
        .unwrap();
        assert_eq!(config.period(), Duration::from_secs(10));
        assert_eq!(config.dosing_threshold_us_cm, 850.0);
        assert_eq!(config.max_cycles, Some(3));
        assert_eq!(config.valve_open_threshold_v, 1.2);
    }
}

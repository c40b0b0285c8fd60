//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across all Verdant crates.
//!
//! # Usage
//!
//! ```rust,no_run
//! use verdant_common::config::{ConfigLoader, SharedConfig, ConfigError};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct MyAppConfig {
//!     shared: SharedConfig,
//!     period_s: f64,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = MyAppConfig::load(Path::new("verdant.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::MAX_DURATION_S;
use crate::control_unit::config::ControlConfig;
use crate::hal::config::HalConfig;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Per-cycle readings and decisions.
    Debug,
    /// Lifecycle transitions and actuation.
    #[default]
    Info,
    /// Recoverable anomalies.
    Warn,
    /// Faults.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across all Verdant applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "verdant-reservoir-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for every `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Any serde-deserializable struct can use ConfigLoader.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

/// Complete rig configuration: one TOML file with `[shared]`, `[control]`
/// and `[hal]` tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigConfig {
    /// Service identity and log level.
    pub shared: SharedConfig,

    /// Control loop tuning.
    #[serde(default)]
    pub control: ControlConfig,

    /// Pin bindings and sensor drivers.
    #[serde(default)]
    pub hal: HalConfig,
}

impl RigConfig {
    /// Validate every table, including cross-table references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.hal.validate()?;
        self.control.validate(self.hal.pump_pins.len())
    }
}

/// Load and validate a rig configuration file.
pub fn load_rig_config(path: &Path) -> Result<RigConfig, ConfigError> {
    let config = RigConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Reject non-finite, non-positive or over-long durations (seconds).
///
/// Accepted values always convert to a `Duration` and can be added to an
/// `Instant` without overflow.
pub fn require_positive_secs(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be a positive number of seconds, got {value}"
        )));
    }
    if value > MAX_DURATION_S {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be at most {MAX_DURATION_S} seconds, got {value}"
        )));
    }
    Ok(())
}

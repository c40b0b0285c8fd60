//! System-wide constants for the Verdant workspace.
//!
//! Single source of truth for numeric limits, defaults and wire tokens.

use static_assertions::const_assert;

/// Maximum number of peristaltic pumps on one rig.
pub const MAX_PUMPS: usize = 8;

/// Number of single-ended channels on the ADS1115.
pub const MAX_ADC_CHANNELS: u8 = 4;

/// Upper bound for any configured duration [s].
pub const MAX_DURATION_S: f64 = 86_400.0;

/// Default control period [s].
pub const PERIOD_S_DEFAULT: f64 = 0.1;

/// Default conductivity below which the dosing pump is pulsed [µS/cm].
pub const DOSING_THRESHOLD_DEFAULT: f64 = 900.0;

/// Default dosing pulse length [s].
pub const DOSING_PULSE_S_DEFAULT: f64 = 5.0;

/// Default auxiliary voltage below which an open valve is closed [V].
pub const VALVE_CLOSE_THRESHOLD_DEFAULT: f64 = 1.0;

/// Default auxiliary voltage above which a closed valve is opened [V].
pub const VALVE_OPEN_THRESHOLD_DEFAULT: f64 = 1.2;

/// Default solenoid drive time for a hysteresis valve move [s].
pub const VALVE_SETTLE_S_DEFAULT: f64 = 0.7;

/// Minimum open time that produces flow through the foam valve [s].
pub const PRIMING_OPEN_S_DEFAULT: f64 = 0.7;

/// Close-solenoid drive time that guarantees a fully closed valve [s].
pub const SAFE_CLOSE_S_DEFAULT: f64 = 6.0;

/// Default timeout for external driver processes [s].
pub const COMMAND_TIMEOUT_S_DEFAULT: f64 = 5.0;

/// Default conductivity probe response timeout [s].
pub const SERIAL_TIMEOUT_S_DEFAULT: f64 = 1.0;

/// Default conductivity probe baud rate.
pub const SERIAL_BAUD_DEFAULT: u32 = 9600;

/// Conductivity probe line terminator.
pub const SERIAL_TERMINATOR: char = '\r';

/// Acknowledgment token the probe sends after each accepted command.
pub const SERIAL_ACK: &str = "*OK";

/// Token the probe sends for a rejected command.
pub const SERIAL_NAK: &str = "*ER";

/// Upper bound on buffered probe response bytes per request.
pub const SERIAL_RX_BUFFER: usize = 128;

/// Lower bound of the expected indoor CO2 concentration [ppm].
pub const CO2_TYPICAL_MIN_PPM: f64 = 400.0;

/// Upper bound of the expected indoor CO2 concentration [ppm].
pub const CO2_TYPICAL_MAX_PPM: f64 = 1000.0;

/// Header row of the measurement log.
pub const LOG_HEADER: &str = "Time, CO2 (ppm), Conductivity (us/cm)";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/verdant/verdant.toml";

/// Default measurement log directory.
pub const DEFAULT_LOG_DIR: &str = "/var/lib/verdant";

/// Entries kept by the simulation journal in demo runs.
pub const SIM_JOURNAL_CAPACITY: usize = 4096;

const_assert!(VALVE_CLOSE_THRESHOLD_DEFAULT < VALVE_OPEN_THRESHOLD_DEFAULT);
const_assert!(MAX_ADC_CHANNELS as usize <= 4);
const_assert!(SERIAL_RX_BUFFER >= 16);
const_assert!(PERIOD_S_DEFAULT < MAX_DURATION_S);

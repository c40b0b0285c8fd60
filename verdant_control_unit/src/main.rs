//! # Verdant Control Unit
//!
//! Reservoir supervisory loop. Loads the rig configuration, opens the
//! measurement log, binds the hardware (or the simulation backend with
//! `--simulate`) and runs the control loop until it finishes, faults or is
//! interrupted.
//!
//! Exit status: 0 on normal completion, 1 on startup failure or fault, 130
//! when interrupted. Once hardware is bound the process only exits after the
//! safe state was applied and every handle released.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use verdant_common::config::LogLevel;
use verdant_common::consts::{DEFAULT_CONFIG_PATH, SIM_JOURNAL_CAPACITY};
use verdant_control_unit::config::{LoadedConfig, Overrides, load_config};
use verdant_control_unit::cycle::ControlLoop;
use verdant_control_unit::error::ControlError;
use verdant_control_unit::measurement_log::MeasurementLog;
use verdant_control_unit::pacing::ThreadPacer;
use verdant_hal::drivers::simulation::{Journal, SimulationBackend};
use verdant_hal::{HalBackend, LinuxBackend, Rig};

/// Verdant Control Unit: hydroponic reservoir dosing and foam valve loop
#[derive(Parser, Debug)]
#[command(name = "verdant_control_unit")]
#[command(version)]
#[command(about = "Supervisory control loop for a hydroponic reservoir rig")]
struct Args {
    /// Path to the rig configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Run against simulated sensors and actuators instead of hardware.
    #[arg(long)]
    simulate: bool,

    /// Stop normally after N control cycles (overrides control.max_cycles).
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// Directory for the measurement log (overrides control.log_dir).
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let overrides = Overrides {
        cycles: args.cycles,
        log_dir: args.log_dir.clone(),
    };

    // Tracing is configured from the file, so a bad file is reported at the
    // default level.
    let loaded = load_config(&args.config, &overrides);
    let level = loaded
        .as_ref()
        .map(|c| c.rig.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);

    info!("Verdant Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let code = match loaded {
        Ok(loaded) => match run(&args, loaded) {
            Ok(()) => 0,
            Err(e) if e.is_interrupt() => {
                info!("Interrupted, safe state applied");
                e.exit_code()
            }
            Err(e) => {
                error!("FATAL: {e}");
                e.exit_code()
            }
        },
        Err(e) => {
            error!("FATAL: {} ({})", e, args.config.display());
            1
        }
    };

    info!("Verdant Control Unit shutdown complete");
    process::exit(code);
}

fn run(args: &Args, loaded: LoadedConfig) -> Result<(), ControlError> {
    let rig_config = loaded.rig;
    info!(
        "Config OK: service={}, period={:?}, pumps={}, valve control {}",
        rig_config.shared.service_name,
        rig_config.control.period(),
        rig_config.hal.pump_pins.len(),
        if rig_config.hal.adc.aux_channel.is_some() {
            "on"
        } else {
            "off"
        }
    );

    // Setup signal handler for graceful shutdown.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Signal handler not installed: {e}");
    }

    // The log is opened before binding so a bad log directory never leaves
    // hardware in an unknown state.
    let log = MeasurementLog::create(&rig_config.control.log_dir, Local::now())?;

    let mut backend: Box<dyn HalBackend> = if args.simulate {
        warn!("Simulation mode: no hardware is driven");
        Box::new(SimulationBackend::demo(
            &rig_config.hal,
            Journal::bounded(SIM_JOURNAL_CAPACITY),
        ))
    } else {
        Box::new(LinuxBackend::new())
    };
    info!("Binding hardware via {} backend", backend.name());
    let rig = Rig::bind(&rig_config.hal, backend.as_mut()).map_err(ControlError::Binding)?;

    let mut control = ControlLoop::new(
        rig_config.control,
        rig,
        log,
        ThreadPacer::new(running),
    );
    let outcome = control.run();
    info!("Measurements written to {}", control.log().path().display());
    outcome.map(|_| ())
}

/// Setup tracing subscriber from the configured level and CLI flags.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        configured
    };

    let filter = EnvFilter::from_default_env().add_directive(
        level
            .as_directive()
            .parse()
            .unwrap_or_else(|_| tracing::Level::INFO.into()),
    );

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

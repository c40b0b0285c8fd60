//! CO2 sensor link through the vendor command-line client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use verdant_common::consts::{CO2_TYPICAL_MAX_PPM, CO2_TYPICAL_MIN_PPM};
use verdant_common::hal::config::GasSensorConfig;
use verdant_common::hal::driver::{CommandRunner, HalError};

use crate::scalar::read_scalar;

/// CO2 concentration source.
pub struct GasSensorLink {
    driver: PathBuf,
    args: [String; 2],
    timeout: Duration,
    runner: Arc<dyn CommandRunner>,
}

impl GasSensorLink {
    /// Link configured from `[hal.co2]`.
    pub fn new(config: &GasSensorConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            driver: config.driver.clone(),
            args: ["-i".to_string(), config.sensor_id.to_string()],
            timeout: config.command_timeout(),
            runner,
        }
    }

    /// Read the concentration in ppm.
    ///
    /// Values outside the typical indoor range are returned but logged.
    pub fn read_ppm(&self) -> Result<f64, HalError> {
        let ppm = read_scalar(self.runner.as_ref(), &self.driver, &self.args, self.timeout)?;
        if !(CO2_TYPICAL_MIN_PPM..=CO2_TYPICAL_MAX_PPM).contains(&ppm) {
            warn!(
                "CO2 reading {:.0} ppm outside typical {:.0}-{:.0} ppm",
                ppm, CO2_TYPICAL_MIN_PPM, CO2_TYPICAL_MAX_PPM
            );
        }
        Ok(ppm)
    }
}

impl std::fmt::Debug for GasSensorLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GasSensorLink")
            .field("driver", &self.driver)
            .field("args", &self.args)
            .finish()
    }
}

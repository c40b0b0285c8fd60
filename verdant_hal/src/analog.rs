//! ADS1115 analog channel reader.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use verdant_common::consts::MAX_ADC_CHANNELS;
use verdant_common::hal::config::AdcConfig;
use verdant_common::hal::driver::{CommandRunner, HalError};
use verdant_common::hal::types::FullScaleRange;

use crate::scalar::read_scalar;

/// Reads single-ended voltages through the external ADC driver.
pub struct AnalogChannelReader {
    driver: PathBuf,
    channel_count: u8,
    range: FullScaleRange,
    timeout: Duration,
    runner: Arc<dyn CommandRunner>,
    last: [Option<f64>; MAX_ADC_CHANNELS as usize],
}

impl AnalogChannelReader {
    /// Reader configured from `[hal.adc]`.
    pub fn new(config: &AdcConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            driver: config.driver.clone(),
            channel_count: config.channel_count.min(MAX_ADC_CHANNELS),
            range: config.range,
            timeout: config.command_timeout(),
            runner,
            last: [None; MAX_ADC_CHANNELS as usize],
        }
    }

    /// Select the full-scale range for subsequent reads.
    ///
    /// Cached readings were taken under the previous range and are dropped.
    pub fn configure(&mut self, range: FullScaleRange) {
        if range != self.range {
            debug!("ADC range {} -> {}", self.range, range);
        }
        self.range = range;
        self.last = [None; MAX_ADC_CHANNELS as usize];
    }

    /// Current full-scale range.
    #[inline]
    pub fn range(&self) -> FullScaleRange {
        self.range
    }

    /// Number of addressable channels.
    #[inline]
    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    /// Read `channel` in volts.
    ///
    /// # Errors
    /// `ChannelOutOfRange` before any driver call, otherwise the driver's
    /// failure. Nothing is cached on error.
    pub fn read(&mut self, channel: u8) -> Result<f64, HalError> {
        if channel >= self.channel_count {
            return Err(HalError::ChannelOutOfRange {
                channel,
                count: self.channel_count,
            });
        }
        let args = [channel.to_string(), self.range.code().to_string()];
        let volts = read_scalar(self.runner.as_ref(), &self.driver, &args, self.timeout)?;
        self.last[usize::from(channel)] = Some(volts);
        Ok(volts)
    }

    /// Most recent successful reading of `channel` under the current range.
    pub fn last_reading(&self, channel: u8) -> Option<f64> {
        self.last.get(usize::from(channel)).copied().flatten()
    }
}

impl std::fmt::Debug for AnalogChannelReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalogChannelReader")
            .field("driver", &self.driver)
            .field("channel_count", &self.channel_count)
            .field("range", &self.range)
            .finish()
    }
}

//! Output line on the Linux sysfs GPIO interface.
//!
//! Binding writes `high`/`low` to `direction`, which configures the line as an
//! output and sets its level in a single kernel call.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};
use verdant_common::hal::driver::{HalError, OutputLine};

const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// udev applies permissions to a freshly exported line asynchronously.
const EXPORT_RETRIES: u32 = 5;
const EXPORT_RETRY_DELAY: Duration = Duration::from_millis(20);

/// One sysfs GPIO line.
#[derive(Debug)]
pub struct SysfsLine {
    gpio: u32,
    root: PathBuf,
    exported_here: bool,
}

impl SysfsLine {
    /// Line `gpio` under `/sys/class/gpio`.
    pub fn new(gpio: u32) -> Self {
        Self::with_root(gpio, SYSFS_GPIO_ROOT)
    }

    /// Line `gpio` under an alternative sysfs root.
    pub fn with_root(gpio: u32, root: impl Into<PathBuf>) -> Self {
        Self {
            gpio,
            root: root.into(),
            exported_here: false,
        }
    }

    fn line_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.gpio))
    }

    fn binding_error(&self, e: impl std::fmt::Display) -> HalError {
        HalError::Binding {
            target: format!("gpio{}", self.gpio),
            reason: e.to_string(),
        }
    }

    fn write_attr(path: &Path, value: &str) -> io::Result<()> {
        trace!("{} <- {}", path.display(), value);
        fs::write(path, value)
    }
}

impl OutputLine for SysfsLine {
    fn bind(&mut self, initial: bool) -> Result<(), HalError> {
        let dir = self.line_dir();
        if !dir.exists() {
            Self::write_attr(&self.root.join("export"), &self.gpio.to_string())
                .map_err(|e| self.binding_error(e))?;
            self.exported_here = true;
        }

        let level = if initial { "high" } else { "low" };
        let direction = dir.join("direction");
        let mut attempt = 0;
        loop {
            match Self::write_attr(&direction, level) {
                Ok(()) => break,
                Err(e) if attempt + 1 < EXPORT_RETRIES => {
                    trace!("gpio{} direction not writable yet: {}", self.gpio, e);
                    attempt += 1;
                    thread::sleep(EXPORT_RETRY_DELAY);
                }
                Err(e) => return Err(self.binding_error(e)),
            }
        }

        debug!("gpio{} bound as output ({})", self.gpio, level);
        Ok(())
    }

    fn write(&mut self, high: bool) -> Result<(), HalError> {
        Self::write_attr(&self.line_dir().join("value"), if high { "1" } else { "0" })?;
        Ok(())
    }

    fn release(&mut self) -> Result<(), HalError> {
        Self::write_attr(&self.line_dir().join("direction"), "in")?;
        if self.exported_here {
            Self::write_attr(&self.root.join("unexport"), &self.gpio.to_string())?;
            self.exported_here = false;
        }
        Ok(())
    }
}

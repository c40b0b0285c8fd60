//! Append-only CSV measurement log.
//!
//! One file per process, named after the start time. Rows are written
//! straight to the file and flushed, so a completed `record` survives a crash
//! of the process.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};
use verdant_common::consts::LOG_HEADER;

const FILE_STAMP: &str = "%Y-%m-%d_%H-%M-%S";
const ROW_STAMP: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Measurement sink for one run.
#[derive(Debug)]
pub struct MeasurementLog {
    path: PathBuf,
    file: File,
    rows: u64,
}

impl MeasurementLog {
    /// Create `<dir>/measurements_<started>.csv` and write the header.
    ///
    /// `dir` is created if missing. An existing file is never overwritten.
    pub fn create(dir: &Path, started: DateTime<Local>) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("measurements_{}.csv", started.format(FILE_STAMP)));
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        writeln!(file, "{LOG_HEADER}")?;
        file.flush()?;
        info!("Measurement log: {}", path.display());
        Ok(Self {
            path,
            file,
            rows: 0,
        })
    }

    /// Append a row stamped with the current wall-clock time.
    pub fn record(&mut self, co2_ppm: f64, conductivity_us_cm: f64) -> io::Result<()> {
        self.record_at(Local::now(), co2_ppm, conductivity_us_cm)
    }

    /// Append a row with an explicit timestamp.
    pub fn record_at(
        &mut self,
        at: DateTime<Local>,
        co2_ppm: f64,
        conductivity_us_cm: f64,
    ) -> io::Result<()> {
        let row = format!(
            "{}, {:.1}, {:.2}\n",
            at.format(ROW_STAMP),
            co2_ppm,
            conductivity_us_cm
        );
        self.file.write_all(row.as_bytes())?;
        self.file.flush()?;
        self.rows += 1;
        debug!("log row {}: {}", self.rows, row.trim_end());
        Ok(())
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written so far, header excluded.
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

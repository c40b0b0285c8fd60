//! Single-value driver invocation shared by the ADC and CO2 readers.

use std::path::Path;
use std::time::Duration;

use tracing::trace;
use verdant_common::hal::driver::{CommandRunner, HalError};

/// Run a driver that prints one decimal number and parse it.
///
/// Non-zero exit, empty output and non-finite values are errors.
pub(crate) fn read_scalar(
    runner: &dyn CommandRunner,
    program: &Path,
    args: &[String],
    timeout: Duration,
) -> Result<f64, HalError> {
    let program = program.to_string_lossy();
    let output = runner.run(&program, args, timeout)?;
    if !output.success() {
        return Err(HalError::CommandFailed {
            program: program.into_owned(),
            reason: match output.status {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            },
        });
    }

    trace!("{} {:?} -> {:?}", program, args, output.stdout);
    parse_scalar(&output.stdout)
}

/// Parse the first line of driver output as a finite `f64`.
pub(crate) fn parse_scalar(raw: &str) -> Result<f64, HalError> {
    let line = raw.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return Err(HalError::InvalidResponse("empty driver output".to_string()));
    }
    match line.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(HalError::InvalidResponse(format!(
            "expected a decimal value, got {line:?}"
        ))),
    }
}

//! Configuration loading for the control unit binary.
//!
//! Reads the rig TOML, applies command-line overrides and validates the
//! result as a whole, so an override is held to the same bounds as the file.

use std::path::{Path, PathBuf};

use verdant_common::config::{ConfigError, ConfigLoader, RigConfig};

// ─── Overrides ──────────────────────────────────────────────────────

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replaces `control.max_cycles`.
    pub cycles: Option<u64>,
    /// Replaces `control.log_dir`.
    pub log_dir: Option<PathBuf>,
}

impl Overrides {
    fn apply(&self, config: &mut RigConfig) {
        if let Some(cycles) = self.cycles {
            config.control.max_cycles = Some(cycles);
        }
        if let Some(dir) = &self.log_dir {
            config.control.log_dir = dir.clone();
        }
    }
}

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Validated configuration, ready for runtime use.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Effective configuration after overrides.
    pub rig: RigConfig,
    /// File it was read from, `None` when parsed from a string.
    pub source: Option<PathBuf>,
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load `path`, apply `overrides` and validate.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<LoadedConfig, ConfigError> {
    let rig = RigConfig::load(path)?;
    finish(rig, overrides, Some(path.to_path_buf()))
}

/// Parse a TOML string, apply `overrides` and validate.
pub fn load_config_from_str(
    content: &str,
    overrides: &Overrides,
) -> Result<LoadedConfig, ConfigError> {
    let rig = RigConfig::from_toml(content)?;
    finish(rig, overrides, None)
}

fn finish(
    mut rig: RigConfig,
    overrides: &Overrides,
    source: Option<PathBuf>,
) -> Result<LoadedConfig, ConfigError> {
    overrides.apply(&mut rig);
    rig.validate()?;
    Ok(LoadedConfig { rig, source })
}

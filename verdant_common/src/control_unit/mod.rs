//! Control loop shared types.
//!
//! - [`config`] - `[control]` table: period, thresholds, dwell durations
//! - [`state`] - Loop lifecycle and valve position enums

pub mod config;
pub mod state;
